use serde::{Deserialize, Serialize};

/// Signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub display_name: Option<String>,
    pub email: String,
}

impl CurrentUser {
    pub fn greeting(&self) -> String {
        let name = self
            .display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.email);
        format!("Hello {name}, you are now logged in.")
    }
}
