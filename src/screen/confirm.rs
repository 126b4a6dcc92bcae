use async_trait::async_trait;

/// Destructive actions that need an explicit yes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmPrompt {
    Archive,
    Unarchive,
    Delete,
}

impl ConfirmPrompt {
    pub fn for_archive(archived: bool) -> Self {
        if archived {
            Self::Archive
        } else {
            Self::Unarchive
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Archive => "Are you sure you want to archive this product?",
            Self::Unarchive => "Are you sure you want to unarchive this product?",
            Self::Delete => "Are you sure you want to delete this product?",
        }
    }
}

/// Asks the user before a destructive action. Only `true` lets it proceed.
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, prompt: ConfirmPrompt) -> bool;
}

/// Answers every prompt the same way.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

#[async_trait]
impl Confirmer for AutoConfirm {
    async fn confirm(&self, _prompt: ConfirmPrompt) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_follows_target_state() {
        assert_eq!(ConfirmPrompt::for_archive(true), ConfirmPrompt::Archive);
        assert_eq!(
            ConfirmPrompt::for_archive(false).message(),
            "Are you sure you want to unarchive this product?"
        );
    }

    #[tokio::test]
    async fn auto_confirm_answers_fixed_value() {
        assert!(AutoConfirm(true).confirm(ConfirmPrompt::Delete).await);
        assert!(!AutoConfirm(false).confirm(ConfirmPrompt::Delete).await);
    }
}
