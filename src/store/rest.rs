use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};
use url::Url;

use super::{split_path, DocumentStore, StoreError};

/// Realtime-database REST client.
///
/// Every path maps to `{base}/{path}.json`; when an API key is configured it
/// is sent as the `auth` query parameter. A `null` body means the node is absent.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base: Url,
    api_key: Option<String>,
}

impl RestStore {
    pub fn new(
        database_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let mut base = Url::parse(database_url)
            .map_err(|e| StoreError::InvalidPath(format!("{database_url}: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    fn url_for(&self, path: &str) -> Result<Url, StoreError> {
        split_path(path)?;
        let mut url = self
            .base
            .join(&format!("{path}.json"))
            .map_err(|e| StoreError::InvalidPath(format!("{path}: {e}")))?;
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("auth", key);
        }
        Ok(url)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, StoreError> {
        Ok(self.client.request(method, self.url_for(path)?))
    }

    async fn send(&self, path: &str, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(path, status = status.as_u16(), "store rejected request");
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl DocumentStore for RestStore {
    #[instrument(skip(self))]
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let response = self.send(path, self.request(Method::GET, path)?).await?;
        let value: Value = response.json().await.map_err(|e| StoreError::Malformed {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        debug!(path, present = !value.is_null(), "store read");
        Ok((!value.is_null()).then_some(value))
    }

    #[instrument(skip(self, value))]
    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let request = self.request(Method::PUT, path)?.json(&value);
        self.send(path, request).await?;
        Ok(())
    }

    #[instrument(skip(self, fields))]
    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let request = self.request(Method::PATCH, path)?.json(&fields);
        self.send(path, request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.send(path, self.request(Method::DELETE, path)?).await?;
        Ok(())
    }
}
