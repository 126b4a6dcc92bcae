//! Path-addressed document store.
//!
//! The inventory lives in a JSON tree addressed by slash-separated paths
//! (`products/{id}`, `images/{id}`). Absent nodes read as `None`; writing
//! `null` or an empty object removes the node, matching realtime-database
//! semantics.

use async_trait::async_trait;
use serde_json::{Map, Value};

pub mod memory;
pub mod rest;

pub use memory::MemoryStore;
pub use rest::RestStore;

/// Characters a single path segment may not contain.
const FORBIDDEN_KEY_CHARS: [char; 6] = ['/', '.', '#', '$', '[', ']'];

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid store path: {0:?}")]
    InvalidPath(String),

    #[error("store request failed: {0}")]
    Transport(String),

    #[error("store returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response for {path}: {reason}")]
    Malformed { path: String, reason: String },
}

/// Remote document database contract.
///
/// Implementations must treat a missing node as `Ok(None)`, never as an error.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads the value at `path`.
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Replaces the value at `path`.
    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Merges `fields` into the object at `path`, leaving other children untouched.
    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError>;

    /// Removes the value at `path`. Removing an absent node succeeds.
    async fn delete(&self, path: &str) -> Result<(), StoreError>;
}

/// Returns true when `key` can be used as a single path segment.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key
            .chars()
            .any(|c| c.is_control() || FORBIDDEN_KEY_CHARS.contains(&c))
}

/// Splits and validates a store path.
pub fn split_path(path: &str) -> Result<Vec<&str>, StoreError> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.iter().all(|segment| is_valid_key(segment)) {
        Ok(segments)
    } else {
        Err(StoreError::InvalidPath(path.to_string()))
    }
}
