use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;

use super::{split_path, DocumentStore, StoreError};

/// In-process JSON tree implementing [`DocumentStore`].
///
/// Used by tests and by the `memory` store backend for local runs.
#[derive(Debug)]
pub struct MemoryStore {
    root: RwLock<Value>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_data(Value::Object(Map::new()))
    }

    /// Seeds the store with an existing tree.
    pub fn with_data(data: Value) -> Self {
        let root = normalize(data).unwrap_or_else(|| Value::Object(Map::new()));
        Self {
            root: RwLock::new(root),
        }
    }

    /// Returns a copy of the whole tree.
    pub async fn dump(&self) -> Value {
        self.root.read().await.clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let segments = split_path(path)?;
        let root = self.root.read().await;
        Ok(lookup(&root, &segments).cloned())
    }

    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let segments = split_path(path)?;
        let mut root = self.root.write().await;
        match normalize(value) {
            Some(value) => insert(&mut root, &segments, value),
            None => remove(&mut root, &segments),
        }
        debug!(path, "memory store write");
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let segments = split_path(path)?;
        // reject the whole batch before any field lands
        for key in fields.keys() {
            split_path(key)?;
        }
        let mut root = self.root.write().await;
        for (key, value) in fields {
            let mut child: Vec<&str> = segments.clone();
            child.extend(split_path(&key)?);
            match normalize(value) {
                Some(value) => insert(&mut root, &child, value),
                None => remove(&mut root, &child),
            }
        }
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let segments = split_path(path)?;
        let mut root = self.root.write().await;
        remove(&mut root, &segments);
        Ok(())
    }
}

fn lookup<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(root, |node, segment| node.as_object()?.get(*segment))
}

fn insert(root: &mut Value, segments: &[&str], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let mut node = root;
    for segment in parents {
        node = as_object(node)
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    as_object(node).insert(last.to_string(), value);
}

/// Removes the node and prunes parents left empty.
fn remove(node: &mut Value, segments: &[&str]) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    let Some(map) = node.as_object_mut() else {
        return;
    };
    if rest.is_empty() {
        map.remove(*first);
        return;
    }
    if let Some(child) = map.get_mut(*first) {
        remove(child, rest);
        if child.as_object().is_some_and(Map::is_empty) {
            map.remove(*first);
        }
    }
}

/// Coerces a non-object node into an empty object so children can be attached.
fn as_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

/// Drops nulls and empty objects; `None` means the value stores nothing.
fn normalize(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => {
            let cleaned: Map<String, Value> = map
                .into_iter()
                .filter_map(|(key, value)| normalize(value).map(|value| (key, value)))
                .collect();
            (!cleaned.is_empty()).then_some(Value::Object(cleaned))
        }
        other => Some(other),
    }
}
