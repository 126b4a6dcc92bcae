use std::sync::Arc;

use crate::store::DocumentStore;

pub mod inventory_repository;

pub use inventory_repository::InventoryRepository;

/// Repository trait for common store access
pub trait Repository {
    fn store(&self) -> &dyn DocumentStore;
}

#[derive(Clone)]
pub struct BaseRepository {
    store: Arc<dyn DocumentStore>,
}

impl BaseRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

impl Repository for BaseRepository {
    fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }
}
