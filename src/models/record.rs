use serde::Serialize;

use super::{Product, ProductId};

/// A product merged with its optional image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryRecord {
    #[serde(flatten)]
    pub product: Product,
    /// `data:` URL, or `None` when no image document exists
    pub image: Option<String>,
}

impl InventoryRecord {
    pub fn id(&self) -> &ProductId {
        &self.product.unique_id
    }

    pub fn is_archived(&self) -> bool {
        self.product.archive
    }
}

/// How [`crate::repositories::InventoryRepository::save`] picks the product id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveMode {
    /// Allocate a fresh time-derived id
    Create,
    /// Overwrite the product that already owns this id
    Update(ProductId),
}
