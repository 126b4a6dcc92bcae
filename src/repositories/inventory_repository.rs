use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::errors::ServiceError;
use crate::models::{
    EncodedImage, InventoryRecord, Product, ProductId, ProductImage, ProductPatch, SaveMode,
};
use crate::repositories::Repository;
use crate::store::DocumentStore;

use super::BaseRepository;

/// Collection holding product documents
pub const PRODUCTS: &str = "products";
/// Collection holding image documents, keyed like `products`
pub const IMAGES: &str = "images";

pub fn product_path(id: &ProductId) -> String {
    format!("{PRODUCTS}/{id}")
}

pub fn image_path(id: &ProductId) -> String {
    format!("{IMAGES}/{id}")
}

/// Repository over the `products` and `images` collections.
///
/// The two collections share keys but are written and removed independently;
/// nothing here is atomic across them.
#[derive(Clone)]
pub struct InventoryRepository {
    base: BaseRepository,
}

impl InventoryRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            base: BaseRepository::new(store),
        }
    }

    /// Reads both collections and merges each product with its image.
    ///
    /// Absent collections are empty. Product documents that cannot be decoded
    /// are skipped with a warning.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<InventoryRecord>, ServiceError> {
        let products = self.read_collection(PRODUCTS).await?;
        let mut images: HashMap<String, Value> =
            self.read_collection(IMAGES).await?.into_iter().collect();

        let records: Vec<InventoryRecord> = products
            .into_iter()
            .filter_map(|(key, doc)| {
                let product = decode_product(&key, doc)?;
                let image = images.remove(&key).and_then(image_payload);
                Some(InventoryRecord { product, image })
            })
            .collect();

        info!(count = records.len(), "inventory loaded");
        Ok(records)
    }

    /// Fetches a single merged record.
    #[instrument(skip(self))]
    pub async fn find(&self, id: &ProductId) -> Result<Option<InventoryRecord>, ServiceError> {
        let Some(doc) = self.store().read(&product_path(id)).await? else {
            return Ok(None);
        };
        let Some(product) = decode_product(id.as_str(), doc) else {
            return Err(ServiceError::SerializationError(format!(
                "product {id} is malformed"
            )));
        };
        let image = self
            .store()
            .read(&image_path(id))
            .await?
            .and_then(image_payload);
        Ok(Some(InventoryRecord { product, image }))
    }

    /// Writes the product, then its image when one is supplied.
    ///
    /// `Create` allocates a new id; `Update` overwrites in place. A failed image
    /// write leaves the product write in place.
    #[instrument(skip(self, product, image))]
    pub async fn save(
        &self,
        product: Product,
        image: Option<&EncodedImage>,
        mode: SaveMode,
    ) -> Result<ProductId, ServiceError> {
        let id = match mode {
            SaveMode::Create => ProductId::generate(),
            SaveMode::Update(id) => id,
        };
        let product = Product {
            unique_id: id.clone(),
            ..product
        };

        self.store()
            .write(&product_path(&id), serde_json::to_value(&product)?)
            .await
            .map_err(|e| {
                error!(product_id = %id, error = %e, "Failed to write product");
                e
            })?;

        if let Some(image) = image {
            let doc: ProductImage = image.to_document();
            self.store()
                .write(&image_path(&id), serde_json::to_value(&doc)?)
                .await
                .map_err(|e| {
                    error!(product_id = %id, error = %e, "Failed to write product image");
                    e
                })?;
        }

        info!(product_id = %id, with_image = image.is_some(), "Product saved");
        Ok(id)
    }

    /// Applies a partial update to an existing product.
    #[instrument(skip(self, patch))]
    pub async fn update_fields(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<(), ServiceError> {
        let path = product_path(id);
        if self.store().read(&path).await?.is_none() {
            return Err(ServiceError::NotFound(format!("Product {id}")));
        }

        let fields = patch.into_fields()?;
        if fields.is_empty() {
            return Ok(());
        }
        self.store().update(&path, fields).await.map_err(|e| {
            error!(product_id = %id, error = %e, "Failed to update product");
            e
        })?;
        Ok(())
    }

    /// Sets only the `archive` flag.
    pub async fn set_archived(&self, id: &ProductId, archived: bool) -> Result<(), ServiceError> {
        self.update_fields(id, ProductPatch::archive(archived)).await?;
        info!(product_id = %id, archived, "Archive flag updated");
        Ok(())
    }

    /// Deletes the product, then its image. No rollback if the second delete fails.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: &ProductId) -> Result<(), ServiceError> {
        self.store().delete(&product_path(id)).await.map_err(|e| {
            error!(product_id = %id, error = %e, "Failed to delete product");
            e
        })?;
        self.store().delete(&image_path(id)).await.map_err(|e| {
            error!(product_id = %id, error = %e, "Product deleted but image delete failed");
            e
        })?;
        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Reads a collection as `(key, document)` pairs in key order.
    async fn read_collection(&self, name: &str) -> Result<Vec<(String, Value)>, ServiceError> {
        let value = self.store().read(name).await.map_err(|e| {
            error!(collection = name, error = %e, "Failed to read collection");
            e
        })?;

        let mut entries: Vec<(String, Value)> = match value {
            None => Vec::new(),
            Some(Value::Object(map)) => map.into_iter().collect(),
            // small sequential integer keys come back as an array
            Some(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .filter(|(_, doc)| !doc.is_null())
                .map(|(index, doc)| (index.to_string(), doc))
                .collect(),
            Some(other) => {
                warn!(collection = name, value = %other, "collection is not an object, ignoring");
                Vec::new()
            }
        };
        entries.sort_by(|(a, _), (b, _)| key_order(a).cmp(&key_order(b)));
        Ok(entries)
    }
}

impl Repository for InventoryRepository {
    fn store(&self) -> &dyn DocumentStore {
        self.base.store()
    }
}

/// Numeric keys first in numeric order, then the rest lexicographically.
fn key_order(key: &str) -> (bool, u128, &str) {
    match key.parse::<u128>() {
        Ok(n) => (false, n, key),
        Err(_) => (true, 0, key),
    }
}

fn decode_product(key: &str, doc: Value) -> Option<Product> {
    match serde_json::from_value::<Product>(doc) {
        Ok(product) => Some(Product {
            unique_id: ProductId::from_store_key(key),
            ..product
        }),
        Err(e) => {
            warn!(product_id = key, error = %e, "Skipping malformed product document");
            None
        }
    }
}

fn image_payload(doc: Value) -> Option<String> {
    serde_json::from_value::<ProductImage>(doc)
        .ok()
        .map(|doc| doc.image)
        .filter(|image| !image.is_empty())
}
