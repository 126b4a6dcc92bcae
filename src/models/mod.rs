// Inventory item models
pub mod image;
pub mod lenient;
pub mod patch;
pub mod product;
pub mod record;

pub use image::{EncodedImage, ProductImage};
pub use patch::ProductPatch;
pub use product::{Product, ProductId};
pub use record::{InventoryRecord, SaveMode};
