use serde::{Deserialize, Serialize};

/// Image document stored at `images/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    /// `data:` URL of the resized photo
    pub image: String,
}

/// Output of the image preprocessor, ready to embed or store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn to_document(&self) -> ProductImage {
        ProductImage {
            image: self.data_url.clone(),
        }
    }
}
