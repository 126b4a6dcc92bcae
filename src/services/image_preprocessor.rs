//! Product photo preprocessing.
//!
//! Uploaded photos are decoded, rotated, shrunk to fit the configured bounding
//! box and re-encoded as JPEG before being embedded as a `data:` URL.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::{debug, instrument};

use crate::errors::ServiceError;
use crate::models::EncodedImage;

const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Clockwise rotation applied before resizing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    Upright,
    Quarter,
    Half,
    ThreeQuarters,
}

impl TryFrom<u16> for Rotation {
    type Error = ServiceError;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Self::Upright),
            90 => Ok(Self::Quarter),
            180 => Ok(Self::Half),
            270 => Ok(Self::ThreeQuarters),
            other => Err(ServiceError::InvalidInput(format!(
                "rotation must be 0, 90, 180 or 270 degrees, got {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeOptions {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality, 1..=100
    pub quality: u8,
    pub rotation: Rotation,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            max_width: 300,
            max_height: 400,
            quality: 80,
            rotation: Rotation::Upright,
        }
    }
}

/// An uploaded file before preprocessing.
#[derive(Debug, Clone)]
pub struct RawImage {
    pub name: Option<String>,
    pub bytes: Vec<u8>,
}

impl RawImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { name: None, bytes }
    }

    pub async fn from_path(path: &Path) -> Result<Self, ServiceError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ServiceError::ImageError(format!("failed to read {}: {e}", path.display()))
        })?;
        Ok(Self {
            name: path.file_name().map(|n| n.to_string_lossy().into_owned()),
            bytes,
        })
    }

    /// Accepts bare base64 or a `data:` URL.
    pub fn from_base64(encoded: &str) -> Result<Self, ServiceError> {
        let payload = match encoded.split_once(',') {
            Some((meta, data)) if meta.starts_with("data:") => data,
            _ => encoded,
        };
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| ServiceError::ImageError(format!("base64 decode error: {e}")))?;
        Ok(Self::new(bytes))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImagePreprocessor {
    options: ResizeOptions,
}

impl ImagePreprocessor {
    pub fn new(options: ResizeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ResizeOptions {
        self.options
    }

    /// Resizes and re-encodes an upload. `None` in means no file was chosen.
    ///
    /// Decoding runs on the blocking pool; a decode failure is returned as
    /// [`ServiceError::ImageError`] and never retried.
    #[instrument(skip_all)]
    pub async fn preprocess(
        &self,
        raw: Option<RawImage>,
    ) -> Result<Option<EncodedImage>, ServiceError> {
        let Some(raw) = raw else {
            return Ok(None);
        };
        let options = self.options;
        let encoded = tokio::task::spawn_blocking(move || encode(&raw.bytes, options))
            .await
            .map_err(|e| ServiceError::InternalError(format!("image task failed: {e}")))??;
        debug!(width = encoded.width, height = encoded.height, "image preprocessed");
        Ok(Some(encoded))
    }
}

/// Synchronous core of [`ImagePreprocessor::preprocess`].
pub fn encode(bytes: &[u8], options: ResizeOptions) -> Result<EncodedImage, ServiceError> {
    if bytes.is_empty() {
        return Err(ServiceError::ImageError("image file is empty".into()));
    }
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| ServiceError::ImageError(format!("failed to decode image: {e}")))?;

    let rotated = match options.rotation {
        Rotation::Upright => decoded,
        Rotation::Quarter => decoded.rotate90(),
        Rotation::Half => decoded.rotate180(),
        Rotation::ThreeQuarters => decoded.rotate270(),
    };

    let (width, height) = fit_within(
        rotated.width(),
        rotated.height(),
        options.max_width,
        options.max_height,
    );
    let resized = if (width, height) == (rotated.width(), rotated.height()) {
        rotated
    } else {
        rotated.resize_exact(width, height, FilterType::Triangle)
    };

    // JPEG carries no alpha channel
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());
    let mut jpeg = Vec::new();
    let quality = options.quality.clamp(1, 100);
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, quality))
        .map_err(|e| ServiceError::ImageError(format!("failed to encode image: {e}")))?;

    Ok(EncodedImage {
        data_url: format!("{DATA_URL_PREFIX}{}", STANDARD.encode(&jpeg)),
        width,
        height,
    })
}

/// Largest size with the same aspect ratio inside the box. Never upscales.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }
    let scale = f64::min(
        f64::from(max_width) / f64::from(width),
        f64::from(max_height) / f64::from(height),
    );
    let scaled =
        |side: u32, max: u32| ((f64::from(side) * scale).round() as u32).clamp(1, max.max(1));
    (scaled(width, max_width), scaled(height, max_height))
}
