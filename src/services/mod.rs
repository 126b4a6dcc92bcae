pub mod image_preprocessor;

pub use image_preprocessor::{ImagePreprocessor, RawImage, ResizeOptions, Rotation};
