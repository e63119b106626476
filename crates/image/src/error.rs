//! Error types for the image crate.

use thiserror::Error;

/// Result type alias for image operations.
pub type Result<T> = std::result::Result<T, ImageError>;

/// Errors that can occur during image operations.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Unknown image format
    #[error("Unknown image format")]
    UnknownFormat,

    /// Invalid image data
    #[error("Invalid image data: {0}")]
    InvalidData(String),

    /// Crop region falls outside the image
    #[error("Crop region {width}x{height} at ({x}, {y}) is outside a {image_width}x{image_height} image")]
    CropOutOfBounds {
        /// Left edge
        x: u32,
        /// Top edge
        y: u32,
        /// Region width
        width: u32,
        /// Region height
        height: u32,
        /// Image width
        image_width: u32,
        /// Image height
        image_height: u32,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Image processing error
    #[cfg(feature = "processing")]
    #[error("Image processing error: {0}")]
    ProcessingError(#[from] image::ImageError),
}
