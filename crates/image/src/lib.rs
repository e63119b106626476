//! Capture-side image utilities for NutriVision.
//!
//! This crate provides:
//! - Format detection from magic bytes and MIME inference from file names
//! - Header-only dimension extraction
//! - Label crop geometry (the centered 70% x 60% guide region)
//! - The capture collaborator and the recent captures list
//! - URI helpers shared by the upload client and the gallery

#![warn(missing_docs)]

pub mod capture;
pub mod crop;
mod detect;
mod error;
mod metadata;
pub mod uri;

pub use capture::{Capture, CaptureMode, CapturedImage, RecentCaptures, DEFAULT_RECENT_CAPACITY};
pub use crop::{compute_label_crop, PixelRect, Rect};
pub use detect::{detect_format, infer_content_type, ImageFormat, DEFAULT_CONTENT_TYPE};
pub use error::{ImageError, Result};
pub use metadata::{extract_metadata, ImageMetadata, Orientation};

#[cfg(feature = "processing")]
pub use capture::FileCapture;
#[cfg(feature = "processing")]
pub use crop::crop_to_rect;
