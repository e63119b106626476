//! Saved-capture gallery for NutriVision.
//!
//! Captures the user keeps are copied into a named album on disk. Albums are
//! plain directories with a JSON index, so they can be listed newest-first and
//! entries can be found again either by asset id or by the URI the capture
//! originally had.
//!
//! Gallery problems never block extraction: a missing album lists as empty,
//! and discarding a capture removes it locally even when the stored copy
//! cannot be found.

#![warn(missing_docs)]

mod error;
mod matching;
mod session;
mod store;

pub use error::{GalleryError, Result};
pub use matching::{find_asset, AssetMatch};
pub use session::{discard_capture, load_recent};
pub use store::{AssetId, AssetRecord, FileGallery, Gallery, INDEX_FILE};
