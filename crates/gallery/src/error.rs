//! Error types for the gallery crate.

use thiserror::Error;

/// Result type alias for gallery operations.
pub type Result<T> = std::result::Result<T, GalleryError>;

/// Errors that can occur while reading or writing albums.
#[derive(Debug, Error)]
pub enum GalleryError {
    /// The capture's bytes are not on this machine
    #[error("Capture is not a readable local file: {0}")]
    UnreadableSource(String),

    /// Album name is empty or would escape the gallery root
    #[error("Invalid album name: {0:?}")]
    InvalidAlbum(String),

    /// Album index could not be parsed or written
    #[error("Album index error: {0}")]
    Index(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Another thread panicked while holding the album lock
    #[error("Gallery lock poisoned")]
    LockPoisoned,
}
