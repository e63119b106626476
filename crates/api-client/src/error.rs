//! Error types for the extraction client

use thiserror::Error;

/// Result type alias for extraction operations
pub type ClientResult<T> = Result<T, ExtractionError>;

/// Extraction client errors
///
/// Every variant renders a distinct message; the message is what the client
/// records in its observable state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// Submission attempted with zero images
    #[error("No images to upload")]
    EmptyBatch,

    /// An image URI could not be resolved to bytes
    #[error("Cannot read image {uri}: {reason}")]
    UnreadableSource {
        /// URI of the capture
        uri: String,
        /// Why the bytes could not be read
        reason: String,
    },

    /// Server returned a non-2xx status
    #[error("Extraction service returned HTTP {0}")]
    HttpStatus(u16),

    /// Response body is not JSON or lacks the expected structure
    #[error("Malformed extraction response: {0}")]
    MalformedResponse(String),

    /// A nutrient value could not be converted to a number
    #[error("Cannot parse nutrient value {0:?}")]
    ParseError(String),

    /// Transport-level failure (DNS, connection refused, timeout)
    #[error("Extraction service unreachable: {0}")]
    NetworkUnreachable(String),

    /// A submission is already in flight on this client
    #[error("An upload is already in progress")]
    Busy,

    /// A multipart part could not be built
    #[error("Invalid upload part {name}: {reason}")]
    InvalidPart {
        /// File name of the part
        name: String,
        /// Why the part was rejected
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractionError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an unreadable source error
    pub fn unreadable(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnreadableSource {
            uri: uri.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::HttpStatus(status) if (400..500).contains(status))
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::HttpStatus(status) if *status >= 500)
    }

    /// Whether the failure happened before anything was sent
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::EmptyBatch
                | Self::UnreadableSource { .. }
                | Self::Busy
                | Self::InvalidPart { .. }
                | Self::Config(_)
        )
    }
}
