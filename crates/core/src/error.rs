//! Structured error handling with context and recovery suggestions
//!
//! Errors carry:
//! - A stable error code for programmatic handling
//! - Optional context describing what was being attempted
//! - Optional recovery suggestion for the user
//! - A serializable report form for JSON output

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum ErrorCode {
    // General errors (1xxx)
    Unknown = 1000,

    // IO errors (2xxx)
    IoError = 2000,
    FileNotFound = 2001,
    PermissionDenied = 2002,

    // Configuration errors (3xxx)
    ConfigError = 3000,
    ConfigNotFound = 3001,
    ConfigParseError = 3002,
    ConfigValidationError = 3003,

    // Extraction service errors (4xxx)
    ExtractionError = 4000,

    // Gallery errors (5xxx)
    GalleryError = 5000,

    // Validation errors (6xxx)
    InvalidInput = 6001,
    InvalidFormat = 6002,
    OutOfRange = 6003,
}

impl ErrorCode {
    /// Get the numeric code
    #[must_use]
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a human-readable category
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self.code() / 1000 {
            1 => "General",
            2 => "IO",
            3 => "Configuration",
            4 => "Extraction",
            5 => "Gallery",
            6 => "Validation",
            _ => "Unknown",
        }
    }

    /// Process exit code for this code's category
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self.code() / 1000 {
            3 => exit_codes::CONFIG_ERROR,
            4 => exit_codes::EXTRACTION_ERROR,
            5 => exit_codes::GALLERY_ERROR,
            6 => exit_codes::VALIDATION_ERROR,
            _ => exit_codes::FAILURE,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Main error type with rich context
#[derive(Error, Debug)]
pub struct Error {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional context
    pub context: Option<String>,
    /// Recovery suggestion
    pub suggestion: Option<String>,
    /// Source error
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, "\n  Context: {ctx}")?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {suggestion}")?;
        }
        Ok(())
    }
}

impl Error {
    /// Create a new error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            suggestion: None,
            source: None,
        }
    }

    /// Add context to the error
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a recovery suggestion
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add a source error
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Convert to a serializable report
    #[must_use]
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code,
            code_str: self.code.to_string(),
            category: self.code.category().to_string(),
            message: self.message.clone(),
            context: self.context.clone(),
            suggestion: self.suggestion.clone(),
            source: self.source.as_ref().map(ToString::to_string),
        }
    }

    /// Process exit code matching this error's category
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.code.exit_code()
    }

    // Convenience constructors

    /// Generic configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// An explicitly requested config file does not exist
    pub fn config_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(
            ErrorCode::ConfigNotFound,
            format!("Configuration file not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Create a nutrivision.toml file or pass --config with a valid path")
    }

    /// A config value is out of its allowed range
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigValidationError, message)
    }

    /// User input for `field` could not be parsed
    pub fn invalid_input(field: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message).with_context(format!("Field: {field}"))
    }

    /// User input for `field` parsed but is not an acceptable value
    pub fn out_of_range(field: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::OutOfRange, message).with_context(format!("Field: {field}"))
    }
}

/// Serializable error report for logging and JSON output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Error code
    pub code: ErrorCode,
    /// Code as printed, e.g. `E3001`
    pub code_str: String,
    /// Code category
    pub category: String,
    /// Human-readable message
    pub message: String,
    /// What was being attempted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// What the user can do about it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Underlying error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ErrorReport {
    /// Process exit code for this report
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.code.exit_code()
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Exit codes for CLI commands
pub mod exit_codes {
    /// Command completed
    pub const SUCCESS: i32 = 0;
    /// Any failure without a more specific code
    pub const FAILURE: i32 = 1;
    /// Invalid user input or image data
    pub const VALIDATION_ERROR: i32 = 2;
    /// Configuration could not be loaded or is invalid
    pub const CONFIG_ERROR: i32 = 3;
    /// The extraction request failed
    pub const EXTRACTION_ERROR: i32 = 4;
    /// The gallery could not be read or written
    pub const GALLERY_ERROR: i32 = 5;
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            _ => ErrorCode::IoError,
        };
        Error::new(code, err.to_string()).with_source(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::new(ErrorCode::ConfigParseError, format!("TOML parse error: {err}"))
            .with_source(err)
    }
}
