//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, Result};
use std::path::Path;

/// Configuration wrapper
#[derive(Debug, Clone)]
pub struct Config {
    /// Parsed schema
    pub schema: ConfigSchema,
    /// File the schema was read from, if any
    pub path: Option<String>,
}

impl Config {
    /// Load configuration from a file path or use defaults
    ///
    /// An explicit path that does not exist is an error; when no path is
    /// given the standard locations are searched and defaults are used if
    /// none exists.
    pub fn load(path: Option<&str>) -> Result<Self> {
        if let Some(p) = path {
            if !Path::new(p).exists() {
                return Err(Error::config_not_found(p));
            }
        }

        let config_path = path.map(String::from).or_else(find_config_file);

        let schema = if let Some(ref p) = config_path {
            load_config_file(p)?
        } else {
            ConfigSchema::default()
        };

        let config = Self {
            schema,
            path: config_path,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load with defaults only (no file)
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            schema: ConfigSchema::default(),
            path: None,
        }
    }

    /// Reject values no component can work with
    pub fn validate(&self) -> Result<()> {
        let schema = &self.schema;
        if schema.extraction.endpoint_url.trim().is_empty() {
            return Err(Error::config_invalid("extraction.endpoint_url cannot be empty"));
        }
        if schema.extraction.timeout_secs == 0 {
            return Err(Error::config_invalid("extraction.timeout_secs cannot be zero"));
        }
        if schema.gallery.album.trim().is_empty() {
            return Err(Error::config_invalid("gallery.album cannot be empty"));
        }
        if schema.capture.max_recent == 0 {
            return Err(Error::config_invalid("capture.max_recent must be at least 1"));
        }
        if !(1..=100).contains(&schema.capture.jpeg_quality) {
            return Err(Error::config_invalid("capture.jpeg_quality must be between 1 and 100"));
        }
        Ok(())
    }
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<String> {
    let candidates = [
        ".nutrivision.toml",
        "nutrivision.toml",
        ".config/nutrivision.toml",
    ];

    candidates
        .into_iter()
        .find(|candidate| Path::new(candidate).exists())
        .map(String::from)
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &str) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::from(e).with_context(format!("Failed to read config file {path}"))
    })?;

    toml::from_str(&content)
        .map_err(|e| Error::from(e).with_context(format!("Failed to parse config file {path}")))
}
