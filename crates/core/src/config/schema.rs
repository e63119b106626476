//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default extraction service endpoint
pub const DEFAULT_ENDPOINT_URL: &str =
    "https://nutrivision-backend-textrecog-77tx.onrender.com/extract/";

/// Default gallery album name
pub const DEFAULT_ALBUM: &str = "NutriVision";

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    /// Remote extraction service
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Gallery album storage
    #[serde(default)]
    pub gallery: GalleryConfig,

    /// Capture pipeline
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Logging
    #[serde(default)]
    pub telemetry: TelemetrySection,
}

/// Extraction service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Full URL of the extraction endpoint
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,

    /// Transport timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            endpoint_url: default_endpoint_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint_url() -> String {
    DEFAULT_ENDPOINT_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Gallery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryConfig {
    /// Album that saved captures go into
    #[serde(default = "default_album")]
    pub album: String,

    /// Directory holding all albums
    #[serde(default = "default_gallery_root")]
    pub root_dir: PathBuf,

    /// Number of items returned when reloading recent captures
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            album: default_album(),
            root_dir: default_gallery_root(),
            recent_limit: default_recent_limit(),
        }
    }
}

fn default_album() -> String {
    DEFAULT_ALBUM.to_string()
}

fn default_gallery_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".nutrivision"))
        .join("nutrivision")
        .join("gallery")
}

fn default_recent_limit() -> usize {
    5
}

/// Capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Where cropped label captures are written
    #[serde(default = "default_capture_dir")]
    pub output_dir: PathBuf,

    /// Capacity of the in-memory recent captures list
    #[serde(default = "default_max_recent")]
    pub max_recent: usize,

    /// JPEG quality for re-encoded crops (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            output_dir: default_capture_dir(),
            max_recent: default_max_recent(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

fn default_capture_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("nutrivision")
        .join("captures")
}

fn default_max_recent() -> usize {
    5
}

fn default_jpeg_quality() -> u8 {
    100
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySection {
    /// Default `tracing` filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
