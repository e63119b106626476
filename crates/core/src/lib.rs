//! Core types shared by the NutriVision crates
//!
//! - **Error handling**: structured errors with codes, context and recovery suggestions
//! - **Configuration**: `nutrivision.toml` loading with per-section defaults
//! - **Profile**: biometric inputs (age, weight, height) with unit handling
//!
//! # Example
//!
//! ```rust,no_run
//! use nutrivision_core::config::Config;
//! use nutrivision_core::profile::Profile;
//!
//! let config = Config::load(None).expect("config");
//! println!("Extraction endpoint: {}", config.schema.extraction.endpoint_url);
//!
//! let profile = Profile::default();
//! println!("Weight: {:.1} kg", profile.weight.kilograms());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod profile;

pub use error::{Error, ErrorCode, ErrorReport, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema};
    pub use crate::error::{exit_codes, Error, ErrorCode, ErrorReport, Result};
    pub use crate::profile::{Age, Height, HeightUnit, Profile, Weight, WeightUnit};
}
