//! Client for the NutriVision nutrient extraction service
//!
//! Captured label and fruit photos are uploaded in one multipart request to a
//! remote endpoint that returns the nutrients it found. This crate builds that
//! request, tracks the upload in an observable state and parses the answer
//! into typed, gram-normalized values.
//!
//! # Features
//!
//! - **Single-shot uploads**: one POST per submission, no retry
//! - **Observable state**: `idle`, `uploading`, `success`, `failed` through a
//!   `tokio::sync::watch` channel
//! - **Concurrency guard**: a second submission while one is in flight is rejected
//! - **Typed responses**: the `combined` map is validated on parse
//! - **Request correlation**: every upload carries an `X-Request-ID`
//!
//! # Example
//!
//! ```rust,no_run
//! use nutrivision_client::{ClientConfig, ExtractionClient};
//! use nutrivision_image::CapturedImage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ExtractionClient::with_config(ClientConfig::from_env()?)?;
//!
//!     let result = client.submit(&[CapturedImage::label("/tmp/label.jpg")]).await?;
//!     let breakdown = result.totals()?.breakdown();
//!     println!("Total: {:.1} g", breakdown.total_grams);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod nutrients;
pub mod state;

pub use client::{ExtractionClient, FILES_FIELD};
pub use config::{ClientConfig, Environment};
pub use error::{ClientResult, ExtractionError};
pub use nutrients::{
    normalize_to_grams, ExtractionResult, IntakeBreakdown, NutrientShare, NutrientTotals,
    NutrientValue,
};
pub use state::{ExtractionClientState, Status};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::ExtractionClient;
    pub use crate::config::{ClientConfig, Environment};
    pub use crate::error::{ClientResult, ExtractionError};
    pub use crate::nutrients::{normalize_to_grams, ExtractionResult, NutrientTotals};
    pub use crate::state::{ExtractionClientState, Status};
}
