//! Terminal presentation for the NutriVision CLI
//!
//! - Status messages
//! - Nutrient breakdown tables and bars
//! - Upload spinners

#![warn(missing_docs)]

pub mod output;
pub mod progress;
