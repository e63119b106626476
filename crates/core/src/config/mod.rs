//! Configuration loading and schema definitions
//!
//! One `nutrivision.toml` file drives every crate; each section has defaults
//! so a missing file or a partial file is always valid.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
