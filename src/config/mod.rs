//! Configuration Module
//!
//! Defaults → TOML file → `DOCPILOT_*` environment, resolved once into an
//! immutable `Settings` value.

pub mod loader;
pub mod types;

pub use loader::{DEFAULT_CONFIG_FILE, load};
pub use types::{AnalysisSettings, ProviderSettings, Settings};
