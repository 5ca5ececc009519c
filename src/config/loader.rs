//! Configuration Loading
//!
//! Resolution order: built-in defaults, then a TOML file, then `DOCPILOT_*`
//! environment variables. Nested keys use `__` in the environment
//! (`DOCPILOT_PROVIDER__MODEL=gpt-4o`).

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use super::types::Settings;
use crate::types::{DocError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "docpilot.toml";

/// Load settings. A missing explicit path is an error; the default config
/// file is optional.
pub fn load(path: Option<&Path>) -> Result<Settings> {
    let mut figment = Figment::from(Serialized::defaults(Settings::default()));

    match path {
        Some(p) => {
            if !p.exists() {
                return Err(DocError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Toml::file(p));
        }
        None => figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE)),
    }

    let settings: Settings = figment
        .merge(Env::prefixed("DOCPILOT_").split("__"))
        .extract()
        .map_err(|e| DocError::Config(e.to_string()))?;
    settings.validate()?;
    Ok(settings)
}
