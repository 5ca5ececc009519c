//! Config Command
//!
//! Show the resolved configuration and write a starter config file. Values
//! are printed exactly as the rest of the tool sees them after defaults,
//! file, and environment are merged.

use std::path::Path;

use crate::cli::Output;
use crate::config::{self, DEFAULT_CONFIG_FILE, Settings};
use crate::types::{DocError, Result};

pub fn show(config_path: Option<&Path>, format: &str) -> Result<()> {
    let settings = config::load(config_path)?;
    let rendered = match format {
        "json" => serde_json::to_string_pretty(&settings).map_err(DocError::Json)?,
        _ => toml::to_string_pretty(&settings)
            .map_err(|e| DocError::Config(format!("Failed to render settings: {}", e)))?,
    };
    println!("{}", rendered);
    Ok(())
}

/// Write a starter `docpilot.toml` with the default settings
pub fn init(force: bool) -> Result<()> {
    let out = Output::new();
    let path = Path::new(DEFAULT_CONFIG_FILE);
    if path.exists() && !force {
        return Err(DocError::Config(format!(
            "{} already exists (use --force to overwrite)",
            DEFAULT_CONFIG_FILE
        )));
    }

    let rendered = toml::to_string_pretty(&Settings::default())
        .map_err(|e| DocError::Config(format!("Failed to render settings: {}", e)))?;
    std::fs::write(path, rendered)?;
    out.success(&format!("Wrote {}", DEFAULT_CONFIG_FILE));
    Ok(())
}
