//! Configuration Types
//!
//! One immutable `Settings` value resolved at startup and threaded into the
//! pipeline. Core components never read files, environment variables, or CLI
//! arguments themselves.

use serde::{Deserialize, Serialize};

use crate::constants::{analysis, format, generation, network, retry};
use crate::types::{DocError, DocStyle, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Docstring rendering style
    pub style: DocStyle,
    /// Replace existing docstrings instead of skipping them
    pub overwrite: bool,
    /// Treat underscore-prefixed elements as candidates too
    pub include_private: bool,
    /// Snapshot each file to `.bak` before rewriting
    pub backup: bool,
    /// Maximum rendered docstring line length
    pub max_line_length: usize,
    /// Inferred types below this confidence are not written into docstrings
    pub type_confidence_threshold: f32,
    /// Files processed concurrently
    pub concurrency: usize,
    /// Include globs, relative to the scan root
    pub include: Vec<String>,
    /// Exclude globs, added on top of the built-in skip list
    pub exclude: Vec<String>,
    pub analysis: AnalysisSettings,
    pub provider: ProviderSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            style: DocStyle::Google,
            overwrite: false,
            include_private: false,
            backup: true,
            max_line_length: format::DEFAULT_MAX_LINE_LENGTH,
            type_confidence_threshold: 0.5,
            concurrency: generation::DEFAULT_CONCURRENCY,
            include: Vec::new(),
            exclude: Vec::new(),
            analysis: AnalysisSettings::default(),
            provider: ProviderSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Compute cyclomatic complexity
    pub complexity: bool,
    /// Detect design patterns and anti-patterns
    pub patterns: bool,
    /// Infer parameter/return types from usage
    pub type_inference: bool,
    /// Skip files larger than this (bytes)
    pub max_file_size: u64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            complexity: true,
            patterns: true,
            type_inference: true,
            max_file_size: analysis::MAX_FILE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Provider backend: `mock` or `openai`
    pub name: String,
    pub model: String,
    /// Environment variable holding the API key (never the key itself)
    pub api_key_env: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Bounded retries per element for retryable failures
    pub max_retries: u32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.3,
            max_tokens: network::DEFAULT_MAX_TOKENS,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            max_retries: retry::DEFAULT_MAX_RETRIES,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(DocError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.type_confidence_threshold) {
            return Err(DocError::Config(format!(
                "type_confidence_threshold must be in [0, 1], got {}",
                self.type_confidence_threshold
            )));
        }
        if self.max_line_length < 40 {
            return Err(DocError::Config(format!(
                "max_line_length must be at least 40, got {}",
                self.max_line_length
            )));
        }
        if !matches!(self.provider.name.as_str(), "mock" | "openai") {
            return Err(DocError::Config(format!(
                "Unknown provider: {}. Valid values: mock, openai",
                self.provider.name
            )));
        }
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(DocError::Config(format!(
                "temperature must be in [0, 2], got {}",
                self.provider.temperature
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn zero_concurrency_rejected() {
        let settings = Settings {
            concurrency: 0,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(DocError::Config(_))));
    }

    #[test]
    fn unknown_provider_rejected() {
        let mut settings = Settings::default();
        settings.provider.name = "carrier-pigeon".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn threshold_bounds_checked() {
        let settings = Settings {
            type_confidence_threshold: 1.5,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
