//! Documentation Providers
//!
//! External collaborators that turn an element's structural context into raw
//! docstring text. The pipeline depends only on the `DocProvider` trait;
//! backends classify their own failures into `ErrorCategory` so the
//! orchestrator can pick the right retry policy.

pub mod mock;
pub mod openai;

pub use mock::MockProvider;
pub use openai::OpenAiProvider;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Settings;
use crate::types::{AnalysisResult, DocError, DocStyle, ElementKind, ParameterInfo, Result, ReturnInfo};

/// Everything a provider gets to know about one element
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub qualified_name: String,
    pub kind: ElementKind,
    /// Signature as written (`def f(a: int) -> str`)
    pub signature: String,
    pub style: DocStyle,
    pub existing_docstring: Option<String>,
    /// Enclosing class or module name
    pub enclosing_scope: Option<String>,
    pub module_path: String,
    pub parameters: Vec<ParameterInfo>,
    pub returns: Option<ReturnInfo>,
    pub raises: Vec<String>,
    pub analysis: Option<AnalysisResult>,
    /// Signatures of up to a few related siblings, for extra context
    pub related: Vec<String>,
    /// The element's own source, dedented
    pub source_snippet: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Raw provider output for one element
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Unrendered docstring text; the formatter shapes it per style
    pub text: String,
    pub usage: TokenUsage,
    pub cost_estimate: f64,
}

#[async_trait]
pub trait DocProvider: Send + Sync {
    /// Produce raw docstring text for one element.
    ///
    /// Failures must come back as `DocError::Provider` with an accurate
    /// `ErrorCategory`; the orchestrator's retry policy depends on it.
    async fn generate(&self, context: &GenerationContext) -> Result<ProviderResponse>;

    async fn test_connection(&self) -> bool;

    fn name(&self) -> &str;

    fn model(&self) -> &str;
}

/// Shared provider handle for concurrent workers
pub type SharedProvider = Arc<dyn DocProvider>;

/// Build the provider selected by settings
pub fn create_provider(settings: &Settings) -> Result<SharedProvider> {
    match settings.provider.name.as_str() {
        "mock" => Ok(Arc::new(MockProvider::new())),
        "openai" => Ok(Arc::new(OpenAiProvider::new(&settings.provider)?)),
        other => Err(DocError::Config(format!(
            "Unknown provider: {}. Valid values: mock, openai",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_builds_mock() {
        let settings = Settings::default();
        let provider = create_provider(&settings).unwrap();
        assert_eq!(provider.name(), "mock");
    }

    #[test]
    fn factory_rejects_unknown_backend() {
        let mut settings = Settings::default();
        settings.provider.name = "smoke-signals".to_string();
        assert!(create_provider(&settings).is_err());
    }
}
