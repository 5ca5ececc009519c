//! Mock Provider
//!
//! Deterministic, offline provider used by tests and as the default backend.
//! Template mode derives a docstring from the element's structure alone;
//! canned mode replays a fixed response; failure rules simulate provider
//! errors for specific elements or a bounded number of calls.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use super::{DocProvider, GenerationContext, ProviderResponse, TokenUsage};
use crate::types::{ElementKind, ProviderError, Result};

enum Behavior {
    Template,
    Canned(String),
}

struct FailureRule {
    error: ProviderError,
    /// Fail only this qualified name; `None` fails every call
    target: Option<String>,
    /// Remaining failures; `u32::MAX` means always fail
    remaining: AtomicU32,
}

pub struct MockProvider {
    behavior: Behavior,
    failure: Option<FailureRule>,
    calls: AtomicU32,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Template mode: docstring text derived from the element's structure
    pub fn new() -> Self {
        Self {
            behavior: Behavior::Template,
            failure: None,
            calls: AtomicU32::new(0),
        }
    }

    /// Always return the given raw text
    pub fn returning(text: impl Into<String>) -> Self {
        Self {
            behavior: Behavior::Canned(text.into()),
            ..Self::new()
        }
    }

    /// Fail every call with the given error
    pub fn failing(error: ProviderError) -> Self {
        Self {
            failure: Some(FailureRule {
                error,
                target: None,
                remaining: AtomicU32::new(u32::MAX),
            }),
            ..Self::new()
        }
    }

    /// Fail the first `times` calls, then behave normally
    pub fn failing_times(error: ProviderError, times: u32) -> Self {
        Self {
            failure: Some(FailureRule {
                error,
                target: None,
                remaining: AtomicU32::new(times),
            }),
            ..Self::new()
        }
    }

    /// Fail only calls for one qualified name
    pub fn failing_for(qualified_name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            failure: Some(FailureRule {
                error,
                target: Some(qualified_name.into()),
                remaining: AtomicU32::new(u32::MAX),
            }),
            ..Self::new()
        }
    }

    /// Total `generate` calls observed, failures included
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn template(context: &GenerationContext) -> String {
        let mut parts: Vec<String> = vec![summary_for(context)];

        let params: Vec<&crate::types::ParameterInfo> = context
            .parameters
            .iter()
            .filter(|p| !p.is_receiver())
            .collect();
        if !params.is_empty() {
            let mut section = vec!["Args:".to_string()];
            for param in params {
                section.push(format!("    {}: The {} value.", param.name, param.name.replace('_', " ")));
            }
            parts.push(section.join("\n"));
        }

        let is_generator = context.returns.as_ref().is_some_and(|r| r.is_generator);
        if is_generator {
            parts.push("Yields:\n    Items produced by the iteration.".to_string());
        } else if returns_something(context) {
            parts.push("Returns:\n    The resulting value.".to_string());
        }

        if !context.raises.is_empty() {
            let mut section = vec!["Raises:".to_string()];
            for exc in &context.raises {
                section.push(format!("    {}: If the operation fails.", exc));
            }
            parts.push(section.join("\n"));
        }

        parts.join("\n\n")
    }
}

fn summary_for(context: &GenerationContext) -> String {
    let readable = context
        .qualified_name
        .rsplit('.')
        .next()
        .unwrap_or(&context.qualified_name)
        .replace('_', " ")
        .trim()
        .to_string();
    let mut chars = readable.chars();
    let capitalized = match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => readable,
    };
    match context.kind {
        ElementKind::Module => format!("Module {}.", capitalized.to_lowercase()),
        ElementKind::Class => format!("Represents a {}.", capitalized.to_lowercase()),
        ElementKind::Property => format!("{} property.", capitalized),
        _ => format!("{}.", capitalized),
    }
}

fn returns_something(context: &GenerationContext) -> bool {
    match &context.returns {
        Some(ret) => match ret.annotation.as_deref() {
            Some("None") => false,
            Some(_) => true,
            None => context
                .analysis
                .as_ref()
                .and_then(|a| a.inferred_types.get("return"))
                .is_some_and(|g| g.ty != "None"),
        },
        None => false,
    }
}

#[async_trait]
impl DocProvider for MockProvider {
    async fn generate(&self, context: &GenerationContext) -> Result<ProviderResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(rule) = &self.failure {
            let applies = rule
                .target
                .as_deref()
                .is_none_or(|t| t == context.qualified_name);
            if applies {
                let remaining = rule.remaining.load(Ordering::SeqCst);
                if remaining > 0 {
                    if remaining != u32::MAX {
                        rule.remaining.fetch_sub(1, Ordering::SeqCst);
                    }
                    return Err(rule.error.clone().into());
                }
            }
        }

        let text = match &self.behavior {
            Behavior::Template => Self::template(context),
            Behavior::Canned(text) => text.clone(),
        };
        let prompt_tokens = (context.signature.len() / 4) as u32;
        let completion_tokens = (text.len() / 4) as u32;
        Ok(ProviderResponse {
            text,
            usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            cost_estimate: 0.0,
        })
    }

    async fn test_connection(&self) -> bool {
        self.failure.is_none()
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "template"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DocStyle, ErrorCategory, ParameterInfo, ReturnInfo};

    fn context(name: &str, kind: ElementKind) -> GenerationContext {
        GenerationContext {
            qualified_name: name.to_string(),
            kind,
            signature: format!("def {}()", name.rsplit('.').next().unwrap()),
            style: DocStyle::Google,
            existing_docstring: None,
            enclosing_scope: None,
            module_path: "demo".to_string(),
            parameters: Vec::new(),
            returns: None,
            raises: Vec::new(),
            analysis: None,
            related: Vec::new(),
            source_snippet: String::new(),
        }
    }

    #[tokio::test]
    async fn template_mentions_parameters_and_raises() {
        let mut ctx = context("demo.load_config", ElementKind::Function);
        ctx.parameters = vec![ParameterInfo::new("config_path")];
        ctx.raises = vec!["FileNotFoundError".to_string()];
        ctx.returns = Some(ReturnInfo {
            annotation: Some("dict".to_string()),
            ..Default::default()
        });

        let response = MockProvider::new().generate(&ctx).await.unwrap();
        assert!(response.text.starts_with("Load config."));
        assert!(response.text.contains("config_path: The config path value."));
        assert!(response.text.contains("Returns:"));
        assert!(response.text.contains("FileNotFoundError"));
    }

    #[tokio::test]
    async fn canned_response_is_verbatim() {
        let ctx = context("demo.add", ElementKind::Function);
        let provider = MockProvider::returning("Add two numbers.");
        let response = provider.generate(&ctx).await.unwrap();
        assert_eq!(response.text, "Add two numbers.");
    }

    #[tokio::test]
    async fn failing_times_recovers_afterwards() {
        let ctx = context("demo.f", ElementKind::Function);
        let provider = MockProvider::failing_times(
            ProviderError::new(ErrorCategory::Transient, "overloaded"),
            2,
        );
        assert!(provider.generate(&ctx).await.is_err());
        assert!(provider.generate(&ctx).await.is_err());
        assert!(provider.generate(&ctx).await.is_ok());
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn failing_for_targets_one_element() {
        let provider = MockProvider::failing_for(
            "demo.bad",
            ProviderError::new(ErrorCategory::Auth, "denied"),
        );
        let good = context("demo.good", ElementKind::Function);
        let bad = context("demo.bad", ElementKind::Function);
        assert!(provider.generate(&good).await.is_ok());
        assert!(provider.generate(&bad).await.is_err());
    }
}
