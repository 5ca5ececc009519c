//! OpenAI-Compatible Provider
//!
//! Chat-completions backend over HTTP. Works against the OpenAI API and any
//! server speaking the same protocol via `base_url`. The API key is read
//! once from the configured environment variable and held as a secret.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{DocProvider, GenerationContext, ProviderResponse, TokenUsage};
use crate::config::ProviderSettings;
use crate::constants::network::CONNECTION_TIMEOUT_SECS;
use crate::types::{DocError, ErrorCategory, ErrorClassifier, ProviderError, Result};

/// Rough blended price per 1K tokens, for the report's cost column
const PRICE_PER_1K_TOKENS: f64 = 0.0008;

pub struct OpenAiProvider {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: Url,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiProvider {
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        let raw_key = std::env::var(&settings.api_key_env).map_err(|_| {
            DocError::Config(format!(
                "Provider API key not found in environment variable {}",
                settings.api_key_env
            ))
        })?;
        if raw_key.trim().is_empty() {
            return Err(DocError::Config(format!(
                "Environment variable {} is empty",
                settings.api_key_env
            )));
        }

        let base_url = Url::parse(settings.base_url.trim_end_matches('/'))
            .map_err(|e| DocError::Config(format!("Invalid provider base_url: {}", e)))?;

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(CONNECTION_TIMEOUT_SECS))
            .build()
            .map_err(|e| DocError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: SecretString::from(raw_key),
            model: settings.model.clone(),
            base_url,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }

    fn endpoint(&self, path: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| DocError::Config("Provider base_url cannot be a base".to_string()))?;
            segments.extend(path);
        }
        Ok(url)
    }
}

#[async_trait]
impl DocProvider for OpenAiProvider {
    async fn generate(&self, context: &GenerationContext) -> Result<ProviderResponse> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system_prompt(context),
                },
                Message {
                    role: "user",
                    content: user_prompt(context),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let url = self.endpoint(&["chat", "completions"])?;
        let response = self
            .client
            .post(url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify(&e.to_string(), "openai"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(
                ErrorClassifier::classify_http_status(status.as_u16(), &body, "openai").into(),
            );
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify(&e.to_string(), "openai"))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ProviderError::with_provider(
                    ErrorCategory::Unknown,
                    "Provider returned an empty completion",
                    "openai",
                )
            })?;

        let usage = parsed
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();
        let cost_estimate = f64::from(usage.total_tokens) / 1000.0 * PRICE_PER_1K_TOKENS;

        tracing::debug!(
            element = %context.qualified_name,
            tokens = usage.total_tokens,
            "completion received"
        );
        Ok(ProviderResponse {
            text: strip_code_fences(&text),
            usage,
            cost_estimate,
        })
    }

    async fn test_connection(&self) -> bool {
        let Ok(url) = self.endpoint(&["models"]) else {
            return false;
        };
        self.client
            .get(url)
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn system_prompt(context: &GenerationContext) -> String {
    format!(
        "You write Python docstrings in {} style. Respond with the docstring body only: \
         no surrounding quotes, no code fences, no signature repetition.",
        context.style
    )
}

fn user_prompt(context: &GenerationContext) -> String {
    let mut parts = vec![format!(
        "Write a docstring for this {}:\n\n{}",
        context.kind, context.signature
    )];

    if let Some(scope) = &context.enclosing_scope {
        parts.push(format!("Defined in: {}", scope));
    }
    if let Some(analysis) = &context.analysis {
        if analysis.complexity > 0 {
            parts.push(format!("Cyclomatic complexity: {}", analysis.complexity));
        }
        if !analysis.patterns.is_empty() {
            parts.push(format!("Detected patterns: {}", analysis.patterns.join(", ")));
        }
        let hints: Vec<String> = analysis
            .inferred_types
            .iter()
            .filter(|(_, g)| g.confidence >= 0.5)
            .map(|(name, g)| format!("{}: {} (confidence {:.1})", name, g.ty, g.confidence))
            .collect();
        if !hints.is_empty() {
            parts.push(format!("Likely types:\n{}", hints.join("\n")));
        }
    }
    if !context.raises.is_empty() {
        parts.push(format!("Raises: {}", context.raises.join(", ")));
    }
    if !context.related.is_empty() {
        parts.push(format!(
            "Related definitions in the same scope:\n{}",
            context.related.join("\n")
        ));
    }
    if !context.source_snippet.is_empty() {
        parts.push(format!("Source:\n```python\n{}\n```", context.source_snippet));
    }
    parts.join("\n\n")
}

/// Models often wrap output in fences despite instructions
fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if let Some(inner) = trimmed.strip_prefix("```") {
        let inner = inner
            .trim_start_matches(|c: char| c.is_ascii_alphanumeric())
            .trim_start_matches('\n');
        return inner.trim_end_matches("```").trim().to_string();
    }
    trimmed.trim_matches('"').trim().to_string()
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_code_fences() {
        assert_eq!(
            strip_code_fences("```python\nDo a thing.\n```"),
            "Do a thing."
        );
        assert_eq!(strip_code_fences("Plain text."), "Plain text.");
        assert_eq!(strip_code_fences("\"Quoted.\""), "Quoted.");
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let settings = ProviderSettings {
            api_key_env: "DOCPILOT_TEST_KEY_THAT_DOES_NOT_EXIST".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            OpenAiProvider::new(&settings),
            Err(DocError::Config(_))
        ));
    }
}
