//! LLM integration.
//!
//! Supports:
//! - **OpenAI** (and OpenAI-compatible endpoints): chat completions API
//! - **Anthropic**: Messages API
//!
//! Both providers speak plain HTTP via `reqwest` behind the `LlmProvider`
//! trait; the rest of the engine never sees which backend is configured.

mod anthropic;
mod openai;
pub mod provider;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;
pub use provider::*;

use std::sync::Arc;

use secrecy::SecretString;

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    OpenAi,
    Anthropic,
}

impl LlmBackend {
    /// Parse a backend name from configuration ("openai" / "anthropic").
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "openai" => Some(LlmBackend::OpenAi),
            "anthropic" => Some(LlmBackend::Anthropic),
            _ => None,
        }
    }
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: SecretString,
    pub model: String,
}

/// Create an LLM provider from configuration.
///
/// `client` carries the engine-wide request timeout (see `config::http_client`).
pub fn create_provider(config: &LlmConfig, client: reqwest::Client) -> Arc<dyn LlmProvider> {
    match config.backend {
        LlmBackend::OpenAi => {
            tracing::info!("Using OpenAI (model: {})", config.model);
            Arc::new(OpenAiProvider::new(
                client,
                config.api_key.clone(),
                config.model.clone(),
            ))
        }
        LlmBackend::Anthropic => {
            tracing::info!("Using Anthropic (model: {})", config.model);
            Arc::new(AnthropicProvider::new(
                client,
                config.api_key.clone(),
                config.model.clone(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parse_accepts_known_names() {
        assert_eq!(LlmBackend::parse("openai"), Some(LlmBackend::OpenAi));
        assert_eq!(LlmBackend::parse("Anthropic"), Some(LlmBackend::Anthropic));
        assert_eq!(LlmBackend::parse("llama"), None);
    }

    #[test]
    fn create_provider_reports_model_name() {
        let config = LlmConfig {
            backend: LlmBackend::OpenAi,
            api_key: SecretString::from("sk-test"),
            model: "gpt-4o-mini".to_string(),
        };
        let provider = create_provider(&config, reqwest::Client::new());
        assert_eq!(provider.model_name(), "gpt-4o-mini");
    }
}
