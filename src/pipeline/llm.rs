//! LLM gateway: send one prompt, get back trimmed text.
//!
//! The gateway is thin. All prompt wording lives in
//! [`crate::prompts`], and the decision of whether a failure is fatal or
//! degrades to a placeholder lives in [`crate::service`]. There is no retry
//! and no response caching: every call is exactly one request to the
//! provider.

use crate::config::{ServerConfig, DEFAULT_MODEL};
use crate::error::DocQaError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::debug;

/// Sends a prompt to a generative-text model.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Return the model's reply with surrounding whitespace removed.
    async fn complete(&self, prompt: &str) -> Result<String, DocQaError>;
}

/// [`LlmGateway`] backed by an `edgequake-llm` provider.
pub struct ProviderGateway {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
    timeout_secs: Option<u64>,
}

impl ProviderGateway {
    /// Resolve the provider named by `config` and apply its sampling options.
    pub fn from_config(config: &ServerConfig) -> Result<Self, DocQaError> {
        let provider = resolve_provider(config)?;
        Ok(Self {
            provider,
            options: build_options(config),
            timeout_secs: config.llm_timeout_secs,
        })
    }
}

#[async_trait]
impl LlmGateway for ProviderGateway {
    async fn complete(&self, prompt: &str) -> Result<String, DocQaError> {
        let start = Instant::now();
        let messages = vec![ChatMessage::user(prompt)];
        let call = self.provider.chat(&messages, Some(&self.options));

        let result = match self.timeout_secs {
            Some(secs) => timeout(Duration::from_secs(secs), call)
                .await
                .map_err(|_| DocQaError::LlmTimeout { secs })?,
            None => call.await,
        };

        let response = result.map_err(|e| DocQaError::LlmApiError {
            message: format!("{}", e),
        })?;

        debug!(
            "LLM call: {} prompt chars, {} input tokens, {} output tokens, {:?}",
            prompt.len(),
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        Ok(response.content.trim().to_string())
    }
}

/// Build `CompletionOptions` from the server config.
fn build_options(config: &ServerConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        ..Default::default()
    }
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, DocQaError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        DocQaError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model` or
///    [`DEFAULT_MODEL`]. The API key comes from the provider's usual
///    environment variable (`GEMINI_API_KEY`, `OPENAI_API_KEY`, …).
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 4. **Auto-detection** via [`ProviderFactory::from_env`].
pub fn resolve_provider(config: &ServerConfig) -> Result<Arc<dyn LLMProvider>, DocQaError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| DocQaError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults_leave_provider_settings() {
        let config = ServerConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, None);
        assert_eq!(opts.max_tokens, None);
    }

    #[test]
    fn build_options_carries_overrides() {
        let config = ServerConfig::builder()
            .temperature(0.2)
            .max_tokens(1024)
            .build()
            .unwrap();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.2));
        assert_eq!(opts.max_tokens, Some(1024));
    }
}
