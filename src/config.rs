//! Configuration types for the document Q&A server.
//!
//! Everything the server needs at runtime lives in [`ServerConfig`], built
//! through [`ServerConfigBuilder`]. The binary fills the builder from CLI
//! flags and environment variables; tests build it directly, usually with a
//! pre-constructed provider.
//!
//! No credential is ever stored here. The provider's API key is read from the
//! environment by `edgequake-llm` when the provider is resolved.

use crate::error::DocQaError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default upload cap: 50 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Longest accepted session TTL: 100 years.
pub const MAX_SESSION_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Default model when a provider is named without one.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Configuration for the document Q&A server.
///
/// # Example
/// ```rust
/// use docqa::ServerConfig;
///
/// let config = ServerConfig::builder()
///     .port(8080)
///     .session_ttl_secs(3600)
///     .build()
///     .unwrap();
/// assert_eq!(config.port, 8080);
/// ```
#[derive(Clone)]
pub struct ServerConfig {
    /// Interface to bind. Default: "0.0.0.0".
    pub host: String,

    /// TCP port. Default: 8000.
    pub port: u16,

    /// Maximum accepted upload size in bytes. Default: 50 MiB.
    pub max_upload_bytes: usize,

    /// Character budgets for the assembled document context.
    pub budgets: ContextBudgets,

    /// LLM model identifier, e.g. "gemini-2.5-flash", "gpt-4.1-mini".
    /// If None, uses [`DEFAULT_MODEL`] for a named provider or the
    /// auto-detected provider's default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. None leaves the provider default in place.
    pub temperature: Option<f32>,

    /// Maximum tokens generated per answer. None leaves the provider default.
    pub max_tokens: Option<usize>,

    /// Local timeout around each LLM call. None relies on the client
    /// library's own defaults.
    pub llm_timeout_secs: Option<u64>,

    /// Session lifetime. None keeps sessions until they are deleted or the
    /// process exits.
    pub session_ttl_secs: Option<u64>,

    /// How often expired sessions are purged. Default: 300.
    pub sweep_interval_secs: u64,

    /// Explicit path to the pdfium shared library (file or directory).
    pub pdfium_lib_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            budgets: ContextBudgets::default(),
            model: None,
            provider_name: None,
            provider: None,
            temperature: None,
            max_tokens: None,
            llm_timeout_secs: None,
            session_ttl_secs: None,
            sweep_interval_secs: 300,
            pdfium_lib_path: None,
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("budgets", &self.budgets)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("sweep_interval_secs", &self.sweep_interval_secs)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .finish()
    }
}

impl ServerConfig {
    /// Create a new builder for `ServerConfig`.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn budgets(mut self, budgets: ContextBudgets) -> Self {
        self.config.budgets = budgets;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn llm_timeout_secs(mut self, secs: u64) -> Self {
        self.config.llm_timeout_secs = Some(secs);
        self
    }

    pub fn session_ttl_secs(mut self, secs: u64) -> Self {
        self.config.session_ttl_secs = Some(secs);
        self
    }

    pub fn sweep_interval_secs(mut self, secs: u64) -> Self {
        self.config.sweep_interval_secs = secs;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServerConfig, DocQaError> {
        let c = &self.config;
        if c.max_upload_bytes == 0 {
            return Err(DocQaError::InvalidConfig(
                "max_upload_bytes must be ≥ 1".into(),
            ));
        }
        c.budgets.validate()?;
        match c.session_ttl_secs {
            Some(0) => {
                return Err(DocQaError::InvalidConfig(
                    "session TTL must be ≥ 1 second".into(),
                ))
            }
            Some(secs) if secs > MAX_SESSION_TTL_SECS => {
                return Err(DocQaError::InvalidConfig(format!(
                    "session TTL must be ≤ {} seconds, got {}",
                    MAX_SESSION_TTL_SECS, secs
                )))
            }
            _ => {}
        }
        if c.sweep_interval_secs == 0 {
            return Err(DocQaError::InvalidConfig(
                "sweep interval must be ≥ 1 second".into(),
            ));
        }
        if c.llm_timeout_secs == Some(0) {
            return Err(DocQaError::InvalidConfig(
                "LLM timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Character budgets for the document context sent to the model.
///
/// Budgets are counted in characters, not tokens. Roughly four characters
/// per token keeps the multi-document budget near 12k tokens, well inside
/// the context window of every supported model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBudgets {
    /// Summary generated at upload time. Default: 12 000.
    pub summary: usize,
    /// Single-document chat. Default: 24 000.
    pub chat: usize,
    /// Multi-document chat and summary. Default: 48 000.
    pub multi: usize,
}

impl Default for ContextBudgets {
    fn default() -> Self {
        Self {
            summary: 12_000,
            chat: 24_000,
            multi: 48_000,
        }
    }
}

impl ContextBudgets {
    fn validate(&self) -> Result<(), DocQaError> {
        if self.summary == 0 || self.chat == 0 || self.multi == 0 {
            return Err(DocQaError::InvalidConfig(format!(
                "context budgets must be ≥ 1 character, got {:?}",
                self
            )));
        }
        Ok(())
    }
}
