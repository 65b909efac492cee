//! Server binary for docqa.
//!
//! A thin shim over the library crate that maps CLI flags and environment
//! variables to `ServerConfig`, installs logging and serves the router.

use anyhow::{Context, Result};
use clap::Parser;
use docqa::{build_router, spawn_sweeper, AppState, ContextBudgets, ServerConfig};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on the default port (8000), provider auto-detected
  docqa

  # Use a specific provider and model
  docqa --provider gemini --model gemini-2.5-flash

  # Expire sessions after one hour
  docqa --session-ttl 3600

ENDPOINTS:
  POST   /upload           multipart field "file" (application/pdf, ≤ 50 MiB)
  POST   /chat             {"session_id", "question"}
  POST   /chat-multi       {"session_ids": [...], "question"}
  POST   /summary-multi    {"session_ids": [...]}
  DELETE /sessions/:id
  GET    /health

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Log filter, e.g. docqa=debug,tower_http=debug

A .env file in the working directory is loaded before flags are parsed.
"#;

/// Document Q&A server: upload PDFs, ask questions, get summaries.
#[derive(Parser, Debug)]
#[command(
    name = "docqa",
    version,
    about = "Ask questions about uploaded PDF documents through a hosted LLM",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Interface to bind.
    #[arg(long, env = "DOCQA_HOST", default_value = "0.0.0.0")]
    host: String,

    /// TCP port.
    #[arg(short, long, env = "DOCQA_PORT", default_value_t = 8000)]
    port: u16,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM model ID (e.g. gemini-2.5-flash, gpt-4.1-mini).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM temperature (0.0–2.0). Provider default when unset.
    #[arg(long, env = "DOCQA_TEMPERATURE")]
    temperature: Option<f32>,

    /// Max LLM output tokens per reply. Provider default when unset.
    #[arg(long, env = "DOCQA_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// Per-call LLM timeout in seconds. No local timeout when unset.
    #[arg(long, env = "DOCQA_LLM_TIMEOUT")]
    llm_timeout: Option<u64>,

    /// Maximum upload size in bytes.
    #[arg(long, env = "DOCQA_MAX_UPLOAD_BYTES", default_value_t = docqa::config::DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,

    /// Character budget for the upload summary.
    #[arg(long, env = "DOCQA_SUMMARY_BUDGET", default_value_t = 12_000)]
    summary_budget: usize,

    /// Character budget for single-document chat.
    #[arg(long, env = "DOCQA_CHAT_BUDGET", default_value_t = 24_000)]
    chat_budget: usize,

    /// Character budget for multi-document chat and summary.
    #[arg(long, env = "DOCQA_MULTI_BUDGET", default_value_t = 48_000)]
    multi_budget: usize,

    /// Session lifetime in seconds. Sessions live until deleted when unset.
    #[arg(long, env = "DOCQA_SESSION_TTL")]
    session_ttl: Option<u64>,

    /// How often expired sessions are purged, in seconds.
    #[arg(long, env = "DOCQA_SWEEP_INTERVAL", default_value_t = 300)]
    sweep_interval: u64,

    /// Path to libpdfium (file or directory).
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCQA_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCQA_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env first so clap's `env = ...` fallbacks can see its values.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "docqa=debug,tower_http=debug"
    } else {
        "docqa=info,tower_http=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config & state ─────────────────────────────────────────────
    let config = build_config(&cli)?;
    tracing::info!("Starting docqa v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("{:?}", config);

    let state = AppState::from_config(&config).context("Failed to initialise LLM provider")?;

    let sweeper = config.session_ttl_secs.map(|ttl| {
        tracing::info!(
            "Sessions expire after {}s (sweep every {}s)",
            ttl,
            config.sweep_interval_secs
        );
        spawn_sweeper(
            Arc::clone(state.service().store()),
            Duration::from_secs(config.sweep_interval_secs),
        )
    });

    let app = build_router(state);

    // ── Serve ────────────────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    tracing::info!("docqa listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Map CLI args to `ServerConfig`.
fn build_config(cli: &Cli) -> Result<ServerConfig> {
    let mut builder = ServerConfig::builder()
        .host(cli.host.clone())
        .port(cli.port)
        .max_upload_bytes(cli.max_upload_bytes)
        .budgets(ContextBudgets {
            summary: cli.summary_budget,
            chat: cli.chat_budget,
            multi: cli.multi_budget,
        })
        .sweep_interval_secs(cli.sweep_interval);

    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }
    if let Some(n) = cli.max_tokens {
        builder = builder.max_tokens(n);
    }
    if let Some(secs) = cli.llm_timeout {
        builder = builder.llm_timeout_secs(secs);
    }
    if let Some(secs) = cli.session_ttl {
        builder = builder.session_ttl_secs(secs);
    }
    if let Some(ref path) = cli.pdfium_lib_path {
        builder = builder.pdfium_lib_path(path);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.as_str());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.as_str());
    }

    builder.build().context("Invalid configuration")
}

/// Resolve when Ctrl+C or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, starting graceful shutdown..."),
        _ = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown..."),
    }
}
