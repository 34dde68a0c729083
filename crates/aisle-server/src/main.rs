//! Aisle server - streams planner assistant answers over HTTP
//!
//! Loads the TOML configuration, applies command line overrides, wires the
//! model client, planner data and agent loop together, and serves the
//! assistant endpoint.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use aisle_core::backend::{Fixtures, MemoryBackend, ModelCoupleParser};
use aisle_core::config::{Config, ConfigManager};
use aisle_core::prompt::DEFAULT_SYSTEM_PROMPT;
use aisle_core::provider::{GenAIClient, LlmClient, ProviderType};
use aisle_core::session::AgentLoop;
use aisle_core::tools::ToolDispatcher;
use aisle_server::{AppState, router};

#[derive(Parser)]
#[command(name = "aisle-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Planner assistant streaming server", long_about = None)]
struct Cli {
    /// Config file (defaults to <config dir>/aisle/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:8787
    #[arg(short, long)]
    bind: Option<String>,

    /// LLM Provider (anthropic, openai, gemini, etc.) - defaults to config setting
    #[arg(short, long)]
    provider: Option<String>,

    /// Model to use (defaults to provider's default)
    #[arg(short, long)]
    model: Option<String>,

    /// JSON file with planner data
    #[arg(long)]
    fixtures: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    }
    .context("failed to load configuration")?;
    info!(path = %manager.config_path().display(), "Loaded configuration");

    let mut config = manager.into_config();
    apply_overrides(&mut config, &cli);

    let client = build_client(&config)?;
    let backend = build_backend(&config, client.clone())?;

    let agent = AgentLoop::new(client, ToolDispatcher::new(Arc::new(backend)))
        .with_max_iterations(config.assistant.max_iterations);

    let secret = config.server.get_secret().ok_or_else(|| {
        anyhow!(
            "no assistant secret configured; set [server] secret or ${}",
            config.server.secret_env.as_deref().unwrap_or("AISLE_ASSISTANT_SECRET")
        )
    })?;

    let state = AppState::new(agent)
        .with_secret(Some(secret))
        .with_prompt_base(
            config
                .assistant
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        )
        .with_event_buffer(config.assistant.event_buffer);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    info!(bind = %config.server.bind, "Assistant server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "info,aisle_core=debug,aisle_server=debug"
        } else {
            "info"
        })
    });

    let Some(path) = log_file else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("invalid log file path: {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(bind) = &cli.bind {
        config.server.bind = bind.clone();
    }
    if let Some(provider) = &cli.provider
        && provider != &config.provider.provider_type
    {
        // A different provider invalidates the configured model and key variable
        config.provider.provider_type = provider.clone();
        config.provider.api_key = None;
        config.provider.api_key_env = None;
        if let Ok(provider_type) = provider.parse::<ProviderType>() {
            config.provider.model = provider_type.default_model().to_string();
        }
    }
    if let Some(model) = &cli.model {
        config.provider.model = model.clone();
    }
    if let Some(fixtures) = &cli.fixtures {
        config.data.fixtures = Some(fixtures.clone());
    }
}

fn build_client(config: &Config) -> anyhow::Result<Arc<dyn LlmClient>> {
    let provider_type: ProviderType = config
        .provider
        .provider_type
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let model = Some(config.provider.model.as_str()).filter(|m| !m.is_empty());

    let client = match config.provider.get_api_key() {
        Some(key) => GenAIClient::with_api_key(provider_type, &key, model),
        None => {
            if provider_type != ProviderType::Ollama {
                warn!(provider = %provider_type, "No API key configured; relying on provider defaults");
            }
            GenAIClient::new(provider_type, model)
        }
    };
    info!(provider = %provider_type, model = %client.model(), "Using language model");
    Ok(Arc::new(client))
}

fn build_backend(config: &Config, client: Arc<dyn LlmClient>) -> anyhow::Result<MemoryBackend> {
    let backend = match &config.data.fixtures {
        Some(path) => MemoryBackend::from_path(path)
            .with_context(|| format!("failed to load fixtures from {}", path.display()))?,
        None => {
            warn!("No planner fixtures configured; starting with an empty data set");
            MemoryBackend::new(Fixtures::default())
        }
    };
    Ok(backend.with_parser(ModelCoupleParser::new(client)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
