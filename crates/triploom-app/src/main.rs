//! TripLoom backend binary - composition root.
//!
//! 1. Resolve configuration (file, environment, CLI flags)
//! 2. Open the selected repository (in-memory or SQLite)
//! 3. Build the model and bridge clients and the chat orchestrator
//! 4. Serve the axum API until Ctrl-C

mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use triploom_api::{start_server, AppState, AuthMode};
use triploom_chat::{ChatOrchestrator, HttpBridgeClient, ModelSelector, OpenAiClient};
use triploom_core::TriploomConfig;
use triploom_storage::{AiRepository, Database, InMemoryRepository, SqliteRepository};

use cli::CliArgs;

/// Expand ~ to home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if data_dir.starts_with("~/") || data_dir.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&data_dir[2..])
    } else {
        PathBuf::from(data_dir)
    }
}

fn open_repository(
    config: &TriploomConfig,
) -> Result<Arc<dyn AiRepository>, Box<dyn std::error::Error>> {
    match config.storage.backend.as_str() {
        "sqlite" => {
            let db_path = resolve_data_dir(&config.general.data_dir).join(&config.storage.db_file);
            let db = Database::new(&db_path)?;
            Ok(Arc::new(SqliteRepository::new(Arc::new(db))))
        }
        _ => Ok(Arc::new(InMemoryRepository::new())),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        return;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = TriploomConfig::load_or_default(&config_file);
    config.apply_env_overrides();
    args.apply_to(&mut config);

    // Tracing. RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting TripLoom v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    // Storage.
    let repo = open_repository(&config)?;
    tracing::info!(mode = repo.mode(), "AI repository ready");

    // Providers.
    let model = Arc::new(OpenAiClient::from_config(&config.model)?);
    let bridge = Arc::new(HttpBridgeClient::from_config(&config.bridge)?);
    let selector = ModelSelector::new(config.model.default_model.clone());
    tracing::info!(
        model = %config.model.default_model,
        bridge = %config.bridge.base_url,
        "Providers configured"
    );

    let orchestrator = ChatOrchestrator::new(repo, model, bridge, selector);
    let state = AppState::new(
        orchestrator,
        AuthMode::from_config(&config.auth),
        config.allowed_origins(),
    );
    tracing::info!(auth_mode = %config.auth.mode, "Authentication configured");

    // API server.
    start_server(&config, state, shutdown_signal()).await?;

    tracing::info!("TripLoom stopped");
    Ok(())
}
