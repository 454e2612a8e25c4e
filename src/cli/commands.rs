//! CLI command implementations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use super::args::{Command, SeedAction};
use super::errors::{CliError, CliResult};
use crate::config::{load_env_file, AppConfig};
use crate::http_server::{AppState, HttpServer};
use crate::observability::setup_tracing;
use crate::seed::{delete_all, SeedReport, Seeder};
use crate::store::StoreName;

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    setup_tracing();
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::server_failed(format!("Failed to create tokio runtime: {}", e)))?;

    match cmd {
        Command::Serve { env_file, port } => rt.block_on(serve(env_file.as_deref(), port)),
        Command::Seed { action, env_file } => rt.block_on(seed(env_file.as_deref(), action)).map(|_| ()),
    }
}

fn load_config(env_file: Option<&Path>) -> CliResult<AppConfig> {
    load_env_file(env_file)?;
    Ok(AppConfig::from_env()?)
}

/// Connect the primary store, then serve until ctrl-c.
///
/// The offline store is optional: a failed connect is logged and dual
/// dispatch reports it per request.
pub async fn serve(env_file: Option<&Path>, port: Option<u16>) -> CliResult<()> {
    let mut config = load_config(env_file)?;
    if let Some(port) = port {
        config.server.port = port;
    }

    let state = AppState::new(&config);
    let provider = state.coordinator.provider();
    provider.handle(StoreName::Cloud).await?;
    if provider.is_configured(StoreName::Offline) {
        if let Err(e) = provider.handle(StoreName::Offline).await {
            warn!(error = %e, "offline store unavailable at startup");
        }
    }

    info!(env = ?config.env, "starting bootcamp API");
    HttpServer::new(config.server.clone(), Arc::new(state))
        .start()
        .await
        .map_err(|e| CliError::server_failed(format!("HTTP server failed: {}", e)))
}

/// Import or delete sample data in the primary store
pub async fn seed(env_file: Option<&Path>, action: SeedAction) -> CliResult<SeedReport> {
    let config = load_config(env_file)?;
    let state = AppState::new(&config);
    let store = state.coordinator.provider().handle(StoreName::Cloud).await?;

    let report = match action {
        SeedAction::Import { data_dir } => {
            let dir: PathBuf = data_dir.unwrap_or_else(|| config.seed_dir.clone());
            let report = Seeder::new(dir, state.geocoder.as_ref()).import(&store).await?;
            info!(?report, "data imported");
            report
        }
        SeedAction::Delete => {
            let report = delete_all(&store).await?;
            info!(?report, "data destroyed");
            report
        }
    };
    Ok(report)
}
