//! Party Bingo - server binary
//!
//! Runs the WebSocket game server or inspects a prompt catalog.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use bingo_board::PromptCatalog;
use bingo_server::{
    AppState, MemoryStore, Rooms, ServerConfig, SessionEngine, SessionStore, SqliteStore, router,
    spawn_timer_loop,
};
use clap::Parser;
use cli::{Cli, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            database,
        } => run_server(config, host, port, database).await,
        Command::Prompts { catalog } => list_prompt_groups(&catalog),
    }
}

/// Run the WebSocket game server
#[instrument(skip_all)]
async fn run_server(
    config_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    database: Option<PathBuf>,
) -> Result<()> {
    let config = match config_path {
        Some(path) => ServerConfig::from_file(&path)?,
        None => ServerConfig::default(),
    }
    .with_overrides(host, port, database);

    let store: Box<dyn SessionStore> = match config.database() {
        Some(path) => Box::new(SqliteStore::open(path.display().to_string())?),
        None => {
            warn!("No database configured, sessions will not survive a restart");
            Box::new(MemoryStore::new())
        }
    };

    let mut engine = SessionEngine::new(store, Rooms::new())
        .with_sync_interval(*config.sync_interval_secs());
    if let Some(seed) = config.rng_seed() {
        engine = engine.with_seed(*seed);
    }
    if let Some(path) = config.prompts() {
        engine = engine.with_catalog(load_catalog(path)?);
    }
    let engine = Arc::new(engine);
    engine.recover()?;

    let _timers = spawn_timer_loop(Arc::clone(&engine), config.tick_interval());
    let app = router(AppState::new(engine));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Server ready at ws://{}/ws", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

#[instrument]
fn load_catalog(path: &Path) -> Result<PromptCatalog> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;
    let catalog = PromptCatalog::from_json(&json)?;
    info!(prompts = catalog.len(), "Prompt catalog loaded");
    Ok(catalog)
}

/// Print the playable groups of a catalog
#[instrument]
fn list_prompt_groups(path: &Path) -> Result<()> {
    let groups = load_catalog(path)?.groups();
    println!("{}", serde_json::to_string_pretty(&groups)?);
    Ok(())
}
