//! skills-dash - Manpower & Skills Matrix dashboard service
//!
//! Serves the dashboard API on localhost and talks to the skills backend.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use skills_common::config::{DashboardConfig, RootFolderInitializer, RootFolderResolver};
use skills_dash::backend::HttpBackend;
use skills_dash::session::SessionManager;
use skills_dash::{build_router, AppState};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

/// Level used until the config file has been read
const STARTUP_LOG_LEVEL: &str = "info";

type FilterHandle = reload::Handle<EnvFilter, Registry>;

#[derive(Parser, Debug)]
#[command(name = "skills-dash")]
#[command(about = "Manpower & Skills Matrix dashboard service")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "SKILLS_DASH_PORT")]
    port: Option<u16>,

    /// Base URL of the skills backend API (overrides config file)
    #[arg(short, long, env = "SKILLS_BACKEND_URL")]
    backend_url: Option<String>,

    /// Folder for the persisted session
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Path to the TOML config file
    #[arg(short, long, env = "SKILLS_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let (filter, filter_handle) = reload::Layer::new(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(STARTUP_LOG_LEVEL)),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => DashboardConfig::load(path),
        None => DashboardConfig::load_default(),
    }
    .context("Failed to load configuration")?;

    let env_override = std::env::var_os(EnvFilter::DEFAULT_ENV).is_some();
    apply_config_level(&filter_handle, &config.logging.level, env_override);

    info!(
        "Starting skills-dash v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = RootFolderResolver::new()
        .with_config(&config)
        .with_cli_arg(args.root_folder.clone())
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;
    info!("Root folder: {}", initializer.root().display());

    let backend_url = args.backend_url.unwrap_or(config.backend_url.clone());
    let backend = HttpBackend::new(backend_url, config.request_timeout())
        .context("Failed to create backend client")?;
    info!("Skills backend: {}", backend.base_url());

    let session = SessionManager::init(initializer.session_path());
    let state = AppState::new(Arc::new(backend), session, config.export_timeout());

    if state.session.current().await.is_some() {
        match state.store.refresh().await {
            Ok(records) => info!("Loaded {} records", records.len()),
            Err(e) => warn!("Initial record load failed: {}", e),
        }
    }

    let app = build_router(state);

    let port = args.port.unwrap_or(config.port);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("skills-dash listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Switch to the configured log level unless RUST_LOG already set one
fn apply_config_level(handle: &FilterHandle, level: &str, env_override: bool) {
    if env_override {
        return;
    }
    match EnvFilter::try_new(level) {
        Ok(filter) => {
            if let Err(e) = handle.reload(filter) {
                warn!("Failed to apply log level {:?}: {}", level, e);
            }
        }
        Err(e) => warn!("Invalid log level {:?} in config: {}", level, e),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
