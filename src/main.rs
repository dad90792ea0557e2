//! fanout-gateway - WebSocket fan-out server
//!
//! Every message a client sends is delivered to every registered connection.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fanout_gateway::{
    config::{CliOverrides, Config, ConfigManager, StoreBackend},
    GatewayServer, ShutdownCoordinator,
};

/// CLI arguments for fanout-gateway
#[derive(Parser, Debug)]
#[command(name = "fanout-gateway")]
#[command(about = "Real-time WebSocket fan-out gateway")]
#[command(version)]
#[command(long_about = "
Real-time WebSocket fan-out gateway

Clients connect to the WebSocket path; every frame a client sends is pushed,
unmodified, to every connection in the registry (the sender included).

Configuration priority (highest to lowest):
1. Command-line arguments
2. Configuration file
3. Environment variables
4. Built-in defaults

Environment variables:
  FANOUT_BIND_ADDR        - Bind address (e.g., 127.0.0.1:8080)
  FANOUT_MAX_CONNECTIONS  - Maximum concurrent sockets
  FANOUT_STORE_BACKEND    - Connection store backend (memory, file)
  FANOUT_STORE_PATH       - Connection store file (file backend)
  FANOUT_SEND_TIMEOUT     - Per-delivery timeout (e.g., 5s, 250ms)
  FANOUT_LOG_LEVEL        - Log level (trace, debug, info, warn, error)

Log level priority: RUST_LOG > --verbose > --log-level > config/env > info
")]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "gateway.toml", help = "Path to configuration file")]
    pub config: PathBuf,

    /// Bind address (overrides config file)
    #[arg(short, long, help = "Bind address (e.g., 127.0.0.1:8080)")]
    pub bind: Option<String>,

    /// Port to bind to (overrides config file)
    #[arg(short, long, help = "Port to bind to")]
    pub port: Option<u16>,

    /// Connection store backend (overrides config file)
    #[arg(long, value_enum, help = "Connection store backend")]
    pub store_backend: Option<StoreBackendArg>,

    /// Connection store file (overrides config file)
    #[arg(long, help = "Connection store file for the file backend")]
    pub store_path: Option<PathBuf>,

    /// Maximum number of concurrent sockets
    #[arg(long, help = "Maximum number of concurrent sockets")]
    pub max_connections: Option<usize>,

    /// Log level (overrides config file; RUST_LOG overrides this)
    #[arg(long, help = "Log level (trace, debug, info, warn, error)")]
    pub log_level: Option<String>,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration and exit")]
    pub validate_config: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum StoreBackendArg {
    Memory,
    File,
}

impl From<StoreBackendArg> for StoreBackend {
    fn from(arg: StoreBackendArg) -> Self {
        match arg {
            StoreBackendArg::Memory => StoreBackend::Memory,
            StoreBackendArg::File => StoreBackend::File,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Load configuration with priority: CLI args > config file > environment > defaults.
    // Tracing starts once the log level is known, so nothing before it is logged.
    let mut config = if args.config.exists() {
        ConfigManager::load_from_file(&args.config)?
    } else {
        ConfigManager::load_from_env()?
    };

    config.merge_with_cli_args(&CliOverrides {
        bind: args.bind.clone(),
        port: args.port,
        max_connections: args.max_connections,
        store_backend: args.store_backend.map(Into::into),
        store_path: args.store_path.clone(),
        log_level: args.log_level.clone(),
        verbose: args.verbose,
    });

    config
        .validate()
        .context("Final configuration validation failed")?;

    init_tracing(&config)?;
    info!("Starting fanout-gateway v{}", env!("CARGO_PKG_VERSION"));
    info!("Log filter: {}", config.log_filter(std::env::var("RUST_LOG").ok().as_deref()));

    if args.validate_config {
        info!("Configuration is valid");
        info!("  Bind address: {}", config.server.bind_addr);
        info!("  WebSocket path: {}", config.server.ws_path);
        info!("  Max connections: {}", config.server.max_connections);
        info!("  Store backend: {:?}", config.store.backend);
        info!("  Send timeout: {:?}", config.delivery.send_timeout);
        info!("  Prune gone connections: {}", config.delivery.prune_gone);
        info!(
            "  Management API: {}",
            if config.monitoring.management_api { "enabled" } else { "disabled" }
        );
        return Ok(());
    }

    info!("Bind address: {}", config.server.bind_addr);
    info!("Store backend: {:?}", config.store.backend);

    let shutdown_coordinator = ShutdownCoordinator::new(config.server.shutdown_timeout);

    let server = GatewayServer::new(config, shutdown_coordinator.sender()).await?;
    let listener = server.bind().await?;
    let resources = server.state().resources.clone();

    let server_shutdown = shutdown_coordinator.subscribe();
    let mut server_handle = tokio::spawn(async move {
        if let Err(e) = server.serve(listener, server_shutdown).await {
            error!("Server error: {}", e);
        }
    });

    info!("fanout-gateway started, press Ctrl+C or send SIGTERM/SIGINT to stop");

    tokio::select! {
        result = shutdown_coordinator.listen_for_signals() => {
            if let Err(e) = result {
                error!("Error setting up signal handlers: {}", e);
                shutdown_coordinator.trigger();
            }
        }
        _ = &mut server_handle => {
            warn!("Server task exited before a shutdown signal");
            return Ok(());
        }
    }

    info!("Initiating graceful shutdown...");
    shutdown_coordinator.wait_for_drain(&resources).await;

    match tokio::time::timeout(Duration::from_secs(5), server_handle).await {
        Ok(Err(e)) if !e.is_cancelled() => error!("Server task failed: {}", e),
        Err(_) => warn!("Server task did not stop in time"),
        _ => {}
    }

    info!("Gateway shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(config: &Config) -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let env_filter = tracing_subscriber::EnvFilter::try_new(config.log_filter(rust_log.as_deref()))
        .context("Invalid log filter")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true),
        )
        .with(env_filter)
        .init();

    Ok(())
}
