//! Configuration Manager

use super::{Config, StoreBackend};
use crate::Result;
use anyhow::{bail, Context};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Manages configuration loading and validation
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Config> {
        if path.exists() {
            tracing::info!("Loading configuration from: {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

            config.validate()
                .with_context(|| "Configuration validation failed")?;

            tracing::info!("Configuration loaded and validated successfully");
            Ok(config)
        } else {
            tracing::warn!("Configuration file not found at {}, using defaults", path.display());
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from environment variables
    pub fn load_from_env() -> Result<Config> {
        let mut config = Config::default();
        Self::apply_env(&mut config, |key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `FANOUT_*` overrides using `lookup` to read variables
    pub fn apply_env<F>(config: &mut Config, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind_addr) = lookup("FANOUT_BIND_ADDR") {
            config.server.bind_addr = bind_addr.parse::<SocketAddr>()
                .with_context(|| format!("Invalid FANOUT_BIND_ADDR: {}", bind_addr))?;
        }

        if let Some(max_conn) = lookup("FANOUT_MAX_CONNECTIONS") {
            config.server.max_connections = max_conn.parse::<usize>()
                .with_context(|| format!("Invalid FANOUT_MAX_CONNECTIONS: {}", max_conn))?;
        }

        if let Some(backend) = lookup("FANOUT_STORE_BACKEND") {
            config.store.backend = backend.parse::<StoreBackend>()
                .with_context(|| format!("Invalid FANOUT_STORE_BACKEND: {}", backend))?;
        }

        if let Some(path) = lookup("FANOUT_STORE_PATH") {
            config.store.path = Some(PathBuf::from(path));
        }

        if let Some(timeout) = lookup("FANOUT_SEND_TIMEOUT") {
            config.delivery.send_timeout = humantime::parse_duration(&timeout)
                .with_context(|| format!("Invalid FANOUT_SEND_TIMEOUT: {}", timeout))?;
        }

        if let Some(log_level) = lookup("FANOUT_LOG_LEVEL") {
            config.monitoring.log_level = log_level.to_ascii_lowercase();
        }

        Ok(())
    }
}

/// Values supplied on the command line, applied last
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub max_connections: Option<usize>,
    pub store_backend: Option<StoreBackend>,
    pub store_path: Option<PathBuf>,
    /// Explicit `--log-level`; `None` keeps the configured level
    pub log_level: Option<String>,
    /// `--verbose`, forces `debug` over any other level
    pub verbose: bool,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.validate_server_config()
            .with_context(|| "Server configuration validation failed")?;

        self.validate_store_config()
            .with_context(|| "Store configuration validation failed")?;

        self.validate_delivery_config()
            .with_context(|| "Delivery configuration validation failed")?;

        self.validate_monitoring_config()
            .with_context(|| "Monitoring configuration validation failed")?;

        Ok(())
    }

    fn validate_server_config(&self) -> Result<()> {
        if self.server.max_connections == 0 {
            bail!("max_connections must be greater than 0");
        }

        if self.server.max_connections > 1_000_000 {
            bail!("max_connections cannot exceed 1,000,000");
        }

        if !self.server.ws_path.starts_with('/') {
            bail!("ws_path must start with '/'");
        }

        if self.server.max_message_size < 1024 {
            bail!("max_message_size must be at least 1024 bytes");
        }

        if self.server.max_message_size > 16 * 1024 * 1024 {
            bail!("max_message_size cannot exceed 16MB");
        }

        Ok(())
    }

    fn validate_store_config(&self) -> Result<()> {
        if self.store.backend == StoreBackend::File && self.store.path.is_none() {
            bail!("store.path is required when store.backend is 'file'");
        }

        Ok(())
    }

    fn validate_delivery_config(&self) -> Result<()> {
        if self.delivery.send_timeout.is_zero() {
            bail!("send_timeout must be greater than 0");
        }

        if self.delivery.send_timeout.as_secs() > 300 {
            bail!("send_timeout cannot exceed 5 minutes");
        }

        if self.delivery.channel_capacity == 0 {
            bail!("channel_capacity must be greater than 0");
        }

        Ok(())
    }

    fn validate_monitoring_config(&self) -> Result<()> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.monitoring.log_level.as_str()) {
            bail!("monitoring.log_level must be one of: {}", valid_log_levels.join(", "));
        }

        Ok(())
    }

    /// Merge with CLI arguments
    pub fn merge_with_cli_args(&mut self, overrides: &CliOverrides) {
        if let Some(bind_str) = overrides.bind.as_deref() {
            if let Ok(addr) = bind_str.parse::<SocketAddr>() {
                self.server.bind_addr = addr;
                tracing::info!("CLI override: bind address set to {}", addr);
            } else {
                tracing::warn!("Invalid bind address provided: {}", bind_str);
            }
        }

        if let Some(port) = overrides.port {
            self.server.bind_addr.set_port(port);
            tracing::info!("CLI override: port set to {}", port);
        }

        if let Some(max_conn) = overrides.max_connections {
            self.server.max_connections = max_conn;
            tracing::info!("CLI override: max connections set to {}", max_conn);
        }

        if let Some(backend) = overrides.store_backend {
            self.store.backend = backend;
            tracing::info!("CLI override: store backend set to {:?}", backend);
        }

        if let Some(path) = &overrides.store_path {
            self.store.path = Some(path.clone());
            tracing::info!("CLI override: store path set to {}", path.display());
        }

        if overrides.verbose {
            self.monitoring.log_level = "debug".to_string();
        } else if let Some(level) = &overrides.log_level {
            self.monitoring.log_level = level.to_ascii_lowercase();
        }
    }

    /// Filter directive for the tracing subscriber. `RUST_LOG` wins when set.
    pub fn log_filter(&self, rust_log: Option<&str>) -> String {
        match rust_log {
            Some(directive) if !directive.trim().is_empty() => directive.to_string(),
            _ => self.monitoring.log_level.clone(),
        }
    }
}
