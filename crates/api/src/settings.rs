//! Runtime settings
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! TOML file, then `ALERTDECK_*` environment variables.

use collector::{CollectError, CollectorConfig, Endpoint, DEFAULT_ALERTS_PATH};
use config::{Config, Environment, File, Source};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::Level;

/// Environment variable naming the settings file
pub const CONFIG_PATH_ENV: &str = "ALERTDECK_CONFIG";

/// Settings file read when `ALERTDECK_CONFIG` is unset (optional)
pub const DEFAULT_CONFIG_FILE: &str = "alertdeck.toml";

/// Settings errors, all fatal at startup
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error(transparent)]
    Endpoint(#[from] CollectError),
}

/// Application settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// HTTP bind address
    pub listen_addr: String,
    /// Seconds between refresh cycles (default: 300)
    pub refresh_interval_secs: u64,
    /// Per-source request timeout in seconds (default: 10)
    pub request_timeout_secs: u64,
    /// Alert-manager hosts or base URLs
    pub sources: Vec<String>,
    /// Path and query polled on every source
    pub alerts_path: String,
    /// Cap on simultaneous source requests, 0 for none
    pub max_concurrent_requests: usize,
    /// Keep the previous snapshot when every source fails
    pub retain_on_total_failure: bool,
    /// Silence ledger file
    pub silence_file: PathBuf,
    /// trace, debug, info, warn or error
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
    /// Install the Prometheus recorder and serve `/metrics`
    pub metrics_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8001".to_string(),
            refresh_interval_secs: 300,
            request_timeout_secs: 10,
            sources: Vec::new(),
            alerts_path: DEFAULT_ALERTS_PATH.to_string(),
            max_concurrent_requests: 0,
            retain_on_total_failure: false,
            silence_file: PathBuf::from("silencedAlerts"),
            log_level: "info".to_string(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

impl Settings {
    /// Load from `$ALERTDECK_CONFIG` (or `alertdeck.toml`) and the environment
    pub fn load() -> Result<Self, SettingsError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_sources(File::with_name(&path).required(false), environment())
    }

    /// Build from a file source and an environment source, then validate
    pub fn from_sources<F, E>(file: F, env: E) -> Result<Self, SettingsError>
    where
        F: Source + Send + Sync + 'static,
        E: Source + Send + Sync + 'static,
    {
        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.refresh_interval_secs == 0 {
            return Err(invalid("refresh_interval_secs", "must be greater than zero"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs", "must be greater than zero"));
        }
        self.listen_addr
            .parse::<SocketAddr>()
            .map_err(|e| invalid("listen_addr", e.to_string()))?;
        self.log_level()?;
        for entry in &self.sources {
            Endpoint::parse(entry, &self.alerts_path)?;
        }
        Ok(())
    }

    pub fn log_level(&self) -> Result<Level, SettingsError> {
        self.log_level
            .parse::<Level>()
            .map_err(|e| invalid("log_level", e.to_string()))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            sources: self.sources.clone(),
            alerts_path: self.alerts_path.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_concurrent_requests: self.max_concurrent_requests,
        }
    }
}

/// `ALERTDECK_*` variables, with `ALERTDECK_SOURCES` split on commas
fn environment() -> Environment {
    Environment::with_prefix("ALERTDECK")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("sources")
}

fn invalid(key: &'static str, reason: impl Into<String>) -> SettingsError {
    SettingsError::Invalid {
        key,
        reason: reason.into(),
    }
}
