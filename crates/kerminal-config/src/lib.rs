//! Configuration for kerminal.
//!
//! A TOML file under the platform config directory, overridden by
//! `KERMINAL_*` environment variables, translated into
//! `kerminal_core::SessionConfig`. Nested keys use a double underscore in
//! the environment: `KERMINAL_DATA_LOG__FILE=flight.csv`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use kerminal_core::SessionConfig;
use kerminal_core::config::{DEFAULT_DATA_LOG_FILE, DEFAULT_DELIMITER, DEFAULT_PORT};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Telemachus server host used by `--connect` and as the `connect`
    /// command's suggestion.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Update interval requested from the server, in milliseconds.
    #[serde(default = "default_rate_ms")]
    pub rate_ms: Option<u32>,

    /// Outbound flush interval of the network thread.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// UI refresh interval.
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,

    /// Bound on the WebSocket handshake.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: Option<u64>,

    /// Variables counted locally but never sent to the server.
    #[serde(default = "default_no_transmit")]
    pub no_transmit: Vec<String>,

    #[serde(default)]
    pub data_log: DataLogSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            rate_ms: default_rate_ms(),
            tick_ms: default_tick_ms(),
            poll_ms: default_poll_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
            no_transmit: default_no_transmit(),
            data_log: DataLogSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DataLogSettings {
    #[serde(default = "default_data_log_file")]
    pub file: PathBuf,

    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

impl Default for DataLogSettings {
    fn default() -> Self {
        Self {
            file: default_data_log_file(),
            delimiter: default_delimiter(),
        }
    }
}

fn default_host() -> String {
    "localhost".into()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
#[allow(clippy::unnecessary_wraps)]
fn default_rate_ms() -> Option<u32> {
    Some(2000)
}
fn default_tick_ms() -> u64 {
    100
}
fn default_poll_ms() -> u64 {
    1000
}
#[allow(clippy::unnecessary_wraps)]
fn default_connect_timeout_secs() -> Option<u64> {
    Some(10)
}
fn default_no_transmit() -> Vec<String> {
    vec!["sys.time".into()]
}
fn default_data_log_file() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_LOG_FILE)
}
fn default_delimiter() -> String {
    DEFAULT_DELIMITER.into()
}

impl Config {
    /// Validate and translate into the core's session settings.
    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        if self.port == 0 {
            return Err(validation("port", "must be between 1 and 65535"));
        }
        if self.tick_ms == 0 {
            return Err(validation("tick_ms", "must be at least 1"));
        }
        if self.rate_ms == Some(0) {
            return Err(validation("rate_ms", "must be at least 1"));
        }
        if self.data_log.delimiter.is_empty() {
            return Err(validation("data_log.delimiter", "must not be empty"));
        }

        Ok(SessionConfig {
            rate_ms: self.rate_ms,
            tick: Duration::from_millis(self.tick_ms),
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs),
            no_transmit: self.no_transmit.clone(),
            data_log_file: self.data_log.file.clone(),
            data_log_delimiter: self.data_log.delimiter.clone(),
        })
    }

    /// UI refresh interval, never below 10 ms.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(10))
    }
}

fn validation(field: &str, reason: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "kerminal", "kerminal").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("kerminal");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Defaults, then the TOML file at `path`, then the environment.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("KERMINAL_").split("__"))
}

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from a specific file + environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    Ok(figment(path).extract()?)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
