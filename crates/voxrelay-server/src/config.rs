//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;
use voxrelay_voice::RealtimeSettings;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Upstream provider access.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Defaults for minted realtime sessions.
    #[serde(default)]
    pub realtime: RealtimeSettings,

    /// Translation model settings.
    #[serde(default)]
    pub translation: TranslationConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "voxrelay_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,

    /// Log upstream status and a preview of every upstream body.
    #[serde(default)]
    pub debug: bool,
}

/// Access to the AI provider.
#[derive(Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Provider API key. Requests needing it fail until it is set.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the provider's REST API.
    #[serde(default = "default_upstream_url")]
    pub base_url: String,

    /// Per-request timeout for upstream calls.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Chat-completion settings for the translation gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationConfig {
    #[serde(default = "default_translation_model")]
    pub model: String,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3001
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_upstream_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_translation_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            debug: false,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_upstream_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            model: default_translation_model(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies environment overrides.
///
/// Environment variable overrides:
/// - `VOXRELAY_HOST` overrides `server.host`
/// - `PORT` / `VOXRELAY_PORT` override `server.port` (the latter wins)
/// - `VOXRELAY_CORS_ORIGINS` overrides `server.cors_origins` (comma separated)
/// - `VOXRELAY_LOG_LEVEL` overrides `logging.level`
/// - `VOXRELAY_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `DEBUG` enables `logging.debug` when set to any non-empty value
/// - `OPENAI_API_KEY` overrides `upstream.api_key`
/// - `VOXRELAY_UPSTREAM_URL` overrides `upstream.base_url`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies the overrides documented on [`load_config`] from `lookup`.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(host) = lookup("VOXRELAY_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    for key in ["PORT", "VOXRELAY_PORT"] {
        if let Some(port) = lookup(key) {
            if let Ok(parsed) = port.trim().parse() {
                config.server.port = parsed;
            }
        }
    }
    if let Some(origins) = lookup("VOXRELAY_CORS_ORIGINS") {
        config.server.cors_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(level) = lookup("VOXRELAY_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("VOXRELAY_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if lookup("DEBUG").is_some_and(|value| !value.is_empty()) {
        config.logging.debug = true;
    }
    if let Some(key) = lookup("OPENAI_API_KEY") {
        if !key.trim().is_empty() {
            config.upstream.api_key = Some(key.trim().to_string());
        }
    }
    if let Some(url) = lookup("VOXRELAY_UPSTREAM_URL") {
        config.upstream.base_url = url;
    }
}
