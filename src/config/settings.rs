//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Gateway-level aggregation behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// Overall deadline for one inbound aggregate request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    /// Status returned when some targets failed but others did not
    #[serde(default = "default_degraded_status")]
    pub degraded_status: u16,
    /// Status returned when every target failed
    #[serde(default = "default_all_failed_status")]
    pub all_failed_status: u16,
}

fn default_request_timeout() -> u64 {
    10_000
}

fn default_degraded_status() -> u16 {
    207
}

fn default_all_failed_status() -> u16 {
    502
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout(),
            degraded_status: default_degraded_status(),
            all_failed_status: default_all_failed_status(),
        }
    }
}

/// One upstream target the gateway aggregates
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetConfig {
    pub name: String,
    pub base_url: String,
    #[serde(default = "default_target_path")]
    pub path: String,
    #[serde(default = "default_target_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default)]
    pub backoff: BackoffConfig,
    #[serde(default)]
    pub fallback_enabled: bool,
    #[serde(default)]
    pub fallback_payload: Option<serde_json::Value>,
    /// Serve the last successful payload as the fallback when available
    #[serde(default)]
    pub use_last_known_good: bool,
}

fn default_target_path() -> String {
    "/hello".to_string()
}

fn default_target_timeout() -> u64 {
    5000
}

fn default_max_retries() -> u32 {
    2
}

/// Backoff between retry attempts
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackoffConfig {
    #[serde(default = "default_backoff_kind")]
    pub kind: BackoffKind,
    #[serde(default = "default_backoff_base")]
    pub base_ms: u64,
    #[serde(default = "default_backoff_max")]
    pub max_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    Constant,
    Exponential,
}

fn default_backoff_kind() -> BackoffKind {
    BackoffKind::Exponential
}

fn default_backoff_base() -> u64 {
    200
}

fn default_backoff_max() -> u64 {
    1000
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            kind: default_backoff_kind(),
            base_ms: default_backoff_base(),
            max_ms: default_backoff_max(),
        }
    }
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/default.toml")
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("gateway.request_timeout_ms", 10_000)?
            .set_default("gateway.degraded_status", 207)?
            .set_default("gateway.all_failed_status", 502)?
            // Load from configuration file
            .add_source(File::with_name(path.as_ref().to_str().unwrap_or("config/default")).required(false))
            // Override with environment variables (prefixed with AGG_GATEWAY_)
            .add_source(
                Environment::with_prefix("AGG_GATEWAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "Server port cannot be 0".to_string(),
            )));
        }

        for status in [self.gateway.degraded_status, self.gateway.all_failed_status] {
            if !(100..=599).contains(&status) {
                return Err(AppError::Config(config::ConfigError::Message(format!(
                    "Invalid gateway status code {}",
                    status
                ))));
            }
        }

        if self.targets.is_empty() {
            return Err(AppError::Config(config::ConfigError::Message(
                "At least one target must be configured".to_string(),
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for target in &self.targets {
            if target.name.is_empty() {
                return Err(AppError::Config(config::ConfigError::Message(
                    "Target name cannot be empty".to_string(),
                )));
            }
            if !seen.insert(target.name.as_str()) {
                return Err(AppError::Config(config::ConfigError::Message(format!(
                    "Duplicate target name '{}'",
                    target.name
                ))));
            }
            if target.base_url.is_empty() {
                return Err(AppError::Config(config::ConfigError::Message(format!(
                    "Target '{}' must have a base_url",
                    target.name
                ))));
            }
            if target.backoff.base_ms == 0 || target.backoff.max_ms < target.backoff.base_ms {
                return Err(AppError::Config(config::ConfigError::Message(format!(
                    "Target '{}' has an invalid backoff configuration",
                    target.name
                ))));
            }
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            },
            gateway: GatewayConfig::default(),
            targets: vec![],
        }
    }
}
