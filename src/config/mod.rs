//! Configuration loading and validation

mod settings;

pub use settings::{
    BackoffConfig, BackoffKind, GatewayConfig, LoggingConfig, ServerConfig, Settings, TargetConfig,
};
