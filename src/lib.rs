//! Aggregation Gateway
//!
//! A demonstration gateway that aggregates JSON responses from several
//! upstream services, tolerating failures via bounded retries and fallback
//! substitution.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod error;
pub mod fallback;
pub mod retry;
pub mod upstream;

pub use error::{AppError, Result};

use aggregate::Aggregator;
use axum::http::StatusCode;

/// Application state shared across all handlers. The gateway status codes
/// are parsed from configuration once here; `Settings::validate` has
/// already constrained them to the valid range.
pub struct AppState {
    pub settings: config::Settings,
    pub aggregator: Aggregator,
    pub degraded_status: StatusCode,
    pub all_failed_status: StatusCode,
}

impl AppState {
    pub fn new(settings: config::Settings, aggregator: Aggregator) -> Result<Self> {
        let degraded_status = parse_status(settings.gateway.degraded_status)?;
        let all_failed_status = parse_status(settings.gateway.all_failed_status)?;
        Ok(Self {
            settings,
            aggregator,
            degraded_status,
            all_failed_status,
        })
    }
}

fn parse_status(code: u16) -> Result<StatusCode> {
    StatusCode::from_u16(code).map_err(|_| {
        AppError::Config(::config::ConfigError::Message(format!(
            "Invalid gateway status code {}",
            code
        )))
    })
}
