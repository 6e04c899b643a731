//! Immutable description of one upstream target

use rand::Rng;
use std::time::Duration;

use crate::config::{BackoffKind, TargetConfig};

/// One upstream the gateway aggregates. Built once from configuration at
/// startup and shared read-only across requests.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    pub name: String,
    pub base_url: String,
    pub path: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff: Backoff,
    pub fallback: FallbackSpec,
}

/// Backoff schedule between retry attempts
#[derive(Debug, Clone)]
pub enum Backoff {
    Constant(Duration),
    Exponential { base: Duration, max: Duration },
}

/// Fallback behavior for a target whose retries exhaust
#[derive(Debug, Clone)]
pub struct FallbackSpec {
    pub enabled: bool,
    pub payload: Option<serde_json::Value>,
    pub use_last_known_good: bool,
}

impl UpstreamTarget {
    pub fn from_config(config: &TargetConfig) -> Self {
        let backoff = match config.backoff.kind {
            BackoffKind::Constant => Backoff::Constant(Duration::from_millis(config.backoff.base_ms)),
            BackoffKind::Exponential => Backoff::Exponential {
                base: Duration::from_millis(config.backoff.base_ms),
                max: Duration::from_millis(config.backoff.max_ms),
            },
        };

        Self {
            name: config.name.clone(),
            base_url: config.base_url.clone(),
            path: config.path.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
            max_retries: config.max_retries,
            backoff,
            fallback: FallbackSpec {
                enabled: config.fallback_enabled,
                payload: config.fallback_payload.clone(),
                use_last_known_good: config.use_last_known_good,
            },
        }
    }

    /// Full URL for this target's aggregate path
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.path)
    }
}

impl Backoff {
    /// Delay before the attempt following `attempt` (1-based count of
    /// attempts made so far).
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Constant(base) => *base,
            Backoff::Exponential { base, max } => {
                let base_ms = base.as_millis() as u64;
                let max_ms = max.as_millis() as u64;

                // base * 2^(attempt - 1), capped at max
                let exponential =
                    base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
                let capped = exponential.min(max_ms);

                // Add jitter (0-25% of the calculated backoff)
                let jitter = (capped as f64 * rand::thread_rng().gen::<f64>() * 0.25) as u64;

                Duration::from_millis(capped + jitter)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_backoff_is_flat() {
        let backoff = Backoff::Constant(Duration::from_millis(100));
        assert_eq!(backoff.delay(1), Duration::from_millis(100));
        assert_eq!(backoff.delay(5), Duration::from_millis(100));
    }

    #[test]
    fn test_exponential_backoff_grows_and_caps() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_millis(400),
        };

        let first = backoff.delay(1).as_millis() as u64;
        assert!((100..=125).contains(&first), "got {}", first);

        let second = backoff.delay(2).as_millis() as u64;
        assert!((200..=250).contains(&second), "got {}", second);

        // 100 * 2^4 = 1600, capped at 400 plus jitter
        let capped = backoff.delay(5).as_millis() as u64;
        assert!((400..=500).contains(&capped), "got {}", capped);
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let config = crate::config::TargetConfig {
            name: "a".to_string(),
            base_url: "http://127.0.0.1:8001/".to_string(),
            path: "/hello".to_string(),
            timeout_ms: 1000,
            max_retries: 2,
            backoff: crate::config::BackoffConfig::default(),
            fallback_enabled: false,
            fallback_payload: None,
            use_last_known_good: false,
        };
        let target = UpstreamTarget::from_config(&config);
        assert_eq!(target.url(), "http://127.0.0.1:8001/hello");
    }
}
