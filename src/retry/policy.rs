//! Bounded retry with backoff over a single upstream target

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::upstream::{CallOutcome, UpstreamCall, UpstreamTarget};

/// Final outcome of a retried call plus the number of attempts made.
/// `attempts` never exceeds `max_retries + 1`.
#[derive(Debug)]
pub struct RetryOutcome {
    pub outcome: CallOutcome,
    pub attempts: u32,
}

/// Retry policy for one target. Only transient failures (timeouts,
/// connection errors, 5xx) are retried; 4xx and decode failures are
/// terminal because retrying cannot fix them.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy<'a> {
    target: &'a UpstreamTarget,
}

impl<'a> RetryPolicy<'a> {
    pub fn for_target(target: &'a UpstreamTarget) -> Self {
        Self { target }
    }

    pub async fn call(&self, client: &dyn UpstreamCall) -> RetryOutcome {
        let mut attempts = 0;

        loop {
            attempts += 1;

            let outcome = client.call(self.target).await;
            let kind = match &outcome {
                CallOutcome::Success(_) => return RetryOutcome { outcome, attempts },
                CallOutcome::Failure(kind) => *kind,
            };

            if !kind.is_transient() {
                debug!(
                    target = %self.target.name,
                    failure = %kind,
                    "Failure is terminal, not retrying"
                );
                return RetryOutcome { outcome, attempts };
            }

            if attempts > self.target.max_retries {
                warn!(
                    target = %self.target.name,
                    failure = %kind,
                    attempts,
                    "Retries exhausted"
                );
                return RetryOutcome { outcome, attempts };
            }

            let backoff = self.target.backoff.delay(attempts);
            debug!(
                target = %self.target.name,
                failure = %kind,
                attempt = attempts,
                backoff_ms = backoff.as_millis() as u64,
                "Attempt failed, retrying"
            );
            sleep(backoff).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackoffConfig, BackoffKind, TargetConfig};
    use crate::upstream::FailureKind;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn target(max_retries: u32) -> UpstreamTarget {
        UpstreamTarget::from_config(&TargetConfig {
            name: "test".to_string(),
            base_url: "http://127.0.0.1:8001".to_string(),
            path: "/hello".to_string(),
            timeout_ms: 1000,
            max_retries,
            backoff: BackoffConfig {
                kind: BackoffKind::Constant,
                base_ms: 1,
                max_ms: 1,
            },
            fallback_enabled: false,
            fallback_payload: None,
            use_last_known_good: false,
        })
    }

    /// Test double returning a scripted sequence of outcomes
    struct ScriptedUpstream {
        script: Vec<CallOutcome>,
        calls: AtomicU32,
    }

    impl ScriptedUpstream {
        fn new(script: Vec<CallOutcome>) -> Self {
            Self {
                script,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UpstreamCall for ScriptedUpstream {
        async fn call(&self, _target: &UpstreamTarget) -> CallOutcome {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            self.script
                .get(n)
                .cloned()
                .unwrap_or_else(|| self.script.last().cloned().unwrap())
        }
    }

    #[tokio::test]
    async fn test_success_after_transient_failures() {
        let upstream = ScriptedUpstream::new(vec![
            CallOutcome::Failure(FailureKind::Timeout),
            CallOutcome::Failure(FailureKind::Connection),
            CallOutcome::Success(json!({"msg": "ok"})),
        ]);
        let target = target(3);

        let result = RetryPolicy::for_target(&target).call(&upstream).await;

        assert_eq!(result.outcome, CallOutcome::Success(json!({"msg": "ok"})));
        assert_eq!(result.attempts, 3);
        assert_eq!(upstream.calls(), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_makes_exactly_max_retries_plus_one_calls() {
        let upstream = ScriptedUpstream::new(vec![CallOutcome::Failure(FailureKind::Http(503))]);
        let target = target(2);

        let result = RetryPolicy::for_target(&target).call(&upstream).await;

        assert_eq!(result.outcome, CallOutcome::Failure(FailureKind::Http(503)));
        assert_eq!(result.attempts, 3);
        assert_eq!(upstream.calls(), 3);
    }

    #[tokio::test]
    async fn test_first_attempt_success_calls_once() {
        let upstream = ScriptedUpstream::new(vec![CallOutcome::Success(json!({}))]);
        let target = target(5);

        let result = RetryPolicy::for_target(&target).call(&upstream).await;

        assert_eq!(result.attempts, 1);
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test]
    async fn test_client_error_is_terminal() {
        let upstream = ScriptedUpstream::new(vec![CallOutcome::Failure(FailureKind::Http(404))]);
        let target = target(5);

        let result = RetryPolicy::for_target(&target).call(&upstream).await;

        assert_eq!(result.outcome, CallOutcome::Failure(FailureKind::Http(404)));
        assert_eq!(result.attempts, 1);
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test]
    async fn test_decode_error_is_terminal() {
        let upstream = ScriptedUpstream::new(vec![CallOutcome::Failure(FailureKind::Decode)]);
        let target = target(5);

        let result = RetryPolicy::for_target(&target).call(&upstream).await;

        assert_eq!(result.attempts, 1);
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let upstream = ScriptedUpstream::new(vec![CallOutcome::Failure(FailureKind::Timeout)]);
        let target = target(0);

        let result = RetryPolicy::for_target(&target).call(&upstream).await;

        assert_eq!(result.attempts, 1);
        assert_eq!(upstream.calls(), 1);
    }
}
