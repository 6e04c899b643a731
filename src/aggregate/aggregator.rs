//! Fan-out orchestration over all configured targets

use axum::http::StatusCode;
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::aggregate::{AggregateResult, TargetReport, TargetStatus};
use crate::fallback::FallbackResolver;
use crate::retry::RetryPolicy;
use crate::upstream::{CallOutcome, UpstreamCall, UpstreamTarget};

/// Orchestrates one aggregate request: one concurrent task per target,
/// retry policy applied to each, fallback substitution on exhaustion.
/// Failures are contained per target and surfaced as data, never as a
/// request-level error.
pub struct Aggregator {
    client: Arc<dyn UpstreamCall>,
    fallback: Arc<FallbackResolver>,
    targets: Vec<UpstreamTarget>,
    request_timeout: Duration,
}

impl Aggregator {
    pub fn new(
        client: Arc<dyn UpstreamCall>,
        fallback: Arc<FallbackResolver>,
        targets: Vec<UpstreamTarget>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client,
            fallback,
            targets,
            request_timeout,
        }
    }

    /// Run all targets concurrently and merge their reports by name.
    /// The result always contains exactly one entry per configured target.
    pub async fn aggregate(&self) -> AggregateResult {
        let tasks: Vec<_> = self
            .targets
            .iter()
            .map(|target| {
                let client = self.client.clone();
                let fallback = self.fallback.clone();
                let target = target.clone();
                let deadline = self.request_timeout;

                tokio::spawn(async move {
                    match timeout(deadline, run_target(client.as_ref(), &fallback, &target)).await {
                        Ok(report) => report,
                        Err(_) => {
                            warn!(
                                target = %target.name,
                                "Gateway deadline elapsed, abandoning call"
                            );
                            TargetReport {
                                status: TargetStatus::Failed,
                                payload: Value::Null,
                                attempts: 0,
                            }
                        }
                    }
                })
            })
            .collect();

        let mut result = AggregateResult::new();
        for (target, joined) in self.targets.iter().zip(join_all(tasks).await) {
            let report = match joined {
                Ok(report) => report,
                Err(e) => {
                    warn!(target = %target.name, error = %e, "Aggregate task failed to join");
                    TargetReport {
                        status: TargetStatus::Failed,
                        payload: Value::Null,
                        attempts: 0,
                    }
                }
            };
            result.insert(target.name.clone(), report);
        }

        result
    }
}

async fn run_target(
    client: &dyn UpstreamCall,
    fallback: &FallbackResolver,
    target: &UpstreamTarget,
) -> TargetReport {
    let retried = RetryPolicy::for_target(target).call(client).await;

    match retried.outcome {
        CallOutcome::Success(payload) => {
            debug!(target = %target.name, attempts = retried.attempts, "Target succeeded");
            fallback.record_success(&target.name, &payload);
            TargetReport {
                status: TargetStatus::Ok,
                payload,
                attempts: retried.attempts,
            }
        }
        CallOutcome::Failure(kind) => {
            warn!(
                target = %target.name,
                failure = %kind,
                attempts = retried.attempts,
                "Target exhausted"
            );
            match fallback.resolve(target) {
                Some(payload) => TargetReport {
                    status: TargetStatus::Fallback,
                    payload,
                    attempts: retried.attempts,
                },
                None => TargetReport {
                    status: TargetStatus::Failed,
                    payload: Value::Null,
                    attempts: retried.attempts,
                },
            }
        }
    }
}

/// Three-tier status policy: 200 when every target is ok or substituted,
/// the degraded code when only some targets failed, the all-failed code
/// when none produced a usable payload.
pub fn overall_status(
    result: &AggregateResult,
    degraded: StatusCode,
    all_failed: StatusCode,
) -> StatusCode {
    let failed = result
        .values()
        .filter(|r| r.status == TargetStatus::Failed)
        .count();

    if failed == 0 {
        StatusCode::OK
    } else if failed == result.len() {
        all_failed
    } else {
        degraded
    }
}
