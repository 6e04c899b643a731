//! Single-attempt HTTP client for upstream calls

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::Result;
use crate::upstream::{CallOutcome, FailureKind, UpstreamTarget};

/// One call attempt against an upstream. Implementations never retry and
/// never raise past their own boundary; every outcome is a [`CallOutcome`].
#[async_trait]
pub trait UpstreamCall: Send + Sync {
    async fn call(&self, target: &UpstreamTarget) -> CallOutcome;
}

/// Reqwest-backed upstream client
pub struct UpstreamClient {
    client: Client,
}

impl UpstreamClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UpstreamCall for UpstreamClient {
    async fn call(&self, target: &UpstreamTarget) -> CallOutcome {
        let url = target.url();
        debug!(target = %target.name, url = %url, "Calling upstream");

        let response = match self
            .client
            .get(&url)
            .timeout(target.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return CallOutcome::Failure(FailureKind::Timeout),
            Err(e) if e.is_connect() => return CallOutcome::Failure(FailureKind::Connection),
            Err(_) => return CallOutcome::Failure(FailureKind::Connection),
        };

        let status = response.status();
        if status.as_u16() >= 400 {
            debug!(target = %target.name, status = %status, "Upstream returned error status");
            return CallOutcome::Failure(FailureKind::Http(status.as_u16()));
        }

        match response.json::<serde_json::Value>().await {
            Ok(payload) => CallOutcome::Success(payload),
            Err(e) if e.is_timeout() => CallOutcome::Failure(FailureKind::Timeout),
            Err(_) => CallOutcome::Failure(FailureKind::Decode),
        }
    }
}
