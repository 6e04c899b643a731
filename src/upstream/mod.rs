//! Upstream targets and the single-attempt HTTP client

pub mod client;
pub mod target;

pub use client::{UpstreamCall, UpstreamClient};
pub use target::{Backoff, FallbackSpec, UpstreamTarget};

use std::fmt;

/// Result of one call attempt against an upstream
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Success(serde_json::Value),
    Failure(FailureKind),
}

/// Classification of a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No response within the target's timeout
    Timeout,
    /// Socket-level failure, connection refused or reset
    Connection,
    /// Response with status >= 400
    Http(u16),
    /// Response body was not valid JSON
    Decode,
}

impl FailureKind {
    /// Whether a retry could plausibly succeed. 4xx means the request itself
    /// is invalid and a malformed body stays malformed, so neither is retried.
    pub fn is_transient(&self) -> bool {
        match self {
            FailureKind::Timeout | FailureKind::Connection => true,
            FailureKind::Http(status) => *status >= 500,
            FailureKind::Decode => false,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Connection => write!(f, "connection error"),
            FailureKind::Http(status) => write!(f, "http status {}", status),
            FailureKind::Decode => write!(f, "decode error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(FailureKind::Timeout.is_transient());
        assert!(FailureKind::Connection.is_transient());
        assert!(FailureKind::Http(500).is_transient());
        assert!(FailureKind::Http(503).is_transient());
        assert!(!FailureKind::Http(404).is_transient());
        assert!(!FailureKind::Http(400).is_transient());
        assert!(!FailureKind::Decode.is_transient());
    }
}
