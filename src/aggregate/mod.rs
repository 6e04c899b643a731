//! Concurrent aggregation of upstream outcomes

mod aggregator;

pub use aggregator::{overall_status, Aggregator};

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Outcome class for one target in an aggregate response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    Ok,
    Fallback,
    Failed,
}

/// Per-target entry in the aggregate response
#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    pub status: TargetStatus,
    pub payload: Value,
    pub attempts: u32,
}

/// One entry per configured target, keyed by target name. Built fresh per
/// inbound request and discarded after the response is sent.
pub type AggregateResult = BTreeMap<String, TargetReport>;
