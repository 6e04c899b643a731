//! Fallback payloads for targets whose retries exhaust

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use crate::upstream::UpstreamTarget;

/// Supplies a substitute payload when a target's retries are exhausted.
/// Never fails; a `None` from [`resolve`](FallbackResolver::resolve) means
/// the aggregator records the target as failed instead of substituted.
///
/// Besides the static payload configured per target, the resolver keeps an
/// in-memory last-known-good cache: every successful payload is recorded,
/// and targets with `use_last_known_good` prefer the cached value over the
/// static one.
pub struct FallbackResolver {
    last_known_good: DashMap<String, Value>,
}

impl FallbackResolver {
    pub fn new() -> Self {
        Self {
            last_known_good: DashMap::new(),
        }
    }

    /// Record a successful payload as the last-known-good value for a target
    pub fn record_success(&self, name: &str, payload: &Value) {
        self.last_known_good.insert(name.to_string(), payload.clone());
    }

    /// Substitute payload for an exhausted target, if one is available
    pub fn resolve(&self, target: &UpstreamTarget) -> Option<Value> {
        if !target.fallback.enabled {
            return None;
        }

        if target.fallback.use_last_known_good {
            if let Some(cached) = self.last_known_good.get(&target.name) {
                debug!(target = %target.name, "Serving last-known-good payload");
                return Some(cached.clone());
            }
        }

        target.fallback.payload.clone()
    }
}

impl Default for FallbackResolver {
    fn default() -> Self {
        Self::new()
    }
}
