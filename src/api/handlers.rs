//! Request handlers for the gateway's endpoints

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::aggregate::overall_status;
use crate::AppState;

/// Liveness only, no dependency checks
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "up"}))
}

/// Fan out to every configured target and merge the outcomes. Always
/// responds; the worst case is the all-failed status with fully annotated
/// per-target data.
pub async fn aggregate(State(state): State<Arc<AppState>>) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("aggregate", %request_id);

    let result = state.aggregator.aggregate().instrument(span).await;

    let status = overall_status(&result, state.degraded_status, state.all_failed_status);
    (status, Json(result)).into_response()
}
