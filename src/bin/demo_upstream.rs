//! Toy upstream service for exercising the gateway's retry and fallback
//! paths. Responds to /hello, /echo/:msg and /health, with an optional
//! injected failure rate and artificial latency.
//!
//! Run: cargo run --bin demo-upstream
//! Env: PORT, SERVICE_NAME, FAIL_RATE (probability in [0,1] of a 503),
//!      DELAY_MS

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use rand::Rng;
use serde_json::json;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

#[derive(Clone)]
struct ServiceState {
    name: String,
    fail_rate: f64,
    delay_ms: u64,
    requests: Arc<AtomicU64>,
}

impl ServiceState {
    /// Apply latency, then decide whether this request is an injected failure
    async fn simulate(&self) -> Option<Response> {
        if self.delay_ms > 0 {
            sleep(Duration::from_millis(self.delay_ms)).await;
        }

        if self.fail_rate > 0.0 && rand::thread_rng().gen_bool(self.fail_rate.min(1.0)) {
            let body = Json(json!({"error": "injected failure", "service": self.name}));
            return Some((StatusCode::SERVICE_UNAVAILABLE, body).into_response());
        }

        None
    }
}

async fn hello(State(state): State<ServiceState>) -> Response {
    if let Some(failure) = state.simulate().await {
        return failure;
    }

    let n = state.requests.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({
        "service": state.name,
        "msg": format!("hello from {}", state.name),
        "requests": n,
    }))
    .into_response()
}

async fn echo(State(state): State<ServiceState>, Path(msg): Path<String>) -> Response {
    if let Some(failure) = state.simulate().await {
        return failure;
    }

    Json(json!({"service": state.name, "echo": msg})).into_response()
}

async fn health(State(state): State<ServiceState>) -> Json<serde_json::Value> {
    Json(json!({"status": "ok", "service": state.name}))
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let port: u16 = env_or("PORT", 8001);
    let name = std::env::var("SERVICE_NAME").unwrap_or_else(|_| format!("upstream-{}", port));
    let fail_rate: f64 = env_or("FAIL_RATE", 0.0);
    let delay_ms: u64 = env_or("DELAY_MS", 0);

    let state = ServiceState {
        name: name.clone(),
        fail_rate,
        delay_ms,
        requests: Arc::new(AtomicU64::new(0)),
    };

    let app = Router::new()
        .route("/hello", get(hello))
        .route("/echo/:msg", get(echo))
        .route("/health", get(health))
        .with_state(state);

    info!(
        service = %name,
        port,
        fail_rate,
        delay_ms,
        "Demo upstream listening"
    );

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
