//! Main entry point for the aggregation gateway

use aggregate_gateway::{
    aggregate::Aggregator,
    api,
    config::Settings,
    fallback::FallbackResolver,
    upstream::{UpstreamClient, UpstreamTarget},
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::load()?;
    settings.validate()?;

    // Initialize logging; RUST_LOG overrides the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.clone()));

    let registry = tracing_subscriber::registry().with(filter);
    if settings.logging.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    info!("Starting aggregation gateway");
    info!(
        "Loaded configuration: server={}:{}, targets={}",
        settings.server.host,
        settings.server.port,
        settings.targets.len()
    );

    let targets: Vec<UpstreamTarget> = settings
        .targets
        .iter()
        .map(UpstreamTarget::from_config)
        .collect();

    let client = Arc::new(UpstreamClient::new()?);
    let fallback = Arc::new(FallbackResolver::new());
    let aggregator = Aggregator::new(
        client,
        fallback,
        targets,
        Duration::from_millis(settings.gateway.request_timeout_ms),
    );

    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    let app_state = Arc::new(AppState::new(settings, aggregator)?);
    let app = api::routes::create_router(app_state);

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
