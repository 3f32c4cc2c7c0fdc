use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::http::StatusCode;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;

use crate::api::{self, AppState};
use crate::config::CarbonConfig;
use crate::pipeline::CarbonPipeline;

/// Dashboard application: JSON API under `/api`, static page everywhere else
pub fn app(config: &CarbonConfig, pipeline: CarbonPipeline) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = Arc::new(AppState {
        pipeline,
        default_radius_km: config.defaults.radius_km,
    });

    Router::new()
        .nest("/api", api::router(state))
        .fallback_service(ServeDir::new(&config.server.dashboard_dir))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.request_timeout_seconds.into()),
        ))
        .layer(cors)
}

pub async fn run(config: &CarbonConfig, pipeline: CarbonPipeline) -> Result<()> {
    let app = app(config, pipeline);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Dashboard running at http://localhost:{}", config.server.port);
    axum::serve(listener, app)
        .await
        .with_context(|| "Web server stopped unexpectedly")?;
    Ok(())
}
