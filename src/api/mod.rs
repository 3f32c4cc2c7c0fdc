use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::{
    CarbonError,
    models::{AssessmentOutcome, GeoPoint, Location},
    pipeline::{AssessmentRequest, CarbonPipeline},
};

/// Shared, read-only state of the dashboard server
pub struct AppState {
    pub pipeline: CarbonPipeline,
    pub default_radius_km: u32,
}

#[derive(Debug, Deserialize)]
pub struct AssessmentQuery {
    #[serde(default)]
    pub location: String,
    pub radius: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub lat: f64,
    pub lon: f64,
    pub radius: f64,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    version: &'static str,
}

struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(ErrorBody { error: self.1 })).into_response()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl From<CarbonError> for ApiError {
    fn from(err: CarbonError) -> Self {
        let status = match err {
            CarbonError::Validation { .. } => StatusCode::BAD_REQUEST,
            CarbonError::Api { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!("Request failed: {err}");
        ApiError(status, err.user_message())
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/assessment", get(get_assessment))
        .route("/vegetation-image", get(get_vegetation_image))
        .with_state(state)
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok",
        version: crate::VERSION,
    })
}

async fn get_assessment(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AssessmentQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let radius_km = query
        .radius
        .unwrap_or_else(|| f64::from(state.default_radius_km));
    let request = AssessmentRequest::new(query.location, radius_km);

    match state.pipeline.assess(&request).await? {
        AssessmentOutcome::AwaitingInput => Ok(StatusCode::NO_CONTENT.into_response()),
        AssessmentOutcome::LocationNotFound { query } => Err(ApiError(
            StatusCode::NOT_FOUND,
            format!("Location not found: {query}"),
        )),
        AssessmentOutcome::Completed(report) => Ok(Json(*report).into_response()),
    }
}

async fn get_vegetation_image(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ImageQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let location = Location::new(
        "thumbnail",
        GeoPoint::new(query.lat, query.lon),
        query.radius,
    )?;
    // Missing credentials and upstream failures both mean "no image here"
    let image = state
        .pipeline
        .vegetation_image(&location)
        .await
        .map_err(|e| {
            tracing::warn!("Vegetation image unavailable: {e}");
            ApiError(StatusCode::BAD_GATEWAY, e.user_message())
        })?;

    Ok(([(header::CONTENT_TYPE, image.content_type)], image.bytes).into_response())
}
