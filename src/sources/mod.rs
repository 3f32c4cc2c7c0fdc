//! External data providers
//!
//! Every stage of the pipeline that talks to a remote service sits behind one
//! of the traits below so the pipeline can be driven by fakes in tests and the
//! services can be swapped without touching the scoring code:
//! - Geocoder: place name to coordinates (Nominatim)
//! - AirQualityProvider: coordinates to AQI (WAQI)
//! - TreeCoverProvider / VegetationImageProvider: Earth Engine

pub mod earth_engine;
pub mod nominatim;
pub mod waqi;

use crate::models::{GeoPoint, Location, Reading, VegetationImage};
use crate::{CarbonError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use earth_engine::EarthEngineClient;
pub use nominatim::NominatimGeocoder;
pub use waqi::WaqiClient;

/// A geocoding hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedPlace {
    pub name: String,
    pub point: GeoPoint,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a place name. `Ok(None)` means the service answered but knows
    /// no such place; transport failures are errors.
    async fn geocode(&self, place_name: &str) -> Result<Option<GeocodedPlace>>;
}

#[async_trait]
pub trait AirQualityProvider: Send + Sync {
    /// Never fails: every problem becomes `Reading::Unavailable`
    async fn fetch_air_quality(&self, point: GeoPoint) -> Reading;
}

#[async_trait]
pub trait TreeCoverProvider: Send + Sync {
    /// Mean percent tree cover inside the location's radius
    async fn fetch_tree_cover(&self, location: &Location) -> Reading;
}

#[async_trait]
pub trait VegetationImageProvider: Send + Sync {
    /// NDVI thumbnail of the location's buffer, for display only
    async fn fetch_vegetation_image(&self, location: &Location) -> Result<VegetationImage>;
}

/// Build an HTTP client with an explicit timeout
pub(crate) fn http_client(
    provider: &'static str,
    user_agent: &str,
    timeout_seconds: u32,
) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds.into()))
        .user_agent(user_agent)
        .build()
        .map_err(|e| CarbonError::api(provider, format!("Failed to create HTTP client: {e}")))
}

/// Turn non-success HTTP statuses into provider errors, keeping the body
/// text for the log
pub(crate) async fn ensure_success(provider: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match status.as_u16() {
        401 | 403 => format!("authentication failed (HTTP {})", status.as_u16()),
        429 => "rate limit exceeded".to_string(),
        _ => format!(
            "request failed with status {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown error")
        ),
    };
    let snippet: String = body.chars().take(200).collect();
    tracing::warn!(provider, %status, body = %snippet, "{message}");
    Err(CarbonError::api(provider, message))
}

pub(crate) fn transport_error(provider: &'static str, err: reqwest::Error) -> CarbonError {
    if err.is_timeout() {
        CarbonError::api(provider, "request timed out")
    } else {
        CarbonError::api(provider, format!("request failed: {err}"))
    }
}
