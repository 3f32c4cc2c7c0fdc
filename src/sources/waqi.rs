//! World Air Quality Index (WAQI) feed client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{AirQualityProvider, ensure_success, http_client, transport_error};
use crate::config::AirQualityConfig;
use crate::models::{GeoPoint, Reading};
use crate::{CarbonError, Result};

const PROVIDER: &str = "air quality";

pub struct WaqiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

/// `{"status": "ok", "data": {"aqi": 42, ...}}` or
/// `{"status": "error", "data": "Invalid key"}`
#[derive(Debug, Deserialize)]
struct FeedResponse {
    status: String,
    #[serde(default)]
    data: Value,
}

impl WaqiClient {
    pub fn new(config: &AirQualityConfig, user_agent: &str) -> Result<Self> {
        let client = http_client(PROVIDER, user_agent, config.timeout_seconds)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn feed_url(&self, point: GeoPoint, api_key: &str) -> String {
        format!(
            "{}/feed/geo:{};{}/?token={}",
            self.base_url,
            point.latitude,
            point.longitude,
            urlencoding::encode(api_key)
        )
    }

    async fn request_aqi(&self, point: GeoPoint, api_key: &str) -> Result<f64> {
        let response = self
            .client
            .get(self.feed_url(point, api_key))
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;
        let response = ensure_success(PROVIDER, response).await?;

        let feed: FeedResponse = response.json().await.map_err(|e| {
            CarbonError::api(PROVIDER, format!("Failed to parse air quality response: {e}"))
        })?;

        parse_feed(feed)
    }
}

fn parse_feed(feed: FeedResponse) -> Result<f64> {
    if feed.status != "ok" {
        let detail = feed.data.as_str().unwrap_or("no detail");
        return Err(CarbonError::api(
            PROVIDER,
            format!("service reported status '{}': {}", feed.status, detail),
        ));
    }

    // Stations without a current reading report "-" instead of a number
    let aqi = match feed.data.get("aqi") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match aqi {
        Some(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(CarbonError::api(PROVIDER, "response has no numeric AQI")),
    }
}

#[async_trait]
impl AirQualityProvider for WaqiClient {
    #[instrument(skip(self), fields(lat = point.latitude, lon = point.longitude))]
    async fn fetch_air_quality(&self, point: GeoPoint) -> Reading {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("No air quality API key configured");
            return Reading::unavailable("no air quality API key configured");
        };

        match self.request_aqi(point, api_key).await {
            Ok(aqi) => {
                debug!("AQI {aqi} at {:.4}, {:.4}", point.latitude, point.longitude);
                Reading::measured(aqi)
            }
            Err(e) => {
                warn!("Error fetching air quality data: {e}");
                Reading::unavailable(e.to_string())
            }
        }
    }
}
