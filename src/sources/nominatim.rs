use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::{GeocodedPlace, Geocoder, ensure_success, http_client, transport_error};
use crate::config::GeocodingConfig;
use crate::models::GeoPoint;
use crate::{CarbonError, Result};

const PROVIDER: &str = "geocoding";

/// Nominatim (OpenStreetMap) search client
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

/// One hit of `/search?format=jsonv2`; coordinates arrive as strings
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = http_client(PROVIDER, &config.user_agent, config.timeout_seconds)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self, place_name: &str) -> String {
        format!(
            "{}/search?q={}&format=jsonv2&limit=1",
            self.base_url,
            urlencoding::encode(place_name)
        )
    }
}

impl NominatimPlace {
    fn into_place(self) -> Result<GeocodedPlace> {
        let latitude = self.lat.parse::<f64>().map_err(|_| {
            CarbonError::api(PROVIDER, format!("Invalid latitude in response: {}", self.lat))
        })?;
        let longitude = self.lon.parse::<f64>().map_err(|_| {
            CarbonError::api(PROVIDER, format!("Invalid longitude in response: {}", self.lon))
        })?;

        Ok(GeocodedPlace {
            name: self.display_name,
            point: GeoPoint::new(latitude, longitude),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[instrument(skip(self))]
    async fn geocode(&self, place_name: &str) -> Result<Option<GeocodedPlace>> {
        info!("Geocoding location: '{}'", place_name);
        let start_time = Instant::now();

        let response = self
            .client
            .get(self.search_url(place_name))
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;
        let response = ensure_success(PROVIDER, response).await?;

        let places: Vec<NominatimPlace> = response.json().await.map_err(|e| {
            CarbonError::api(PROVIDER, format!("Failed to parse geocoding response: {e}"))
        })?;

        let Some(place) = places.into_iter().next() else {
            warn!("No results found for location '{}'", place_name);
            return Ok(None);
        };

        let place = place.into_place()?;
        debug!(
            "Resolved '{}' to {} ({:.4}, {:.4}) in {:.3}s",
            place_name,
            place.name,
            place.point.latitude,
            place.point.longitude,
            start_time.elapsed().as_secs_f64()
        );
        Ok(Some(place))
    }
}
