//! Earth Engine REST client for tree cover statistics and NDVI thumbnails

pub mod expression;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use self::expression::{Expression, ndvi_image, point_buffer, tree_cover_mean};
use super::{
    TreeCoverProvider, VegetationImageProvider, ensure_success, http_client, transport_error,
};
use crate::config::EarthEngineConfig;
use crate::models::{Location, Reading, VegetationImage};
use crate::{CarbonError, Result};

const PROVIDER: &str = "earth engine";

pub struct EarthEngineClient {
    client: Client,
    config: EarthEngineConfig,
}

#[derive(Debug, Deserialize)]
struct ComputeValueResponse {
    #[serde(default)]
    result: Value,
}

#[derive(Debug, Deserialize)]
struct ThumbnailResponse {
    name: String,
}

impl EarthEngineClient {
    pub fn new(config: &EarthEngineConfig, user_agent: &str) -> Result<Self> {
        let client = http_client(PROVIDER, user_agent, config.timeout_seconds)?;
        let mut config = config.clone();
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self { client, config })
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        let project = self.config.project.as_deref().ok_or_else(|| {
            CarbonError::config("Earth Engine project is not configured")
        })?;
        let token = self.config.access_token.as_deref().ok_or_else(|| {
            CarbonError::config("Earth Engine access token is not configured")
        })?;
        Ok((project, token))
    }

    async fn post_json(&self, url: String, token: &str, body: &Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;
        ensure_success(PROVIDER, response).await
    }

    /// Evaluate an expression and return its JSON result
    async fn compute_value(&self, expression: Expression) -> Result<Value> {
        let (project, token) = self.credentials()?;
        let url = format!("{}/projects/{}/value:compute", self.config.base_url, project);

        let response = self
            .post_json(url, token, &json!({ "expression": expression }))
            .await?;
        let body: ComputeValueResponse = response.json().await.map_err(|e| {
            CarbonError::api(PROVIDER, format!("Failed to parse compute response: {e}"))
        })?;
        Ok(body.result)
    }

    /// Two steps: register a thumbnail for the expression, then download its pixels
    async fn render_thumbnail(&self, expression: Expression) -> Result<VegetationImage> {
        let (project, token) = self.credentials()?;
        let url = format!("{}/projects/{}/thumbnails", self.config.base_url, project);
        let dimension = self.config.thumbnail_dimensions;

        let request = json!({
            "expression": expression,
            "fileFormat": "PNG",
            "grid": {
                "dimensions": { "width": dimension, "height": dimension }
            },
            "visualizationOptions": {
                "ranges": [{ "min": 0, "max": 1 }],
                "paletteColors": self.config.thumbnail_palette,
            }
        });

        let response = self.post_json(url, token, &request).await?;
        let thumbnail: ThumbnailResponse = response.json().await.map_err(|e| {
            CarbonError::api(PROVIDER, format!("Failed to parse thumbnail response: {e}"))
        })?;
        debug!("Registered thumbnail {}", thumbnail.name);

        let pixels_url = format!("{}/{}:getPixels", self.config.base_url, thumbnail.name);
        let response = self
            .client
            .get(pixels_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;
        let response = ensure_success(PROVIDER, response).await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("image/png")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        Ok(VegetationImage {
            content_type,
            bytes: bytes.to_vec(),
        })
    }

    fn tree_cover_from_stats(&self, stats: &Value) -> Reading {
        match stats.get(&self.config.tree_cover_band).and_then(Value::as_f64) {
            Some(value) => Reading::measured(value),
            None => Reading::unavailable(format!(
                "no {} statistic for this area",
                self.config.tree_cover_band
            )),
        }
    }
}

#[async_trait]
impl TreeCoverProvider for EarthEngineClient {
    #[instrument(skip(self, location), fields(lat = location.latitude, lon = location.longitude, radius_km = location.radius_km))]
    async fn fetch_tree_cover(&self, location: &Location) -> Reading {
        let start_time = Instant::now();
        let buffer = point_buffer(location.point(), location.buffer_meters());
        let expression = Expression::from_root(tree_cover_mean(&self.config, &buffer));

        match self.compute_value(expression).await {
            Ok(stats) => {
                let reading = self.tree_cover_from_stats(&stats);
                info!(
                    "Tree cover {} in {:.3}s",
                    reading,
                    start_time.elapsed().as_secs_f64()
                );
                reading
            }
            Err(e) => {
                warn!("Error fetching tree cover: {e}");
                Reading::unavailable(e.to_string())
            }
        }
    }
}

#[async_trait]
impl VegetationImageProvider for EarthEngineClient {
    #[instrument(skip(self, location), fields(lat = location.latitude, lon = location.longitude, radius_km = location.radius_km))]
    async fn fetch_vegetation_image(&self, location: &Location) -> Result<VegetationImage> {
        let buffer = point_buffer(location.point(), location.buffer_meters());
        let expression = Expression::from_root(ndvi_image(&self.config, &buffer));
        let image = self.render_thumbnail(expression).await?;
        info!("Fetched NDVI thumbnail ({} bytes)", image.bytes.len());
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPoint;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> EarthEngineClient {
        let config = EarthEngineConfig {
            base_url: server.uri(),
            project: Some("demo-project".to_string()),
            access_token: Some("token-123".to_string()),
            timeout_seconds: 5,
            ..EarthEngineConfig::default()
        };
        EarthEngineClient::new(&config, "carbon-shunya-tests").unwrap()
    }

    fn location() -> Location {
        Location::new("Test forest", GeoPoint::new(30.3165, 78.0322), 5.0).unwrap()
    }

    #[tokio::test]
    async fn test_tree_cover_measured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects/demo-project/value:compute"))
            .and(header("authorization", "Bearer token-123"))
            .and(body_partial_json(serde_json::json!({
                "expression": {"result": "0"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": {"Percent_Tree_Cover": 42.7}
            })))
            .mount(&server)
            .await;

        let reading = client_for(&server).fetch_tree_cover(&location()).await;
        assert_eq!(reading, Reading::measured(42.7));
    }

    #[tokio::test]
    async fn test_tree_cover_missing_key_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": {}})),
            )
            .mount(&server)
            .await;

        let reading = client_for(&server).fetch_tree_cover(&location()).await;
        assert!(!reading.is_measured());
        assert_eq!(reading.value_or_zero(), 0.0);
    }

    #[tokio::test]
    async fn test_tree_cover_null_value_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": {"Percent_Tree_Cover": null}
            })))
            .mount(&server)
            .await;

        let reading = client_for(&server).fetch_tree_cover(&location()).await;
        assert!(!reading.is_measured());
    }

    #[tokio::test]
    async fn test_tree_cover_without_credentials() {
        let client = EarthEngineClient::new(&EarthEngineConfig::default(), "ua").unwrap();
        let reading = client.fetch_tree_cover(&location()).await;
        assert!(reading.reason().unwrap().contains("not configured"));
    }

    #[tokio::test]
    async fn test_vegetation_thumbnail_download() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects/demo-project/thumbnails"))
            .and(body_partial_json(serde_json::json!({
                "fileFormat": "PNG",
                "grid": {"dimensions": {"width": 512, "height": 512}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "projects/demo-project/thumbnails/abc123"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/projects/demo-project/thumbnails/abc123:getPixels"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(vec![0x89, b'P', b'N', b'G']),
            )
            .mount(&server)
            .await;

        let image = client_for(&server)
            .fetch_vegetation_image(&location())
            .await
            .unwrap();
        assert_eq!(image.content_type, "image/png");
        assert_eq!(image.bytes, vec![0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn test_vegetation_thumbnail_forbidden() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_vegetation_image(&location())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("authentication failed"));
    }
}
