//! Configuration management for `Carbon Shunya`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::CarbonError;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CarbonConfig {
    /// Geocoding service settings
    pub geocoding: GeocodingConfig,
    /// Air-quality service settings
    pub air_quality: AirQualityConfig,
    /// Earth Engine settings for tree cover and vegetation imagery
    pub earth_engine: EarthEngineConfig,
    /// Scoring constants
    pub scoring: ScoringConfig,
    /// Synthetic time series settings
    pub series: SeriesConfig,
    /// Web dashboard settings
    pub server: ServerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Default application settings
    pub defaults: DefaultsConfig,
}

/// Geocoding (Nominatim) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,
    /// Nominatim rejects requests without an identifying user agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout in seconds
    #[serde(default = "default_geocoding_timeout")]
    pub timeout_seconds: u32,
}

/// Air-quality (WAQI) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirQualityConfig {
    /// WAQI token. Without it every AQI reading is reported unavailable.
    pub api_key: Option<String>,
    #[serde(default = "default_air_quality_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_air_quality_timeout")]
    pub timeout_seconds: u32,
}

/// Earth Engine REST settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarthEngineConfig {
    #[serde(default = "default_earth_engine_base_url")]
    pub base_url: String,
    /// Cloud project the computations are billed to
    pub project: Option<String>,
    /// OAuth2 bearer token
    pub access_token: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_earth_engine_timeout")]
    pub timeout_seconds: u32,
    #[serde(default = "default_imagery_collection")]
    pub imagery_collection: String,
    #[serde(default = "default_imagery_start")]
    pub imagery_start: NaiveDate,
    #[serde(default = "default_imagery_end")]
    pub imagery_end: NaiveDate,
    #[serde(default = "default_nir_band")]
    pub nir_band: String,
    #[serde(default = "default_red_band")]
    pub red_band: String,
    #[serde(default = "default_cloud_property")]
    pub cloud_property: String,
    #[serde(default = "default_tree_cover_collection")]
    pub tree_cover_collection: String,
    #[serde(default = "default_tree_cover_band")]
    pub tree_cover_band: String,
    /// Reduction scale in meters
    #[serde(default = "default_tree_cover_scale")]
    pub tree_cover_scale: f64,
    #[serde(default = "default_thumbnail_dimensions")]
    pub thumbnail_dimensions: u32,
    #[serde(default = "default_thumbnail_palette")]
    pub thumbnail_palette: Vec<String>,
}

/// Scoring constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Tonnes CO2 sequestered per percent of tree cover
    #[serde(default = "default_sequestration_per_percent")]
    pub sequestration_per_percent: f64,
    /// Tonnes CO2 emitted per AQI point
    #[serde(default = "default_emission_per_aqi")]
    pub emission_per_aqi: f64,
}

/// Synthetic series settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesConfig {
    #[serde(default = "default_series_start")]
    pub start_date: NaiveDate,
    #[serde(default = "default_series_months")]
    pub months: u32,
}

/// Web dashboard settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Directory holding the static dashboard page
    #[serde(default = "default_dashboard_dir")]
    pub dashboard_dir: String,
    /// Upper bound for a whole assessment request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Default application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Analysis radius in kilometers
    #[serde(default = "default_radius")]
    pub radius_km: u32,
}

// Default value functions
fn default_geocoding_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    format!("carbon-shunya/{}", env!("CARGO_PKG_VERSION"))
}

fn default_geocoding_timeout() -> u32 {
    10
}

fn default_air_quality_base_url() -> String {
    "https://api.waqi.info".to_string()
}

fn default_air_quality_timeout() -> u32 {
    10
}

fn default_earth_engine_base_url() -> String {
    "https://earthengine.googleapis.com/v1".to_string()
}

fn default_earth_engine_timeout() -> u32 {
    60
}

fn default_imagery_collection() -> String {
    "COPERNICUS/S2".to_string()
}

fn default_imagery_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default()
}

fn default_imagery_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or_default()
}

fn default_nir_band() -> String {
    "B8".to_string()
}

fn default_red_band() -> String {
    "B4".to_string()
}

fn default_cloud_property() -> String {
    "CLOUDY_PIXEL_PERCENTAGE".to_string()
}

fn default_tree_cover_collection() -> String {
    "MODIS/006/MOD44B".to_string()
}

fn default_tree_cover_band() -> String {
    "Percent_Tree_Cover".to_string()
}

fn default_tree_cover_scale() -> f64 {
    250.0
}

fn default_thumbnail_dimensions() -> u32 {
    512
}

fn default_thumbnail_palette() -> Vec<String> {
    vec![
        "white".to_string(),
        "lightgreen".to_string(),
        "green".to_string(),
    ]
}

fn default_sequestration_per_percent() -> f64 {
    0.015
}

fn default_emission_per_aqi() -> f64 {
    0.001
}

fn default_series_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default()
}

fn default_series_months() -> u32 {
    12
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8501
}

fn default_dashboard_dir() -> String {
    "dashboard".to_string()
}

fn default_request_timeout() -> u32 {
    120
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_radius() -> u32 {
    5
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            user_agent: default_user_agent(),
            timeout_seconds: default_geocoding_timeout(),
        }
    }
}

impl Default for AirQualityConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_air_quality_base_url(),
            timeout_seconds: default_air_quality_timeout(),
        }
    }
}

impl Default for EarthEngineConfig {
    fn default() -> Self {
        Self {
            base_url: default_earth_engine_base_url(),
            project: None,
            access_token: None,
            timeout_seconds: default_earth_engine_timeout(),
            imagery_collection: default_imagery_collection(),
            imagery_start: default_imagery_start(),
            imagery_end: default_imagery_end(),
            nir_band: default_nir_band(),
            red_band: default_red_band(),
            cloud_property: default_cloud_property(),
            tree_cover_collection: default_tree_cover_collection(),
            tree_cover_band: default_tree_cover_band(),
            tree_cover_scale: default_tree_cover_scale(),
            thumbnail_dimensions: default_thumbnail_dimensions(),
            thumbnail_palette: default_thumbnail_palette(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            sequestration_per_percent: default_sequestration_per_percent(),
            emission_per_aqi: default_emission_per_aqi(),
        }
    }
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            start_date: default_series_start(),
            months: default_series_months(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            dashboard_dir: default_dashboard_dir(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            radius_km: default_radius(),
        }
    }
}

impl CarbonConfig {
    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // CARBON_AIR_QUALITY__API_KEY=... overrides air_quality.api_key
        builder = builder.add_source(
            Environment::with_prefix("CARBON")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: CarbonConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("carbon-shunya").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.geocoding.base_url.is_empty() {
            self.geocoding.base_url = default_geocoding_base_url();
        }
        if self.geocoding.user_agent.is_empty() {
            self.geocoding.user_agent = default_user_agent();
        }
        if self.geocoding.timeout_seconds == 0 {
            self.geocoding.timeout_seconds = default_geocoding_timeout();
        }
        if self.air_quality.base_url.is_empty() {
            self.air_quality.base_url = default_air_quality_base_url();
        }
        if self.air_quality.timeout_seconds == 0 {
            self.air_quality.timeout_seconds = default_air_quality_timeout();
        }
        if self.earth_engine.base_url.is_empty() {
            self.earth_engine.base_url = default_earth_engine_base_url();
        }
        if self.earth_engine.timeout_seconds == 0 {
            self.earth_engine.timeout_seconds = default_earth_engine_timeout();
        }
        if self.earth_engine.thumbnail_palette.is_empty() {
            self.earth_engine.thumbnail_palette = default_thumbnail_palette();
        }
        if self.series.months == 0 {
            self.series.months = default_series_months();
        }
        if self.server.request_timeout_seconds == 0 {
            self.server.request_timeout_seconds = default_request_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.defaults.radius_km == 0 {
            self.defaults.radius_km = default_radius();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        if let Some(api_key) = &self.air_quality.api_key {
            if api_key.trim().is_empty() {
                return Err(CarbonError::config(
                    "Air quality API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }
        }

        if let Some(token) = &self.earth_engine.access_token {
            if token.trim().is_empty() {
                return Err(CarbonError::config(
                    "Earth Engine access token cannot be empty if provided.",
                )
                .into());
            }
        }

        if let Some(project) = &self.earth_engine.project {
            if project.trim().is_empty() {
                return Err(
                    CarbonError::config("Earth Engine project cannot be empty if provided.").into(),
                );
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        let timeouts = [
            ("Geocoding", self.geocoding.timeout_seconds),
            ("Air quality", self.air_quality.timeout_seconds),
            ("Earth Engine", self.earth_engine.timeout_seconds),
            ("Server request", self.server.request_timeout_seconds),
        ];
        for (name, seconds) in timeouts {
            if seconds > 300 {
                return Err(
                    CarbonError::config(format!("{name} timeout cannot exceed 300 seconds")).into(),
                );
            }
        }

        if !(1..=10).contains(&self.defaults.radius_km) {
            return Err(CarbonError::config("Default radius must be between 1 and 10 km").into());
        }

        if self.series.months > 120 {
            return Err(CarbonError::config("Series length cannot exceed 120 months").into());
        }

        let constants = [
            ("sequestration_per_percent", self.scoring.sequestration_per_percent),
            ("emission_per_aqi", self.scoring.emission_per_aqi),
        ];
        for (name, value) in constants {
            if !value.is_finite() || value < 0.0 {
                return Err(CarbonError::config(format!(
                    "Scoring constant {name} must be a finite non-negative number"
                ))
                .into());
            }
        }

        let scale = self.earth_engine.tree_cover_scale;
        if scale.is_nan() || scale <= 0.0 {
            return Err(CarbonError::config("Tree cover scale must be positive").into());
        }

        if !(64..=2048).contains(&self.earth_engine.thumbnail_dimensions) {
            return Err(
                CarbonError::config("Thumbnail dimensions must be between 64 and 2048").into(),
            );
        }

        if self.earth_engine.imagery_start > self.earth_engine.imagery_end {
            return Err(CarbonError::config("Imagery start date must not be after end date").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(CarbonError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(CarbonError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("Geocoding", &self.geocoding.base_url),
            ("Air quality", &self.air_quality.base_url),
            ("Earth Engine", &self.earth_engine.base_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(CarbonError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
