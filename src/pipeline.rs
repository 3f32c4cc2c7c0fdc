//! Carbon assessment pipeline
//!
//! Runs the stages in order for one user input: resolve the location,
//! optionally render the NDVI thumbnail, fetch tree cover, fetch AQI, score,
//! and assemble the report. Nothing is shared between assessments except the
//! immutable provider handles.

use crate::config::CarbonConfig;
use crate::location_resolver::{LocationParser, LocationResolver};
use crate::models::{
    AssessmentOutcome, AssessmentReport, DataSource, Location, Notice, Reading, VegetationImage,
    location::validate_radius,
};
use crate::scoring::{self, ScoringModel};
use crate::sources::{
    AirQualityProvider, EarthEngineClient, Geocoder, NominatimGeocoder, TreeCoverProvider,
    VegetationImageProvider, WaqiClient,
};
use crate::timeseries::{self, DEFAULT_SERIES_MONTHS};
use crate::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// One user interaction: the two dashboard inputs
#[derive(Debug, Clone)]
pub struct AssessmentRequest {
    /// Free-text place name or "lat,lon"
    pub location: String,
    /// Analysis radius, `1..=10` km
    pub radius_km: f64,
    /// Also render the NDVI thumbnail
    pub include_image: bool,
}

impl AssessmentRequest {
    pub fn new(location: impl Into<String>, radius_km: f64) -> Self {
        Self {
            location: location.into(),
            radius_km,
            include_image: false,
        }
    }

    #[must_use]
    pub fn with_image(mut self) -> Self {
        self.include_image = true;
        self
    }
}

pub struct CarbonPipeline {
    geocoder: Arc<dyn Geocoder>,
    air_quality: Arc<dyn AirQualityProvider>,
    tree_cover: Arc<dyn TreeCoverProvider>,
    vegetation: Arc<dyn VegetationImageProvider>,
    scoring: ScoringModel,
    series_start: NaiveDate,
    series_months: u32,
}

impl CarbonPipeline {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        air_quality: Arc<dyn AirQualityProvider>,
        tree_cover: Arc<dyn TreeCoverProvider>,
        vegetation: Arc<dyn VegetationImageProvider>,
    ) -> Self {
        Self {
            geocoder,
            air_quality,
            tree_cover,
            vegetation,
            scoring: ScoringModel::default(),
            series_start: timeseries::default_series_start(),
            series_months: DEFAULT_SERIES_MONTHS,
        }
    }

    /// Wire the Nominatim, WAQI and Earth Engine clients from configuration
    pub fn from_config(config: &CarbonConfig) -> Result<Self> {
        let user_agent = config.geocoding.user_agent.as_str();
        let geocoder = Arc::new(NominatimGeocoder::new(&config.geocoding)?);
        let air_quality = Arc::new(WaqiClient::new(&config.air_quality, user_agent)?);
        let earth_engine = Arc::new(EarthEngineClient::new(&config.earth_engine, user_agent)?);

        Ok(Self::new(geocoder, air_quality, earth_engine.clone(), earth_engine)
            .with_scoring(ScoringModel::from(&config.scoring))
            .with_series(config.series.start_date, config.series.months))
    }

    #[must_use]
    pub fn with_scoring(mut self, scoring: ScoringModel) -> Self {
        self.scoring = scoring;
        self
    }

    #[must_use]
    pub fn with_series(mut self, start: NaiveDate, months: u32) -> Self {
        self.series_start = start;
        self.series_months = months;
        self
    }

    /// Run the whole pipeline for one request.
    ///
    /// Blank input returns `AwaitingInput` and an unknown place returns
    /// `LocationNotFound`, both without calling any later stage. Missing
    /// tree cover or AQI never fail the assessment; they are scored as zero
    /// and reported through notices.
    #[instrument(skip(self), fields(location = %request.location, radius_km = request.radius_km))]
    pub async fn assess(&self, request: &AssessmentRequest) -> Result<AssessmentOutcome> {
        let Some(input) = LocationParser::parse(&request.location) else {
            return Ok(AssessmentOutcome::AwaitingInput);
        };
        validate_radius(request.radius_km)?;

        let Some(location) =
            LocationResolver::resolve_location(self.geocoder.as_ref(), input, request.radius_km)
                .await?
        else {
            info!("Location '{}' not found, stopping", request.location.trim());
            return Ok(AssessmentOutcome::LocationNotFound {
                query: request.location.trim().to_string(),
            });
        };

        let mut notices = Vec::new();

        let vegetation_image = if request.include_image {
            match self.vegetation.fetch_vegetation_image(&location).await {
                Ok(image) => Some(image),
                Err(e) => {
                    warn!("Vegetation image unavailable: {e}");
                    notices.push(Notice {
                        source: DataSource::VegetationImage,
                        message: format!("Vegetation image unavailable: {e}"),
                    });
                    None
                }
            }
        } else {
            None
        };

        let tree_cover = self.tree_cover.fetch_tree_cover(&location).await;
        if let Some(reason) = tree_cover.reason() {
            notices.push(Notice {
                source: DataSource::TreeCover,
                message: format!(
                    "Tree cover data unavailable ({reason}); assuming 0% tree cover."
                ),
            });
        }

        let air_quality = self.air_quality.fetch_air_quality(location.point()).await;
        if let Some(reason) = air_quality.reason() {
            notices.push(Notice {
                source: DataSource::AirQuality,
                message: format!(
                    "Error fetching carbon emission data ({reason}); assuming AQI 0, which biases the score upward."
                ),
            });
        }

        let report = self.build_report(location, tree_cover, air_quality, notices, vegetation_image);
        info!(
            "Carbon score {:.2} t CO2 ({})",
            report.assessment.carbon_score, report.balance
        );
        Ok(AssessmentOutcome::Completed(Box::new(report)))
    }

    /// NDVI thumbnail for an already resolved location
    pub async fn vegetation_image(&self, location: &Location) -> Result<VegetationImage> {
        self.vegetation.fetch_vegetation_image(location).await
    }

    fn build_report(
        &self,
        location: Location,
        tree_cover: Reading,
        air_quality: Reading,
        notices: Vec<Notice>,
        vegetation_image: Option<VegetationImage>,
    ) -> AssessmentReport {
        let assessment = self
            .scoring
            .score(tree_cover.value_or_zero(), air_quality.value_or_zero());
        let balance = assessment.balance();

        AssessmentReport {
            location,
            breakdown: scoring::breakdown(&assessment),
            series: timeseries::synthesize_series_from(
                self.series_start,
                assessment.tree_cover_percent,
                self.series_months,
            ),
            recommendations: scoring::recommendations(balance),
            assessment,
            tree_cover,
            air_quality,
            balance,
            notices,
            vegetation_image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CarbonBalance, GeoPoint};
    use crate::sources::GeocodedPlace;
    use crate::CarbonError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Calls {
        geocode: AtomicUsize,
        air_quality: AtomicUsize,
        tree_cover: AtomicUsize,
        image: AtomicUsize,
    }

    struct FakeServices {
        calls: Arc<Calls>,
        place: Option<GeocodedPlace>,
        tree_cover: Reading,
        air_quality: Reading,
        image_ok: bool,
    }

    #[async_trait]
    impl Geocoder for FakeServices {
        async fn geocode(&self, _place_name: &str) -> Result<Option<GeocodedPlace>> {
            self.calls.geocode.fetch_add(1, Ordering::SeqCst);
            Ok(self.place.clone())
        }
    }

    #[async_trait]
    impl AirQualityProvider for FakeServices {
        async fn fetch_air_quality(&self, _point: GeoPoint) -> Reading {
            self.calls.air_quality.fetch_add(1, Ordering::SeqCst);
            self.air_quality.clone()
        }
    }

    #[async_trait]
    impl TreeCoverProvider for FakeServices {
        async fn fetch_tree_cover(&self, _location: &Location) -> Reading {
            self.calls.tree_cover.fetch_add(1, Ordering::SeqCst);
            self.tree_cover.clone()
        }
    }

    #[async_trait]
    impl VegetationImageProvider for FakeServices {
        async fn fetch_vegetation_image(&self, _location: &Location) -> Result<VegetationImage> {
            self.calls.image.fetch_add(1, Ordering::SeqCst);
            if self.image_ok {
                Ok(VegetationImage {
                    content_type: "image/png".to_string(),
                    bytes: vec![1, 2, 3],
                })
            } else {
                Err(CarbonError::api("earth engine", "HTTP 403"))
            }
        }
    }

    fn fake(tree_cover: Reading, air_quality: Reading) -> FakeServices {
        FakeServices {
            calls: Arc::new(Calls::default()),
            place: Some(GeocodedPlace {
                name: "Shimla, Himachal Pradesh, India".to_string(),
                point: GeoPoint::new(31.1048, 77.1734),
            }),
            tree_cover,
            air_quality,
            image_ok: true,
        }
    }

    fn pipeline(services: FakeServices) -> (CarbonPipeline, Arc<Calls>) {
        let calls = services.calls.clone();
        let services = Arc::new(services);
        let pipeline = CarbonPipeline::new(
            services.clone(),
            services.clone(),
            services.clone(),
            services,
        );
        (pipeline, calls)
    }

    fn total_calls(calls: &Calls) -> usize {
        calls.geocode.load(Ordering::SeqCst)
            + calls.air_quality.load(Ordering::SeqCst)
            + calls.tree_cover.load(Ordering::SeqCst)
            + calls.image.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_blank_location_short_circuits() {
        let (pipeline, calls) = pipeline(fake(Reading::measured(50.0), Reading::measured(20.0)));

        for input in ["", "   ", "\t\n"] {
            let outcome = pipeline
                .assess(&AssessmentRequest::new(input, 5.0).with_image())
                .await
                .unwrap();
            assert!(matches!(outcome, AssessmentOutcome::AwaitingInput));
        }
        assert_eq!(total_calls(&calls), 0);
    }

    #[tokio::test]
    async fn test_invalid_radius_rejected_before_calls() {
        let (pipeline, calls) = pipeline(fake(Reading::measured(50.0), Reading::measured(20.0)));

        let err = pipeline
            .assess(&AssessmentRequest::new("Shimla", 11.0))
            .await
            .unwrap_err();
        assert!(matches!(err, CarbonError::Validation { .. }));
        assert_eq!(total_calls(&calls), 0);
    }

    #[tokio::test]
    async fn test_unknown_location_halts_pipeline() {
        let mut services = fake(Reading::measured(50.0), Reading::measured(20.0));
        services.place = None;
        let (pipeline, calls) = pipeline(services);

        let outcome = pipeline
            .assess(&AssessmentRequest::new(" Atlantis ", 5.0).with_image())
            .await
            .unwrap();
        match outcome {
            AssessmentOutcome::LocationNotFound { query } => assert_eq!(query, "Atlantis"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(calls.geocode.load(Ordering::SeqCst), 1);
        assert_eq!(total_calls(&calls), 1);
    }

    #[tokio::test]
    async fn test_completed_assessment() {
        let (pipeline, calls) = pipeline(fake(Reading::measured(60.0), Reading::measured(40.0)));

        let outcome = pipeline
            .assess(&AssessmentRequest::new("Shimla", 5.0))
            .await
            .unwrap();
        let report = outcome.report().unwrap();

        assert_eq!(report.location.name, "Shimla, Himachal Pradesh, India");
        assert_eq!(report.location.radius_km, 5.0);
        assert!((report.assessment.carbon_score - (0.9 - 0.04)).abs() < 1e-12);
        assert_eq!(report.balance, CarbonBalance::Sink);
        assert_eq!(report.series.len(), 12);
        assert_eq!(report.series[0].tree_cover, 60.0);
        assert_eq!(report.breakdown.len(), 2);
        assert!(report.notices.is_empty());
        assert!(report.vegetation_image.is_none());
        assert_eq!(calls.image.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unavailable_air_quality_scores_zero_with_notice() {
        let (pipeline, _) = pipeline(fake(
            Reading::measured(20.0),
            Reading::unavailable("service reported status 'error'"),
        ));

        let outcome = pipeline
            .assess(&AssessmentRequest::new("Shimla", 2.0))
            .await
            .unwrap();
        let report = outcome.report().unwrap();

        assert_eq!(report.assessment.air_quality_index, 0.0);
        assert!(!report.air_quality.is_measured());
        assert_eq!(report.notices.len(), 1);
        assert_eq!(report.notices[0].source, DataSource::AirQuality);
        assert!(report.notices[0].message.contains("biases the score upward"));
    }

    #[tokio::test]
    async fn test_unavailable_tree_cover_notifies() {
        let (pipeline, _) = pipeline(fake(
            Reading::unavailable("no Percent_Tree_Cover statistic for this area"),
            Reading::measured(0.0),
        ));

        let outcome = pipeline
            .assess(&AssessmentRequest::new("Shimla", 2.0))
            .await
            .unwrap();
        let report = outcome.report().unwrap();

        assert_eq!(report.assessment.carbon_score, 0.0);
        assert_eq!(report.balance, CarbonBalance::Source);
        assert!(report.air_quality.is_measured());
        assert_eq!(report.notices.len(), 1);
        assert_eq!(report.notices[0].source, DataSource::TreeCover);
    }

    #[tokio::test]
    async fn test_image_failure_is_a_notice() {
        let mut services = fake(Reading::measured(30.0), Reading::measured(10.0));
        services.image_ok = false;
        let (pipeline, calls) = pipeline(services);

        let outcome = pipeline
            .assess(&AssessmentRequest::new("Shimla", 4.0).with_image())
            .await
            .unwrap();
        let report = outcome.report().unwrap();

        assert!(report.vegetation_image.is_none());
        assert_eq!(report.notices[0].source, DataSource::VegetationImage);
        assert_eq!(calls.image.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_coordinates_bypass_geocoder() {
        let (pipeline, calls) = pipeline(fake(Reading::measured(30.0), Reading::measured(10.0)));

        let outcome = pipeline
            .assess(&AssessmentRequest::new("31.1048, 77.1734", 1.0).with_image())
            .await
            .unwrap();
        let report = outcome.report().unwrap();

        assert_eq!(report.location.name, "31.1048, 77.1734");
        assert!(report.vegetation_image.is_some());
        assert_eq!(calls.geocode.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_custom_scoring_and_series() {
        let (pipeline, _) = pipeline(fake(Reading::measured(50.0), Reading::measured(100.0)));
        let pipeline = pipeline
            .with_scoring(ScoringModel {
                sequestration_per_percent: 0.01,
                emission_per_aqi: 0.01,
            })
            .with_series(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 6);

        let outcome = pipeline
            .assess(&AssessmentRequest::new("Shimla", 5.0))
            .await
            .unwrap();
        let report = outcome.report().unwrap();

        assert!((report.assessment.carbon_score - (-0.5)).abs() < 1e-12);
        assert_eq!(report.series.len(), 6);
        assert_eq!(
            report.series[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        );
    }
}
