//! Assessment report handed to the CLI and the web dashboard

use super::{CarbonAssessment, CarbonBalance, ChartSlice, Location, Reading};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::path::Path;

/// External source a notice refers to
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    AirQuality,
    TreeCover,
    VegetationImage,
}

impl Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AirQuality => write!(f, "air quality"),
            Self::TreeCover => write!(f, "tree cover"),
            Self::VegetationImage => write!(f, "vegetation image"),
        }
    }
}

/// User-visible warning about a degraded result
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Notice {
    pub source: DataSource,
    pub message: String,
}

/// One synthetic point of the NDVI / tree cover chart
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub ndvi: f64,
    pub tree_cover: f64,
}

/// Guidance text chosen from the carbon balance
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Recommendations {
    pub headline: String,
    pub actions: Vec<String>,
}

/// Rendered NDVI thumbnail
#[derive(Debug, Clone, PartialEq)]
pub struct VegetationImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl VegetationImage {
    /// Write the raw image bytes to `path`
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// Everything one assessment produces
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AssessmentReport {
    pub location: Location,
    pub assessment: CarbonAssessment,
    /// Raw tree cover reading before the zero fallback
    pub tree_cover: Reading,
    /// Raw AQI reading before the zero fallback
    pub air_quality: Reading,
    pub balance: CarbonBalance,
    /// Sequestration vs. emission, for the bar and pie charts
    pub breakdown: Vec<ChartSlice>,
    /// Synthetic illustrative series; not measured, not a forecast
    pub series: Vec<SeriesPoint>,
    pub recommendations: Recommendations,
    pub notices: Vec<Notice>,
    #[serde(skip)]
    pub vegetation_image: Option<VegetationImage>,
}

/// Result of running the pipeline on one user input
#[derive(Debug, Clone)]
pub enum AssessmentOutcome {
    /// Location input was empty; nothing was fetched
    AwaitingInput,
    /// The geocoder could not resolve the place
    LocationNotFound { query: String },
    Completed(Box<AssessmentReport>),
}

impl AssessmentOutcome {
    #[must_use]
    pub fn report(&self) -> Option<&AssessmentReport> {
        match self {
            Self::Completed(report) => Some(&**report),
            _ => None,
        }
    }
}

impl Display for AssessmentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "📍 {}", self.location.name)?;
        writeln!(
            f,
            "   Coordinates: {}  Radius: {} km",
            self.location.format_coordinates(),
            self.location.radius_km
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "🌲 Tree cover: {:.2}%",
            self.assessment.tree_cover_percent
        )?;
        writeln!(f, "📊 Air quality index: {}", self.air_quality)?;
        writeln!(
            f,
            "   Emissions: {:.2} t CO2  Sequestration: {:.2} t CO2",
            self.assessment.carbon_emission_tonnes, self.assessment.carbon_sequestration
        )?;
        writeln!(
            f,
            "🌍 Carbon credit score: {:.2} tonnes CO2 ({})",
            self.assessment.carbon_score, self.balance
        )?;

        if !self.series.is_empty() {
            writeln!(f)?;
            writeln!(f, "📆 NDVI and tree cover over time (synthetic, illustrative only)")?;
            for point in &self.series {
                writeln!(
                    f,
                    "   {}  NDVI {:.2}  tree cover {:.2}%",
                    point.date, point.ndvi, point.tree_cover
                )?;
            }
        }

        writeln!(f)?;
        writeln!(f, "💡 {}", self.recommendations.headline)?;
        for action in &self.recommendations.actions {
            writeln!(f, "   - {action}")?;
        }

        for notice in &self.notices {
            writeln!(f, "⚠️ {}: {}", notice.source, notice.message)?;
        }
        Ok(())
    }
}
