//! Carbon assessment values produced by the scoring model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of scoring one region
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct CarbonAssessment {
    /// Mean tree cover over the region, `0..=100`
    pub tree_cover_percent: f64,
    /// Air-quality index, `>= 0`
    pub air_quality_index: f64,
    /// Sequestration estimate in tonnes CO2
    pub carbon_sequestration: f64,
    /// Emission estimate in tonnes CO2
    pub carbon_emission_tonnes: f64,
    /// `carbon_sequestration - carbon_emission_tonnes`
    pub carbon_score: f64,
}

impl CarbonAssessment {
    #[must_use]
    pub fn balance(&self) -> CarbonBalance {
        CarbonBalance::from_score(self.carbon_score)
    }
}

/// Whether a region absorbs more carbon than it emits
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CarbonBalance {
    Sink,
    Source,
}

impl CarbonBalance {
    /// Positive scores are sinks; zero and below are sources
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score > 0.0 { Self::Sink } else { Self::Source }
    }
}

impl fmt::Display for CarbonBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sink => write!(f, "carbon sink"),
            Self::Source => write!(f, "carbon source"),
        }
    }
}

/// One bar/pie category of the sequestration vs. emission breakdown
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChartSlice {
    pub category: String,
    /// Tonnes CO2
    pub value: f64,
}
