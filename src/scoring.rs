//! Carbon score calculation
//!
//! A linear model: tree cover sequesters carbon, air pollution stands in for
//! emissions. The score is the difference in tonnes CO2-equivalent.

use crate::config::ScoringConfig;
use crate::models::{CarbonAssessment, CarbonBalance, ChartSlice, Recommendations};

/// Tonnes CO2 sequestered per percent of tree cover
pub const CO2_SEQUESTER_PER_PERCENT_TREE_COVER: f64 = 0.015;
/// Tonnes CO2 attributed to one AQI point
pub const AQI_TO_CO2_CONVERSION_FACTOR: f64 = 0.001;

pub const SEQUESTRATION_CATEGORY: &str = "Carbon Sequestration";
pub const EMISSION_CATEGORY: &str = "Carbon Emission";

/// Scoring constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringModel {
    pub sequestration_per_percent: f64,
    pub emission_per_aqi: f64,
}

impl Default for ScoringModel {
    fn default() -> Self {
        Self {
            sequestration_per_percent: CO2_SEQUESTER_PER_PERCENT_TREE_COVER,
            emission_per_aqi: AQI_TO_CO2_CONVERSION_FACTOR,
        }
    }
}

impl From<&ScoringConfig> for ScoringModel {
    fn from(config: &ScoringConfig) -> Self {
        Self {
            sequestration_per_percent: config.sequestration_per_percent,
            emission_per_aqi: config.emission_per_aqi,
        }
    }
}

impl ScoringModel {
    /// Score a region. Tree cover is clamped to `0..=100`, AQI to `>= 0`,
    /// NaN inputs count as zero. Never panics.
    #[must_use]
    pub fn score(&self, tree_cover_percent: f64, air_quality_index: f64) -> CarbonAssessment {
        let tree_cover_percent = clamp_tree_cover(tree_cover_percent);
        let air_quality_index = clamp_air_quality(air_quality_index);

        let carbon_sequestration = tree_cover_percent * self.sequestration_per_percent;
        let carbon_emission_tonnes = air_quality_index * self.emission_per_aqi;

        CarbonAssessment {
            tree_cover_percent,
            air_quality_index,
            carbon_sequestration,
            carbon_emission_tonnes,
            carbon_score: carbon_sequestration - carbon_emission_tonnes,
        }
    }
}

/// Score with the default constants
#[must_use]
pub fn compute_score(tree_cover_percent: f64, air_quality_index: f64) -> CarbonAssessment {
    ScoringModel::default().score(tree_cover_percent, air_quality_index)
}

/// Sequestration vs. emission categories for the bar and pie charts
#[must_use]
pub fn breakdown(assessment: &CarbonAssessment) -> Vec<ChartSlice> {
    vec![
        ChartSlice {
            category: SEQUESTRATION_CATEGORY.to_string(),
            value: assessment.carbon_score + assessment.carbon_emission_tonnes,
        },
        ChartSlice {
            category: EMISSION_CATEGORY.to_string(),
            value: assessment.carbon_emission_tonnes,
        },
    ]
}

/// Guidance text for a carbon balance
#[must_use]
pub fn recommendations(balance: CarbonBalance) -> Recommendations {
    match balance {
        CarbonBalance::Sink => Recommendations {
            headline: "Your region is a carbon sink! Continue to preserve and enhance the forest cover to maintain or increase your carbon credit score.".to_string(),
            actions: Vec::new(),
        },
        CarbonBalance::Source => Recommendations {
            headline: "Your region is a carbon source. Consider the following actions to lower the carbon footprint:".to_string(),
            actions: vec![
                "Increase Tree Planting: Consider planting more trees to increase the carbon sequestration capacity.".to_string(),
                "Improve Forest Management: Enhance forest health and management practices to boost carbon storage.".to_string(),
                "Adopt Sustainable Practices: Reduce emissions through sustainable agriculture, waste management, and energy practices.".to_string(),
                "Engage with Local Communities: Educate and involve local communities in conservation efforts and sustainability practices.".to_string(),
            ],
        },
    }
}

fn clamp_tree_cover(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

fn clamp_air_quality(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.max(0.0) }
}
