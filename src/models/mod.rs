//! Data models for carbon assessments
//!
//! - Location: resolved place and analysis radius
//! - Reading: measured-or-unavailable values from external providers
//! - Assessment: scoring output and carbon balance
//! - Report: the full result handed to the CLI and dashboard

pub mod assessment;
pub mod location;
pub mod reading;
pub mod report;

pub use assessment::{CarbonAssessment, CarbonBalance, ChartSlice};
pub use location::{GeoPoint, Location, MAX_RADIUS_KM, MIN_RADIUS_KM};
pub use reading::Reading;
pub use report::{
    AssessmentOutcome, AssessmentReport, DataSource, Notice, Recommendations, SeriesPoint,
    VegetationImage,
};
