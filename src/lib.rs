//! `Carbon Shunya` - carbon credit score estimation for a geographic region
//!
//! Combines tree cover statistics, an air-quality index and NDVI imagery from
//! external services into a simple signed carbon score, and serves the result
//! to a command line report or a web dashboard.

pub mod api;
pub mod config;
pub mod error;
pub mod location_resolver;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod scoring;
pub mod sources;
pub mod timeseries;
pub mod web;

// Re-export core types for public API
pub use config::CarbonConfig;
pub use error::CarbonError;
pub use location_resolver::{LocationInput, LocationParser, LocationResolver};
pub use models::{
    AssessmentOutcome, AssessmentReport, CarbonAssessment, CarbonBalance, Location, Reading,
};
pub use pipeline::{AssessmentRequest, CarbonPipeline};
pub use scoring::{ScoringModel, compute_score};
pub use timeseries::synthesize_series;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, CarbonError>;
