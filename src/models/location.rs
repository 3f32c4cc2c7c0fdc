//! Location model for the analysed region

use crate::CarbonError;
use serde::{Deserialize, Serialize};

/// Smallest accepted analysis radius in kilometers
pub const MIN_RADIUS_KM: u32 = 1;
/// Largest accepted analysis radius in kilometers
pub const MAX_RADIUS_KM: u32 = 10;

/// A bare coordinate pair
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl GeoPoint {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and inside WGS84 bounds
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A resolved place plus the analysis radius around it.
///
/// Built once per assessment from the geocoding result and never mutated.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Display name returned by the geocoder (or the raw coordinates)
    pub name: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Analysis radius in kilometers
    pub radius_km: f64,
}

impl Location {
    /// Create a location, rejecting radii outside `1..=10` km
    pub fn new(name: impl Into<String>, point: GeoPoint, radius_km: f64) -> crate::Result<Self> {
        validate_radius(radius_km)?;
        if !point.is_valid() {
            return Err(CarbonError::validation(format!(
                "Coordinates out of range: {:.4}, {:.4}",
                point.latitude, point.longitude
            )));
        }

        Ok(Self {
            name: name.into(),
            latitude: point.latitude,
            longitude: point.longitude,
            radius_km,
        })
    }

    #[must_use]
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Buffer distance handed to geospatial services
    #[must_use]
    pub fn buffer_meters(&self) -> f64 {
        self.radius_km * 1000.0
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Check that a radius lies within the accepted analysis bounds
pub fn validate_radius(radius_km: f64) -> crate::Result<()> {
    if !radius_km.is_finite()
        || radius_km < f64::from(MIN_RADIUS_KM)
        || radius_km > f64::from(MAX_RADIUS_KM)
    {
        return Err(CarbonError::validation(format!(
            "Radius must be between {MIN_RADIUS_KM} and {MAX_RADIUS_KM} km, got: {radius_km}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_location_buffer_meters() {
        let location = Location::new("Dehradun", GeoPoint::new(30.3165, 78.0322), 5.0).unwrap();
        assert_eq!(location.buffer_meters(), 5000.0);
        assert_eq!(location.format_coordinates(), "30.3165, 78.0322");
    }

    #[rstest]
    #[case(1.0)]
    #[case(5.0)]
    #[case(10.0)]
    fn test_radius_within_bounds(#[case] radius: f64) {
        assert!(validate_radius(radius).is_ok());
    }

    #[rstest]
    #[case(0.0)]
    #[case(0.5)]
    #[case(10.5)]
    #[case(f64::NAN)]
    fn test_radius_out_of_bounds(#[case] radius: f64) {
        let err = validate_radius(radius).unwrap_err();
        assert!(matches!(err, CarbonError::Validation { .. }));
    }

    #[test]
    fn test_location_rejects_invalid_point() {
        let result = Location::new("Nowhere", GeoPoint::new(95.0, 0.0), 3.0);
        assert!(result.is_err());
    }
}
