//! Location Resolution Module
//!
//! Turns the free-text location field into a `Location`: either literal
//! coordinates typed by the user or a place name sent to the geocoder.

use crate::models::{GeoPoint, Location};
use crate::sources::Geocoder;
use crate::Result;
use tracing::debug;

/// Types of location input
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    /// Coordinates (latitude, longitude)
    Coordinates(f64, f64),
    /// Place name (city, region, landmark, postal code ...)
    Name(String),
}

/// Location parsing utilities
pub struct LocationParser;

impl LocationParser {
    /// Parse trimmed, non-empty location input. Returns `None` for blank
    /// input so callers can stop before touching any service.
    #[must_use]
    pub fn parse(input: &str) -> Option<LocationInput> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        if let Some((lat, lon)) = Self::parse_coordinates(input) {
            return Some(LocationInput::Coordinates(lat, lon));
        }

        Some(LocationInput::Name(input.to_string()))
    }

    /// Parse coordinates from strings like "46.8182,8.2275" or "46.8182 8.2275"
    fn parse_coordinates(input: &str) -> Option<(f64, f64)> {
        let parts: Vec<&str> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        if parts.len() != 2 {
            return None;
        }

        let lat = parts[0].parse::<f64>().ok()?;
        let lon = parts[1].parse::<f64>().ok()?;

        GeoPoint::new(lat, lon).is_valid().then_some((lat, lon))
    }
}

/// Service for resolving location inputs
pub struct LocationResolver;

impl LocationResolver {
    /// Resolve a location input into a `Location` with the given radius.
    /// `Ok(None)` when the geocoder does not know the place.
    pub async fn resolve_location(
        geocoder: &dyn Geocoder,
        location_input: LocationInput,
        radius_km: f64,
    ) -> Result<Option<Location>> {
        debug!("Resolving location input: {:?}", location_input);

        let location = match location_input {
            LocationInput::Coordinates(lat, lon) => Some(Location::new(
                format!("{lat:.4}, {lon:.4}"),
                GeoPoint::new(lat, lon),
                radius_km,
            )?),
            LocationInput::Name(name) => match geocoder.geocode(&name).await? {
                Some(place) => Some(Location::new(place.name, place.point, radius_km)?),
                None => None,
            },
        };

        if let Some(location) = &location {
            debug!(
                "Resolved location: {} at ({}, {})",
                location.name, location.latitude, location.longitude
            );
        }

        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::GeocodedPlace;
    use async_trait::async_trait;

    struct FixedGeocoder(Option<GeocodedPlace>);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, _place_name: &str) -> Result<Option<GeocodedPlace>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_location_parser_coordinates() {
        assert_eq!(
            LocationParser::parse("46.8182,8.2275"),
            Some(LocationInput::Coordinates(46.8182, 8.2275))
        );
        assert_eq!(
            LocationParser::parse("  46.8182 8.2275 "),
            Some(LocationInput::Coordinates(46.8182, 8.2275))
        );
        assert_eq!(
            LocationParser::parse("-46.8182, -8.2275"),
            Some(LocationInput::Coordinates(-46.8182, -8.2275))
        );
    }

    #[test]
    fn test_location_parser_out_of_range_is_name() {
        assert!(matches!(
            LocationParser::parse("91.0,8.0"),
            Some(LocationInput::Name(_))
        ));
        assert!(matches!(
            LocationParser::parse("46.0,-181.0"),
            Some(LocationInput::Name(_))
        ));
        assert!(matches!(
            LocationParser::parse("46.0,8.0,0.0"),
            Some(LocationInput::Name(_))
        ));
    }

    #[test]
    fn test_location_parser_names() {
        assert_eq!(
            LocationParser::parse(" New Delhi "),
            Some(LocationInput::Name("New Delhi".to_string()))
        );
        assert!(matches!(
            LocationParser::parse("248001"),
            Some(LocationInput::Name(_))
        ));
    }

    #[test]
    fn test_location_parser_blank() {
        assert_eq!(LocationParser::parse(""), None);
        assert_eq!(LocationParser::parse("   \t "), None);
    }

    #[tokio::test]
    async fn test_resolve_coordinates_skips_geocoder() {
        let geocoder = FixedGeocoder(None);
        let location = LocationResolver::resolve_location(
            &geocoder,
            LocationInput::Coordinates(46.8182, 8.2275),
            3.0,
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(location.name, "46.8182, 8.2275");
        assert_eq!(location.radius_km, 3.0);
    }

    #[tokio::test]
    async fn test_resolve_name_not_found() {
        let geocoder = FixedGeocoder(None);
        let location = LocationResolver::resolve_location(
            &geocoder,
            LocationInput::Name("Atlantis".to_string()),
            3.0,
        )
        .await
        .unwrap();
        assert!(location.is_none());
    }

    #[tokio::test]
    async fn test_resolve_name_found() {
        let geocoder = FixedGeocoder(Some(GeocodedPlace {
            name: "Pune, Maharashtra, India".to_string(),
            point: GeoPoint::new(18.5204, 73.8567),
        }));
        let location = LocationResolver::resolve_location(
            &geocoder,
            LocationInput::Name("Pune".to_string()),
            10.0,
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(location.name, "Pune, Maharashtra, India");
        assert_eq!(location.buffer_meters(), 10_000.0);
    }
}
