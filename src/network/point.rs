// Geographic point type
// Validated latitude/longitude pairs and great-circle distance helpers
//
// Numan Thabit 2025 Nov

use crate::errors::RouteError;
use geo::{HaversineDistance, Point};
use serde::{Deserialize, Serialize};

/// A WGS84 coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Result<Self, RouteError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(RouteError::InvalidCoordinate(format!(
                "latitude {lat} outside [-90, 90]"
            )));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(RouteError::InvalidCoordinate(format!(
                "longitude {lon} outside [-180, 180]"
            )));
        }
        Ok(Self { lat, lon })
    }

    /// Build from a `[lat, lon]` pair as used on the wire
    pub fn from_pair(pair: [f64; 2]) -> Result<Self, RouteError> {
        Self::new(pair[0], pair[1])
    }

    pub fn to_pair(self) -> [f64; 2] {
        [self.lat, self.lon]
    }

    /// Great-circle distance in kilometres
    pub fn haversine_km(&self, other: &GeoPoint) -> f64 {
        self.as_geo().haversine_distance(&other.as_geo()) / 1000.0
    }

    pub(crate) fn as_geo(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}
