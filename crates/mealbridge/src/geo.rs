//! Geographic primitives shared by donations and volunteers.
//!
//! Coordinates are longitude/latitude degrees, so the distance used for
//! radius comparisons is the great-circle (haversine) distance rather
//! than anything planar: a Euclidean distance on raw degrees produces
//! wrong orderings away from the equator and wrong absolute kilometres
//! everywhere.

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 point stored as `(longitude, latitude)` degrees, matching
/// the GeoJSON coordinate order used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, GeoError> {
        if !longitude.is_finite() || !latitude.is_finite() {
            return Err(GeoError::NotFinite);
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::LongitudeOutOfRange(longitude));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::LatitudeOutOfRange(latitude));
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    /// Builds a point from a raw `[longitude, latitude]` pair as sent by
    /// clients. Anything other than exactly two in-range numbers is
    /// rejected.
    pub fn from_coordinates(coordinates: &[f64]) -> Result<Self, GeoError> {
        match coordinates {
            [longitude, latitude] => Self::new(*longitude, *latitude),
            _ => Err(GeoError::MalformedPair {
                len: coordinates.len(),
            }),
        }
    }
}

/// Great-circle distance between two points in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeoError {
    #[error("coordinates must be exactly a [longitude, latitude] pair, got {len} values")]
    MalformedPair { len: usize },
    #[error("coordinates must be finite numbers")]
    NotFinite,
    #[error("longitude {0} is outside -180..=180")]
    LongitudeOutOfRange(f64),
    #[error("latitude {0} is outside -90..=90")]
    LatitudeOutOfRange(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(longitude: f64, latitude: f64) -> GeoPoint {
        GeoPoint::new(longitude, latitude).expect("valid point")
    }

    #[test]
    fn distance_to_self_is_zero() {
        let p = point(77.59, 12.97);
        assert!(haversine_km(p, p).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = point(0.0, 0.0);
        let b = point(0.0, 1.0);
        let d = haversine_km(a, b);
        assert!((d - 111.19).abs() < 0.5, "got {d}");
    }

    #[test]
    fn longitude_degrees_shrink_away_from_the_equator() {
        let equator = haversine_km(point(0.0, 0.0), point(1.0, 0.0));
        let north = haversine_km(point(0.0, 60.0), point(1.0, 60.0));
        assert!(north < equator / 1.8, "expected {north} << {equator}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = point(77.59, 12.97);
        let b = point(72.87, 19.07);
        let ab = haversine_km(a, b);
        let ba = haversine_km(b, a);
        assert!((ab - ba).abs() < 1e-9);
        // Bangalore to Mumbai is roughly 840 km.
        assert!((ab - 840.0).abs() < 15.0, "got {ab}");
    }

    #[test]
    fn rejects_malformed_pairs() {
        assert_eq!(
            GeoPoint::from_coordinates(&[1.0]),
            Err(GeoError::MalformedPair { len: 1 })
        );
        assert_eq!(
            GeoPoint::from_coordinates(&[1.0, 2.0, 3.0]),
            Err(GeoError::MalformedPair { len: 3 })
        );
        assert!(GeoPoint::from_coordinates(&[]).is_err());
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(matches!(
            GeoPoint::new(181.0, 0.0),
            Err(GeoError::LongitudeOutOfRange(_))
        ));
        assert!(matches!(
            GeoPoint::new(0.0, -90.5),
            Err(GeoError::LatitudeOutOfRange(_))
        ));
        assert_eq!(GeoPoint::new(f64::NAN, 0.0), Err(GeoError::NotFinite));
    }

    #[test]
    fn accepts_boundary_coordinates() {
        assert!(GeoPoint::new(180.0, 90.0).is_ok());
        assert!(GeoPoint::new(-180.0, -90.0).is_ok());
        assert!(GeoPoint::from_coordinates(&[77.59, 12.97]).is_ok());
    }
}
