//! Great-circle distance on a spherical Earth

use geomoran_core::GeoPoint;

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers between two points.
///
/// Haversine formula on a sphere of radius [`EARTH_RADIUS_KM`].
/// Identical coordinates give exactly `0.0`.
#[inline]
pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    haversine(a.lat(), a.lng(), b.lat(), b.lng())
}

/// Haversine distance in kilometers from raw degree coordinates.
///
/// The intermediate term is clamped to `[0, 1]` so round-off near
/// antipodal points cannot push `sqrt(1 - a)` out of its domain.
pub fn haversine(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let s_phi = (d_phi / 2.0).sin();
    let s_lambda = (d_lambda / 2.0).sin();
    let a = (s_phi * s_phi + phi1.cos() * phi2.cos() * s_lambda * s_lambda).clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn p(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    #[test]
    fn test_coincident_is_zero() {
        let a = p(-7.21666666667, 146.25);
        assert_eq!(haversine_km(&a, &a), 0.0);
        assert_eq!(haversine(43.0, 143.0, 43.0, 143.0), 0.0);
    }

    #[test]
    fn test_antipodal_half_circumference() {
        assert_relative_eq!(
            haversine_km(&p(0.0, 0.0), &p(0.0, 180.0)),
            PI * EARTH_RADIUS_KM,
            epsilon = 1e-6
        );
        assert_relative_eq!(
            haversine_km(&p(90.0, 0.0), &p(-90.0, 0.0)),
            PI * EARTH_RADIUS_KM,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_one_degree_on_equator() {
        // 2πR / 360
        assert_relative_eq!(
            haversine(0.0, 0.0, 0.0, 1.0),
            111.194_926_644_558_73,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_symmetric_and_dateline() {
        let a = p(10.0, 179.5);
        let b = p(10.0, -179.5);
        assert_relative_eq!(haversine_km(&a, &b), haversine_km(&b, &a), epsilon = 1e-12);
        // Crossing the antimeridian is a short hop, not half the globe
        assert!(haversine_km(&a, &b) < 120.0);
    }
}
