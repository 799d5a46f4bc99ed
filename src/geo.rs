//! Geodesic distance oracle.
//!
//! Great-circle (spherical law of haversines) distance on a mean-earth-
//! radius sphere, matching the reference's use of `geopy`'s `great_circle`.

use crate::model::Location;

/// Mean earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two locations, in kilometres.
///
/// Symmetric and returns 0 for identical inputs.
pub fn haversine_km(a: Location, b: Location) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lon = (delta_lon / 2.0).sin();
    let h = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lon * sin_lon;

    2.0 * EARTH_RADIUS_KM * h.sqrt().clamp(0.0, 1.0).asin()
}

/// Round a kilometre distance to the nearest integer with the +0.5 bias
/// the reference pre-clusterer uses for its distance matrix and tie-break
/// ordering (spec §4.3, §4.1).
pub fn round_km(km: f64) -> i64 {
    (km + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_identical_points() {
        let a = Location::new(48.8566, 2.3522).unwrap();
        assert_eq!(haversine_km(a, a), 0.0);
    }

    #[test]
    fn symmetric() {
        let a = Location::new(48.8566, 2.3522).unwrap();
        let b = Location::new(40.7128, -74.0060).unwrap();
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
    }

    #[test]
    fn matches_known_distance_paris_new_york() {
        let paris = Location::new(48.8566, 2.3522).unwrap();
        let new_york = Location::new(40.7128, -74.0060).unwrap();
        let d = haversine_km(paris, new_york);
        // Known great-circle distance is ~5837 km; allow generous tolerance
        // since this is a simple sphere model, not an ellipsoidal one.
        assert!((d - 5837.0).abs() < 50.0, "distance was {d}");
    }

    #[test]
    fn round_km_applies_half_bias() {
        assert_eq!(round_km(0.4), 0);
        assert_eq!(round_km(0.5), 1);
        assert_eq!(round_km(1.49), 1);
        assert_eq!(round_km(1.5), 2);
    }
}
