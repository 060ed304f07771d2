use geogift_types::models::{GeoPoint, LocationCheck};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius, the value Solidity haversine ports use.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters.
pub fn haversine_distance_m(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlng = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for antipodal points.
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Advisory radius check. The contract repeats it against its own stored
/// target and may still reject.
pub fn validate_location(target: &GeoPoint, user: &GeoPoint, radius_meters: u32) -> LocationCheck {
    let distance_meters = haversine_distance_m(target, user);
    LocationCheck {
        distance_meters,
        radius_meters,
        within_radius: distance_meters <= f64::from(radius_meters),
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("radius {radius} m outside allowed range {min}..={max} m")]
pub struct RadiusOutOfRange {
    pub radius: u32,
    pub min: u32,
    pub max: u32,
}

/// Accepted GPS radius range for new gifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadiusLimits {
    pub min_m: u32,
    pub max_m: u32,
}

impl Default for RadiusLimits {
    fn default() -> Self {
        Self { min_m: 5, max_m: 1000 }
    }
}

impl RadiusLimits {
    pub fn check(&self, radius: u32) -> Result<u32, RadiusOutOfRange> {
        if (self.min_m..=self.max_m).contains(&radius) {
            Ok(radius)
        } else {
            Err(RadiusOutOfRange { radius, min: self.min_m, max: self.max_m })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint::new(latitude, longitude).unwrap()
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = haversine_distance_m(&point(0.0, 0.0), &point(1.0, 0.0));
        assert!((d - 111_194.93).abs() < 1.0, "{}", d);
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let paris = point(48.8566, 2.3522);
        let london = point(51.5074, -0.1278);
        assert_eq!(haversine_distance_m(&paris, &paris), 0.0);
        let there = haversine_distance_m(&paris, &london);
        let back = haversine_distance_m(&london, &paris);
        assert!((there - back).abs() < 1e-6);
        assert!((there - 343_500.0).abs() < 1_500.0, "{}", there);
    }

    #[test]
    fn antipodes_do_not_nan() {
        let d = haversine_distance_m(&point(0.0, 0.0), &point(0.0, 180.0));
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_M).abs() < 1.0);
    }

    #[test]
    fn radius_check() {
        let target = point(40.7128, -74.0060);
        let near = point(40.7130, -74.0060);
        let check = validate_location(&target, &near, 50);
        assert!(check.within_radius);
        assert!(check.distance_meters > 20.0 && check.distance_meters < 25.0);

        let far = point(40.7228, -74.0060);
        assert!(!validate_location(&target, &far, 50).within_radius);
    }

    #[test]
    fn radius_limits() {
        let limits = RadiusLimits::default();
        assert_eq!(limits.check(5), Ok(5));
        assert_eq!(limits.check(1000), Ok(1000));
        assert_eq!(
            limits.check(4),
            Err(RadiusOutOfRange { radius: 4, min: 5, max: 1000 })
        );
        assert!(limits.check(1001).is_err());
    }
}
