//! Geodesic distance and the distance-to-steps heuristic.
//!
//! Haversine on a spherical-Earth model, then a fixed steps-per-mile
//! calibration. Deliberately simple: no sensor fusion or dead reckoning,
//! just the heuristic the challenge totals are calibrated against.

use crate::location::Coordinate;

/// Mean Earth radius in meters (spherical model).
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Meters per statute mile.
pub const METERS_PER_MILE: f64 = 1_609.34;

/// Fixed calibration constant: average walking steps per mile.
pub const STEPS_PER_MILE: f64 = 2_000.0;

/// Great-circle distance in meters between two WGS84 coordinates.
///
/// Pure and total. Non-finite inputs propagate NaN; callers validate
/// coordinates at the sample intake boundary before conversion.
pub fn meters_between(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Estimated step count for a traveled distance, rounded to the nearest
/// whole step. Never negative; non-finite input yields 0.
pub fn steps_for_meters(meters: f64) -> i64 {
    if !meters.is_finite() || meters <= 0.0 {
        return 0;
    }
    (meters / METERS_PER_MILE * STEPS_PER_MILE).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate {
            latitude,
            longitude,
        }
    }

    #[test]
    fn distance_to_self_is_zero() {
        let a = coord(48.8584, 2.2945);
        assert_eq!(meters_between(a, a), 0.0);
        assert_eq!(steps_for_meters(meters_between(a, a)), 0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = coord(40.7128, -74.0060);
        let b = coord(51.5074, -0.1278);
        let ab = meters_between(a, b);
        let ba = meters_between(b, a);
        assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = coord(10.0, 20.0);
        let b = coord(11.0, 20.0);
        let meters = meters_between(a, b);
        assert!((meters - 111_195.0).abs() < 100.0, "got {}", meters);
    }

    #[test]
    fn one_meter_rounds_to_one_step() {
        // ~1 m of latitude at the equator.
        let a = coord(0.0, 0.0);
        let b = coord(0.000009, 0.0);
        let meters = meters_between(a, b);
        assert!(meters > 0.5 && meters < 1.5, "got {}", meters);
        assert_eq!(steps_for_meters(meters), 1);
    }

    #[test]
    fn a_mile_is_two_thousand_steps() {
        assert_eq!(steps_for_meters(METERS_PER_MILE), 2000);
        assert_eq!(steps_for_meters(METERS_PER_MILE * 0.5), 1000);
    }

    #[test]
    fn eight_hundred_meters_is_994_steps() {
        assert_eq!(steps_for_meters(800.0), 994);
    }

    #[test]
    fn steps_never_negative_or_nan() {
        assert_eq!(steps_for_meters(-5.0), 0);
        assert_eq!(steps_for_meters(f64::NAN), 0);
        assert_eq!(steps_for_meters(f64::INFINITY), 0);
        assert_eq!(steps_for_meters(0.0), 0);
    }
}
