//! Spherical geometry for runway- and helipad-scale distances.
//!
//! Everything here works on a sphere of radius [`EARTH_RADIUS_M`]. That is
//! accurate enough for spans of a few kilometers; nothing here attempts
//! ellipsoidal corrections.

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculate distance between two points in meters using Haversine formula.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
///
/// # Returns
/// Distance in meters
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Initial great-circle bearing from point 1 to point 2.
/// Returns degrees in [0, 360), 0 = north, 90 = east.
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    let degrees = x.atan2(y).to_degrees().rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs.
    if degrees >= 360.0 {
        0.0
    } else {
        degrees
    }
}

/// Arithmetic mean of two decimal positions, as (lat, lon).
///
/// This is not the spherical midpoint. For two runway thresholds the
/// difference is well under a meter.
pub fn midpoint(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> (f64, f64) {
    ((lat1 + lat2) / 2.0, (lon1 + lon2) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Move `distance_m` from a point along `bearing_deg`. Test helper only.
    fn offset_by_bearing(lat: f64, lon: f64, distance_m: f64, bearing_deg: f64) -> (f64, f64) {
        let lat1 = lat.to_radians();
        let lon1 = lon.to_radians();
        let bearing_rad = bearing_deg.to_radians();
        let angular = distance_m / EARTH_RADIUS_M;

        let sin_lat2 = lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing_rad.cos();
        let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();
        let y = bearing_rad.sin() * angular.sin() * lat1.cos();
        let x = angular.cos() - lat1.sin() * sin_lat2;
        (lat2.to_degrees(), (lon1 + y.atan2(x)).to_degrees())
    }

    fn angular_gap(a: f64, b: f64) -> f64 {
        let diff = (a - b).rem_euclid(360.0);
        diff.min(360.0 - diff)
    }

    #[test]
    fn test_distance_known_value() {
        // ~111km between these points (1 degree latitude)
        let dist = distance(0.0, 0.0, 1.0, 0.0);
        assert!((dist - 111_195.0).abs() < 1.0);
    }

    #[test]
    fn test_distance_same_point() {
        let dist = distance(-34.6083, -58.3817, -34.6083, -58.3817);
        assert!(dist < 0.001);
    }

    #[test]
    fn distance_is_symmetric() {
        let points = [
            (-34.608_333, -58.381_667),
            (-34.611_667, -58.386_111),
            (-31.4201, -64.1888),
            (-54.8019, -68.3030),
            (0.0, 0.0),
        ];
        for a in points {
            for b in points {
                assert_eq!(distance(a.0, a.1, b.0, b.1), distance(b.0, b.1, a.0, a.1));
            }
        }
    }

    #[test]
    fn bearing_cardinal_directions() {
        assert!(bearing(-34.0, -58.0, -33.9, -58.0).abs() < 1e-9);
        assert!((bearing(-34.0, -58.0, -34.1, -58.0) - 180.0).abs() < 1e-9);
        assert!((bearing(0.0, -58.0, 0.0, -57.9) - 90.0).abs() < 1e-9);
        assert!((bearing(0.0, -58.0, 0.0, -58.1) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn bearing_stays_in_range() {
        for step in 0..72 {
            let heading = step as f64 * 5.0;
            let (lat, lon) = offset_by_bearing(-34.6, -58.4, 1_500.0, heading);
            let b = bearing(-34.6, -58.4, lat, lon);
            assert!((0.0..360.0).contains(&b));
            assert!(angular_gap(b, heading) < 1e-6, "heading {heading} got {b}");
        }
    }

    #[test]
    fn short_span_bearings_are_nearly_antiparallel() {
        for step in 0..36 {
            let heading = step as f64 * 10.0 + 3.0;
            let (lat, lon) = offset_by_bearing(-34.6, -58.4, 5_000.0, heading);
            let forward = bearing(-34.6, -58.4, lat, lon);
            let back = bearing(lat, lon, -34.6, -58.4);
            assert!(
                angular_gap(forward + 180.0, back) < 1.0,
                "forward {forward} back {back}"
            );
        }
    }

    #[test]
    fn worked_example_geometry() {
        let (lat1, lon1) = (-34.608_333_333, -58.381_666_667);
        let (lat2, lon2) = (-34.611_666_667, -58.386_111_111);

        let dist = distance(lat1, lon1, lat2, lon2);
        assert!((dist - 550.3).abs() < 1.0, "got {dist}");

        let b = bearing(lat1, lon1, lat2, lon2);
        assert!((b - 227.66).abs() < 0.05, "got {b}");

        let (mid_lat, mid_lon) = midpoint(lat1, lon1, lat2, lon2);
        assert!((mid_lat - (-34.61)).abs() < 1e-9);
        assert!((mid_lon - (-58.383_888_889)).abs() < 1e-9);
    }
}
