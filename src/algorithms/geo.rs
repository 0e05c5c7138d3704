//! Spherical geodesy helpers
//!
//! Distances use the haversine formula on a sphere of radius
//! [`EARTH_RADIUS_M`]. Inputs outside WGS84 bounds are not rejected.

use crate::core::{GeoPoint, EARTH_RADIUS_M, KILOMETER_THRESHOLD_M};

/// Great-circle distance between two points in meters
pub fn distance_meters(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    // Rounding can push h a hair above 1 for antipodal points
    2.0 * EARTH_RADIUS_M * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Forward azimuth from `a` to `b`, degrees clockwise from North in [0, 360)
pub fn initial_bearing_degrees(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let x = dlon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    wrap_360(x.atan2(y).to_degrees())
}

/// Normalize an angle into [0, 360)
pub fn wrap_360(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Human-readable distance: whole meters below 1 km, otherwise km with two decimals
pub fn format_distance(meters: f64) -> String {
    if meters < KILOMETER_THRESHOLD_M {
        format!("{:.0} m", meters.round())
    } else {
        format!("{:.2} km", meters / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon)
    }

    #[test]
    fn test_distance_same_point_is_zero() {
        let points = [pt(48.2082, 16.3738), pt(0.0, 0.0), pt(-89.9, 179.9), pt(90.0, 0.0)];
        for p in &points {
            assert_eq!(distance_meters(p, p), 0.0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let pairs = [
            (pt(48.2082, 16.3738), pt(48.1486, 17.1077)),
            (pt(51.5074, -0.1278), pt(40.7128, -74.0060)),
            (pt(-33.8688, 151.2093), pt(35.6762, 139.6503)),
            (pt(0.0, 179.5), pt(0.0, -179.5)),
        ];
        for (a, b) in &pairs {
            assert_eq!(distance_meters(a, b), distance_meters(b, a));
        }
    }

    #[test]
    fn test_distance_known_values() {
        // Vienna to Bratislava is roughly 55 km
        let dist = distance_meters(&pt(48.2082, 16.3738), &pt(48.1486, 17.1077));
        assert!(dist > 50_000.0 && dist < 60_000.0, "got {:.0} m", dist);

        // One degree of longitude on the equator
        let degree = distance_meters(&pt(0.0, 0.0), &pt(0.0, 1.0));
        assert!((degree - 111_194.9).abs() < 1.0, "got {:.1} m", degree);

        // Antipodes are half the circumference apart
        let half = distance_meters(&pt(0.0, 0.0), &pt(0.0, 180.0));
        assert!((half - std::f64::consts::PI * EARTH_RADIUS_M).abs() < 1e-3);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = pt(0.0, 0.0);
        assert!((initial_bearing_degrees(&origin, &pt(1.0, 0.0)) - 0.0).abs() < 1e-9);
        assert!((initial_bearing_degrees(&origin, &pt(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((initial_bearing_degrees(&origin, &pt(-1.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!((initial_bearing_degrees(&origin, &pt(0.0, -1.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_always_in_range() {
        let points = [
            pt(0.0, 0.0),
            pt(48.2, 16.37),
            pt(-45.0, -170.0),
            pt(89.0, 179.0),
            pt(-89.0, -179.0),
            pt(10.0, -0.000001),
        ];
        for a in &points {
            for b in &points {
                let bearing = initial_bearing_degrees(a, b);
                assert!((0.0..360.0).contains(&bearing), "{:?} -> {:?} = {}", a, b, bearing);
            }
        }
    }

    #[test]
    fn test_bearing_not_simply_reversed() {
        // Along a parallel the reverse azimuth differs from bearing + 180
        let a = pt(50.0, 0.0);
        let b = pt(50.0, 10.0);
        let forward = initial_bearing_degrees(&a, &b);
        let back = initial_bearing_degrees(&b, &a);
        assert!((wrap_360(forward + 180.0) - back).abs() > 1.0);
    }

    #[test]
    fn test_wrap_360() {
        assert_eq!(wrap_360(360.0), 0.0);
        assert_eq!(wrap_360(-10.0), 350.0);
        assert_eq!(wrap_360(725.0), 5.0);
        assert!(wrap_360(-1e-20) < 360.0);
    }

    #[test]
    fn test_format_distance_kilometer_boundary() {
        assert_eq!(format_distance(999.0), "999 m");
        assert_eq!(format_distance(1000.0), "1.00 km");
        assert_eq!(format_distance(1500.0), "1.50 km");
        assert_eq!(format_distance(999.99), "1000 m");
        assert_eq!(format_distance(1000.001), "1.00 km");
    }

    #[test]
    fn test_format_distance_rounds_meters() {
        assert_eq!(format_distance(0.0), "0 m");
        assert_eq!(format_distance(12.4), "12 m");
        assert_eq!(format_distance(12.5), "13 m");
        assert_eq!(format_distance(12_346.0), "12.35 km");
    }
}
