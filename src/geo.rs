//! Great-circle distance and random destination generation.
//!
//! Distances are kilometers. Offsets, radii and steps are degrees.

use std::f64::consts::TAU;
use rand::Rng;
use crate::models::position::Coordinate;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Roughly 2 km at mid latitudes.
pub const DEFAULT_DESTINATION_RADIUS_DEG: f64 = 0.018;
pub const DEFAULT_KEY_STEP_DEG: f64 = 0.0005;
pub const DEFAULT_ARRIVAL_THRESHOLD_KM: f64 = 0.05;

/// Floor for `|cos(latitude)|` when scaling longitude offsets near the poles.
pub const MIN_MERIDIAN_SCALE: f64 = 1e-6;

/// Haversine distance between `a` and `b`.
pub fn haversine_distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // rounding can push h past 1 for near-antipodal points
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Displaces `origin` by `distance` degrees along `angle` (radians, 0 = east).
///
/// The longitude component is stretched by `1 / cos(latitude)` so the offset
/// covers the same ground in both axes. The result latitude is clamped to
/// [-90, 90] and longitude wrapped into [-180, 180).
pub fn offset_point(origin: Coordinate, angle: f64, distance: f64) -> Coordinate {
    let scale = meridian_scale(origin.latitude);

    let latitude = origin.latitude + distance * angle.sin();
    let longitude = origin.longitude + distance * angle.cos() / scale;

    Coordinate::new(latitude.clamp(-90.0, 90.0), wrap_longitude(longitude))
}

/// A point at a uniformly random angle and a uniformly random distance in
/// `[0, radius_degrees)` from `origin`.
///
/// A radius that is not a positive finite number yields `origin`.
///
/// The spread is denser near the center, which is fine for placing a
/// destination but not for uniform area sampling.
pub fn random_nearby_point<R>(origin: Coordinate, radius_degrees: f64, rng: &mut R) -> Coordinate
    where R: Rng + ?Sized {
    if !radius_degrees.is_finite() || radius_degrees <= 0.0 {
        return origin;
    }
    let angle = rng.random_range(0.0..TAU);
    let distance = rng.random_range(0.0..radius_degrees);
    offset_point(origin, angle, distance)
}

fn meridian_scale(latitude: f64) -> f64 {
    let cos = latitude.to_radians().cos();
    if cos.abs() < MIN_MERIDIAN_SCALE {
        MIN_MERIDIAN_SCALE.copysign(cos)
    } else {
        cos
    }
}

fn wrap_longitude(longitude: f64) -> f64 {
    if (-180.0..180.0).contains(&longitude) {
        longitude
    } else {
        let wrapped = (longitude + 180.0).rem_euclid(360.0) - 180.0;
        // rem_euclid can round up to exactly 360
        if wrapped >= 180.0 { -180.0 } else { wrapped }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let points = [
            Coordinate::new(0.0, 0.0),
            Coordinate::new(40.7128, -74.006),
            Coordinate::new(-89.9, 179.9),
        ];
        for c in points {
            assert_eq!(haversine_distance_km(c, c), 0.0);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let a = Coordinate::new(rng.random_range(-90.0..90.0), rng.random_range(-180.0..180.0));
            let b = Coordinate::new(rng.random_range(-90.0..90.0), rng.random_range(-180.0..180.0));
            let ab = haversine_distance_km(a, b);
            let ba = haversine_distance_km(b, a);
            assert!((ab - ba).abs() < 1e-9, "{ab} != {ba}");
        }
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = haversine_distance_km(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0));
        assert!((d - 111.19).abs() < 0.01, "got {d}");
    }

    #[test]
    fn antipodal_points_are_half_the_circumference() {
        let half = std::f64::consts::PI * EARTH_RADIUS_KM;
        for step in 0..=9_000 {
            let lat = step as f64 * 0.01;
            let d = haversine_distance_km(Coordinate::new(lat, 0.0), Coordinate::new(-lat, 180.0));
            assert!(d.is_finite(), "NaN at latitude {lat}");
            assert!((d - half).abs() < 1e-3, "got {d} at latitude {lat}");
        }
    }

    #[test]
    fn nyc_to_la() {
        let nyc = Coordinate::new(40.7128, -74.0060);
        let la = Coordinate::new(34.0522, -118.2437);
        assert!((haversine_distance_km(nyc, la) - 3936.0).abs() < 5.0);
    }

    #[test]
    fn random_point_stays_within_radius() {
        let mut rng = StdRng::seed_from_u64(42);
        let origin = Coordinate::new(40.0, -75.0);
        let radius = DEFAULT_DESTINATION_RADIUS_DEG;
        let scale = origin.latitude.to_radians().cos();

        for _ in 0..10_000 {
            let p = random_nearby_point(origin, radius, &mut rng);
            let d_lat = p.latitude - origin.latitude;
            let d_lon = (p.longitude - origin.longitude) * scale;
            assert!((d_lat * d_lat + d_lon * d_lon).sqrt() < radius + 1e-12);
        }
    }

    #[test]
    fn north_offset_moves_latitude_only() {
        let radius = 0.018;
        let p = offset_point(Coordinate::new(40.0, -75.0), FRAC_PI_2, radius);
        assert!((p.latitude - (40.0 + radius)).abs() < 1e-12);
        assert!((p.longitude - -75.0).abs() < 1e-12);
    }

    #[test]
    fn east_offset_is_stretched_by_latitude() {
        let radius = 0.018;
        let p = offset_point(Coordinate::new(40.0, -75.0), 0.0, radius);
        assert_eq!(p.latitude, 40.0);
        let expected = -75.0 + radius / 40.0_f64.to_radians().cos();
        assert!((p.longitude - expected).abs() < 1e-12);
    }

    #[test]
    fn zero_radius_returns_origin() {
        let mut rng = StdRng::seed_from_u64(1);
        let origin = Coordinate::new(12.0, 34.0);
        assert_eq!(random_nearby_point(origin, 0.0, &mut rng), origin);
    }

    #[test]
    fn non_finite_radius_returns_origin() {
        let mut rng = StdRng::seed_from_u64(1);
        let origin = Coordinate::new(12.0, 34.0);
        for radius in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            assert_eq!(random_nearby_point(origin, radius, &mut rng), origin);
        }
    }

    #[test]
    fn pole_offsets_stay_finite() {
        let mut rng = StdRng::seed_from_u64(3);
        for origin in [Coordinate::new(90.0, 0.0), Coordinate::new(-90.0, 10.0)] {
            for _ in 0..1_000 {
                let p = random_nearby_point(origin, 0.5, &mut rng);
                assert!(p.latitude.is_finite() && p.longitude.is_finite());
                assert!((-90.0..=90.0).contains(&p.latitude));
                assert!((-180.0..180.0).contains(&p.longitude));
            }
        }
    }

    #[test]
    fn longitude_wraps_across_antimeridian() {
        let p = offset_point(Coordinate::new(0.0, 179.99), 0.0, 0.02);
        assert!((p.longitude - -179.99).abs() < 1e-9, "got {}", p.longitude);
    }
}
