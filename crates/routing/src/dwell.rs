use std::f64::consts::TAU;

use rand::Rng;
use shared::domain::{Coordinate, LATITUDE_RANGE, LONGITUDE_RANGE};

pub const DEFAULT_DWELL_POINTS: usize = 10;
pub const DEFAULT_MIN_RADIUS_M: f64 = 0.002;
pub const DEFAULT_MAX_RADIUS_M: f64 = 0.004;

/// Approximate metres per degree of latitude.
const METERS_PER_DEGREE: f64 = 111_111.0;

/// Jittered copies of `center` that mimic the drift of a stationary GPS
/// receiver. Each point sits at a uniformly random bearing and a uniformly
/// random distance within `[min_radius_m, max_radius_m]`.
pub fn dwell_points<R>(
    center: Coordinate,
    count: usize,
    min_radius_m: f64,
    max_radius_m: f64,
    rng: &mut R,
) -> Vec<Coordinate>
where
    R: Rng + ?Sized,
{
    let (min_radius_m, max_radius_m) = if min_radius_m <= max_radius_m {
        (min_radius_m.max(0.0), max_radius_m.max(0.0))
    } else {
        (max_radius_m.max(0.0), min_radius_m.max(0.0))
    };
    let cos_lat = center.latitude.to_radians().cos();

    (0..count)
        .map(|_| {
            let bearing = rng.gen_range(0.0..TAU);
            let distance = rng.gen_range(min_radius_m..=max_radius_m);

            let delta_lat = distance * bearing.sin() / METERS_PER_DEGREE;
            // Longitude degrees shrink towards the poles; at the pole there is nothing to shift.
            let delta_lon = if cos_lat.abs() > f64::EPSILON {
                distance * bearing.cos() / (METERS_PER_DEGREE * cos_lat)
            } else {
                0.0
            };

            Coordinate::new(
                (center.latitude + delta_lat).clamp(LATITUDE_RANGE.0, LATITUDE_RANGE.1),
                (center.longitude + delta_lon).clamp(LONGITUDE_RANGE.0, LONGITUDE_RANGE.1),
            )
        })
        .collect()
}
