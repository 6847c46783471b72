use chrono::{DateTime, Utc};
use geoutils::Location;

use crate::PositionFix;

static METER_TO_NAUTICAL_MILES: f64 = 0.0005399568;

/// Mean Earth radius in nautical miles, used for dead reckoning.
pub const EARTH_RADIUS_NM: f64 = 3440.065;

/// Additive slack on the allowed discrepancy, in nautical miles per
/// square-root hour, modelling forecast uncertainty growth.
pub const FORECAST_SLACK_NM: f64 = 4.0;

/// Floor on elapsed time when deriving speeds from distances, so that
/// near-simultaneous fixes do not produce unbounded implied speeds.
pub const MIN_ELAPSED_HOURS: f64 = 1.0 / 3600.0;

/// Great-circle distance between two fixes in nautical miles.
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    Location::new(lat1, lon1)
        .haversine_distance_to(&Location::new(lat2, lon2))
        .meters()
        * METER_TO_NAUTICAL_MILES
}

/// Initial great-circle bearing from the first fix to the second, in
/// degrees within `[0, 360)`.
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Dead-reckoned position after holding `course` (degrees) and `speed`
/// (knots) for `hours`, starting from `(lat, lon)`.
pub fn project(lat: f64, lon: f64, course: f64, speed: f64, hours: f64) -> (f64, f64) {
    let delta = speed * hours / EARTH_RADIUS_NM;
    let theta = course.to_radians();
    let phi1 = lat.to_radians();
    let lambda1 = lon.to_radians();

    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

    let lon2 = (lambda2.to_degrees() + 540.0) % 360.0 - 180.0;
    (phi2.to_degrees(), lon2)
}

/// Nautical miles between the observed fix and the position dead reckoned
/// from the previous fix. Falls back to the plain great-circle distance
/// when the previous course or speed is unusable.
pub fn discrepancy(prev: &PositionFix, obs: &PositionFix) -> f64 {
    match (prev.course, prev.speed) {
        (Some(course), Some(speed)) => {
            let elapsed = hours(prev.timestamp, obs.timestamp);
            let (lat, lon) = project(prev.lat, prev.lon, course, speed, elapsed);
            distance(lat, lon, obs.lat, obs.lon)
        }
        _ => distance(prev.lat, prev.lon, obs.lat, obs.lon),
    }
}

/// Largest discrepancy still considered continuous after `hours`.
/// Monotone non-decreasing, with a floor of `buffer_nm` absorbing GPS
/// noise at very small deltas.
pub fn max_allowed_discrepancy(hours: f64, penalty_speed: f64, buffer_nm: f64) -> f64 {
    penalty_speed * hours + buffer_nm + FORECAST_SLACK_NM * hours.sqrt()
}

/// Speed in knots a vessel must have held to cover `distance_nm` in
/// `hours`.
pub fn implied_speed(distance_nm: f64, hours: f64) -> f64 {
    distance_nm / hours.max(MIN_ELAPSED_HOURS)
}

/// Elapsed time from `a` to `b` in hours.
pub fn hours(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    (b - a).num_milliseconds() as f64 / 3_600_000.0
}
