//! Great-circle geometry and travel-time estimation.
//!
//! All functions are pure and deterministic; they sit on the hot path of
//! distance-matrix construction (O(n²) calls per matrix).
//!
//! # Units
//! Distances are statute miles rounded to 2 decimals, travel times are
//! whole minutes.
//!
//! # Reference
//! Sinnott (1984), "Virtues of the Haversine", Sky and Telescope 68(2)

mod urban;

pub use urban::{is_urban, is_urban_address, is_urban_coordinate, MetroArea, METRO_AREAS};

use crate::models::Coordinate;

/// Mean Earth radius in miles.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Average urban driving speed (mph).
pub const URBAN_SPEED_MPH: f64 = 25.0;

/// Average rural driving speed (mph).
pub const RURAL_SPEED_MPH: f64 = 45.0;

/// Travel-time padding for urban legs (traffic, parking).
pub const URBAN_BUFFER: f64 = 1.3;

/// Travel-time padding for rural legs.
pub const RURAL_BUFFER: f64 = 1.1;

/// Rounds to 2 decimal places.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Great-circle distance between two coordinates in miles, rounded to
/// 2 decimals.
///
/// Symmetric, and zero for identical points.
///
/// # Example
/// ```
/// use u_fieldops::geo::haversine_miles;
/// use u_fieldops::models::Coordinate;
///
/// let nyc = Coordinate::new(40.7128, -74.0060);
/// let la = Coordinate::new(34.0522, -118.2437);
/// let d = haversine_miles(&nyc, &la);
/// assert!((d - 2451.0).abs() < 24.51);
/// ```
pub fn haversine_miles(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());
    round2(EARTH_RADIUS_MILES * c)
}

/// Estimated driving time in minutes for `distance_miles`.
///
/// Urban legs assume 25 mph padded ×1.3; rural legs 45 mph padded ×1.1.
pub fn estimate_travel_time(distance_miles: f64, is_urban: bool) -> u32 {
    let (speed, buffer) = if is_urban {
        (URBAN_SPEED_MPH, URBAN_BUFFER)
    } else {
        (RURAL_SPEED_MPH, RURAL_BUFFER)
    };
    let minutes = distance_miles.max(0.0) / speed * 60.0 * buffer;
    minutes.round() as u32
}

/// Arithmetic mean position of a point set. `None` for an empty set.
pub fn centroid<'a, I>(points: I) -> Option<Coordinate>
where
    I: IntoIterator<Item = &'a Coordinate>,
{
    let (mut lat, mut lon, mut n) = (0.0, 0.0, 0usize);
    for p in points {
        lat += p.latitude;
        lon += p.longitude;
        n += 1;
    }
    (n > 0).then(|| Coordinate::new(lat / n as f64, lon / n as f64))
}
