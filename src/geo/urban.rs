//! Urban/rural classification.
//!
//! A location is urban if its address names a known major city, or if its
//! coordinate falls inside a major metro bounding box.

use crate::models::Coordinate;

/// Cities whose name in an address marks it as urban (lowercase).
const URBAN_CITIES: &[&str] = &[
    "new york",
    "manhattan",
    "brooklyn",
    "los angeles",
    "chicago",
    "houston",
    "phoenix",
    "philadelphia",
    "san antonio",
    "san diego",
    "dallas",
    "san jose",
    "austin",
    "san francisco",
    "seattle",
    "denver",
    "washington",
    "boston",
    "nashville",
    "baltimore",
    "portland",
    "las vegas",
    "detroit",
    "atlanta",
    "miami",
    "minneapolis",
];

/// A metropolitan bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetroArea {
    pub name: &'static str,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl MetroArea {
    const fn new(name: &'static str, min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            name,
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    pub fn contains(&self, c: &Coordinate) -> bool {
        c.latitude >= self.min_lat
            && c.latitude <= self.max_lat
            && c.longitude >= self.min_lon
            && c.longitude <= self.max_lon
    }
}

/// Major US metro bounding boxes.
pub const METRO_AREAS: &[MetroArea] = &[
    MetroArea::new("New York", 40.49, 40.92, -74.27, -73.68),
    MetroArea::new("Los Angeles", 33.70, 34.34, -118.67, -118.15),
    MetroArea::new("Chicago", 41.64, 42.03, -87.94, -87.52),
    MetroArea::new("Houston", 29.52, 30.11, -95.79, -95.01),
    MetroArea::new("Phoenix", 33.29, 33.92, -112.32, -111.93),
    MetroArea::new("Philadelphia", 39.87, 40.14, -75.28, -74.96),
    MetroArea::new("San Antonio", 29.22, 29.73, -98.81, -98.29),
    MetroArea::new("San Diego", 32.53, 33.11, -117.28, -116.91),
    MetroArea::new("Dallas", 32.62, 33.02, -97.00, -96.55),
    MetroArea::new("San Francisco", 37.64, 37.93, -122.52, -122.18),
    MetroArea::new("Seattle", 47.49, 47.74, -122.44, -122.24),
    MetroArea::new("Denver", 39.61, 39.91, -105.11, -104.60),
    MetroArea::new("Boston", 42.23, 42.40, -71.19, -70.92),
    MetroArea::new("Atlanta", 33.65, 33.89, -84.55, -84.29),
    MetroArea::new("Miami", 25.70, 25.86, -80.32, -80.12),
];

/// Whether an address names a known major city.
pub fn is_urban_address(address: &str) -> bool {
    let lower = address.to_lowercase();
    URBAN_CITIES.iter().any(|city| lower.contains(city))
}

/// Whether a coordinate lies inside a major metro bounding box.
pub fn is_urban_coordinate(coordinate: &Coordinate) -> bool {
    METRO_AREAS.iter().any(|m| m.contains(coordinate))
}

/// Urban if either the address or the coordinate says so.
pub fn is_urban(address: &str, coordinate: Option<&Coordinate>) -> bool {
    is_urban_address(address) || coordinate.is_some_and(is_urban_coordinate)
}
