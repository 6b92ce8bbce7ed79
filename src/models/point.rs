//! Geographic coordinate value type.

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate in decimal degrees.
///
/// # Examples
///
/// ```
/// use busroute::models::Point;
///
/// let p = Point::new(1.3521, 103.8198);
/// assert_eq!(p.lat, 1.3521);
/// assert_eq!(p.lng, 103.8198);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
}

impl Point {
    /// Creates a point from latitude and longitude.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}
