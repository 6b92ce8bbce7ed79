//! Geodesic primitives and travel-time estimation.
//!
//! All distances are great-circle (haversine) kilometers on a spherical
//! Earth. Travel times assume the residential average speed used throughout
//! the planner; the real road network is consulted only when a finished plan
//! is enriched (see [`crate::routing`]).

pub mod polyline;

use crate::models::Point;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Assumed average driving speed in residential areas, km/h.
pub const AVERAGE_SPEED_KMH: f64 = 30.0;

/// Great-circle distance between two points in kilometers.
///
/// # Examples
///
/// ```
/// use busroute::models::Point;
/// use busroute::geo::haversine_km;
///
/// let a = Point::new(1.3521, 103.8198);
/// let b = Point::new(1.2906, 103.8520);
/// let d = haversine_km(a, b);
/// assert!(d > 7.0 && d < 9.0);
/// assert_eq!(haversine_km(a, a), 0.0);
/// ```
pub fn haversine_km(a: Point, b: Point) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Estimated driving time in seconds for a distance in kilometers.
pub fn travel_time_secs(distance_km: f64) -> f64 {
    distance_km / AVERAGE_SPEED_KMH * 3600.0
}
