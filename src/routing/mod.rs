//! Road-routing collaborator interface.
//!
//! The engine consumes a single capability: driving distance, time, and
//! geometry between two points. It is exercised only while enriching a
//! chosen plan — never inside the solver's hot loop — and any failure
//! degrades to the geodesic estimate in [`RouteLeg::fallback`].

mod osrm;

pub use osrm::{OsrmClient, OsrmConfig};

use thiserror::Error;

use crate::geo;
use crate::models::Point;

/// Driving distance, time, and road geometry for one leg.
#[derive(Debug, Clone)]
pub struct RouteLeg {
    pub distance_km: f64,
    pub duration_secs: f64,
    /// At least two points once a leg reaches a plan.
    pub geometry: Vec<Point>,
}

impl RouteLeg {
    /// Geodesic estimate with a straight-line geometry, used whenever the
    /// road service cannot answer.
    pub fn fallback(from: Point, to: Point) -> Self {
        let distance_km = geo::haversine_km(from, to);
        Self {
            distance_km,
            duration_secs: geo::travel_time_secs(distance_km),
            geometry: vec![from, to],
        }
    }
}

/// Errors from the road-routing collaborator.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("routing service returned status {0}")]
    Status(u16),

    #[error("no route between the given points")]
    NoRoute,

    #[error("malformed routing response: {0}")]
    Malformed(String),
}

/// Returns driving distance, time, and road geometry between two points.
///
/// Implementations may retry internally; the engine itself never does.
pub trait RoutingClient: Send + Sync {
    fn route(&self, from: Point, to: Point) -> Result<RouteLeg, RoutingError>;
}

/// Offline collaborator answering every request with the geodesic estimate.
///
/// Useful for tests and for running the planner without a road service;
/// plans come out with straight-line segment geometry.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeodesicRouter;

impl RoutingClient for GeodesicRouter {
    fn route(&self, from: Point, to: Point) -> Result<RouteLeg, RoutingError> {
        Ok(RouteLeg::fallback(from, to))
    }
}
