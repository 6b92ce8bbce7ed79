//! Domain model types for school-bus route planning.
//!
//! Points, students, and the school are created by the ingest layer and are
//! read-only inside the engine. Routes and segments are produced by the
//! solver, enriched exactly once with road geometry, and returned to the
//! caller as part of a [`Plan`].

mod plan;
mod point;
mod route;
mod student;

pub use plan::{ClusterMarker, ClusterVisualization, IsolatedMarker, Plan};
pub use point::Point;
pub use route::{Route, RouteSegment, RETURN_LABEL};
pub use student::{School, Student};

/// Rounds to one decimal place, matching the plan payload contract.
pub(crate) fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Rounds to two decimal places, matching the plan payload contract.
pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
