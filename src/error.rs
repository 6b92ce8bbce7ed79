//! Planner error types.

use thiserror::Error;

/// Errors surfaced to the caller of the route optimizer.
///
/// Validation errors are returned before the optimizer runs. A solver that
/// finds no routes is not an error: it yields a plan with empty routes so
/// the cluster visualization can still be rendered. Road-lookup failures
/// during enrichment are absorbed into geodesic fallbacks and never surface.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The student list was empty; there is nothing to route.
    #[error("no students to route")]
    NoStudents,

    /// More students than the fleet can seat.
    #[error("{students} students cannot be seated by {max_buses} bus(es) of {capacity}")]
    InfeasibleCapacity {
        students: usize,
        max_buses: usize,
        capacity: usize,
    },

    /// An internal invariant was violated; the plan is discarded.
    #[error("internal invariant violated: {0}")]
    Internal(String),
}
