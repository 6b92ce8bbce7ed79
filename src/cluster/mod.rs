//! Density-based pre-clustering of student pickup points.
//!
//! - [`dbscan`] — density-based labelling over coordinate degrees
//! - [`analyze`] — per-cluster geometry, fleet recommendation, and the
//!   [`Strategy`] that decides how the optimizer routes the plan

mod analyzer;
mod dbscan;

pub use analyzer::{analyze, ClusterAnalysis, ClusterInfo, Strategy};
pub use dbscan::{dbscan, NOISE};
