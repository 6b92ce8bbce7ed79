//! Planner configuration.

use std::time::Duration;

/// Tunable parameters of the routing engine.
///
/// Defaults match the production constants. The road factor and the
/// far-apart threshold are calibration values for the operating road
/// network, so they are exposed here rather than hard-coded at their use
/// sites.
///
/// # Examples
///
/// ```
/// use busroute::RoutingConfig;
///
/// let config = RoutingConfig::default();
/// assert_eq!(config.capacity, 40);
/// assert_eq!(config.road_factor, 1.3);
/// ```
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    /// Seats per bus.
    pub capacity: usize,
    /// Dwell time per student pickup, seconds.
    pub pickup_dwell_secs: f64,
    /// Multiplier from straight-line to driving distance.
    pub road_factor: f64,
    /// Clustering neighborhood radius in coordinate degrees.
    pub cluster_eps_deg: f64,
    /// Minimum neighborhood size to form a cluster; the point itself counts.
    pub cluster_min_pts: usize,
    /// Mean inter-centroid distance above which clusters are routed
    /// independently, kilometers.
    pub far_cluster_km: f64,
    /// Wall-clock budget per CVRP invocation.
    pub solver_budget: Duration,
    /// Max route time above which the fleet sweep minimizes time instead of
    /// bus count, seconds.
    pub speed_mode_secs: f64,
    /// Allowed max-route-time slack when preferring fewer buses.
    pub fleet_slack: f64,
    /// Minimum cluster marker radius for map display, meters.
    pub min_marker_radius_m: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            capacity: 40,
            pickup_dwell_secs: 60.0,
            road_factor: 1.3,
            cluster_eps_deg: 0.03,
            cluster_min_pts: 3,
            far_cluster_km: 7.0,
            solver_budget: Duration::from_secs(30),
            speed_mode_secs: 1800.0,
            fleet_slack: 1.15,
            min_marker_radius_m: 500.0,
        }
    }
}
