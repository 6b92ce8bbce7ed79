//! Route planning orchestrator.
//!
//! Runs the cluster analyzer, picks a routing strategy, invokes the CVRP
//! solver one or more times, enriches the chosen tours with road geometry,
//! and assembles the final plan.
//!
//! Far-apart clusters are routed independently, one fleet per cluster: once
//! clusters are separated beyond the threshold, sharing a bus between them
//! strictly worsens every tour, so enumerating fleet sizes would be wasted
//! work. Otherwise the optimizer sweeps candidate fleet sizes over the whole
//! student set and picks the best trade-off between route time and bus
//! count.

use std::collections::HashSet;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::cluster::{self, ClusterAnalysis, Strategy};
use crate::config::RoutingConfig;
use crate::distance::DistanceMatrix;
use crate::error::PlanError;
use crate::geo;
use crate::models::{Plan, Point, Route, RouteSegment, School, Student, RETURN_LABEL};
use crate::routing::{RouteLeg, RoutingClient};
use crate::solver::{CvrpSolver, SavingsSolver};

/// One solved fleet-size attempt recorded during the sweep.
struct Candidate {
    routes: Vec<Route>,
    max_time_secs: f64,
    total_km: f64,
}

/// Plans school-bus pickup tours from a school and a student snapshot.
///
/// The optimizer is a pure function of its inputs plus the routing
/// collaborator: it holds no student state of its own.
///
/// # Examples
///
/// ```
/// use busroute::models::{School, Student};
/// use busroute::optimizer::RouteOptimizer;
/// use busroute::routing::GeodesicRouter;
///
/// let school = School::new("Northway Primary", "1 School Rd", "538123", 1.30, 103.80);
/// let students = vec![
///     Student::new(1, "Alice Tan", "10 First Ave", "100001", 1.31, 103.81),
///     Student::new(2, "Ben Lim", "20 Second Ave", "100002", 1.32, 103.79),
/// ];
///
/// let optimizer = RouteOptimizer::new(GeodesicRouter);
/// let plan = optimizer.optimize(&school, &students, 3).expect("plan");
/// assert_eq!(plan.routes.iter().map(|r| r.student_count()).sum::<usize>(), 2);
/// ```
pub struct RouteOptimizer<S, C> {
    config: RoutingConfig,
    solver: S,
    client: C,
}

impl<C: RoutingClient> RouteOptimizer<SavingsSolver, C> {
    /// Optimizer with the default configuration and savings solver.
    pub fn new(client: C) -> Self {
        Self::with_config(RoutingConfig::default(), client)
    }

    /// Optimizer with the default savings solver under a custom
    /// configuration.
    pub fn with_config(config: RoutingConfig, client: C) -> Self {
        let solver = SavingsSolver::new(config.solver_budget);
        Self {
            config,
            solver,
            client,
        }
    }
}

impl<S: CvrpSolver, C: RoutingClient> RouteOptimizer<S, C> {
    /// Optimizer with a custom solver backend.
    pub fn with_solver(config: RoutingConfig, solver: S, client: C) -> Self {
        Self {
            config,
            solver,
            client,
        }
    }

    /// Produces a bus plan for the given school and students.
    ///
    /// Validation failures return an error before any solving happens. A
    /// solver that produces no routes yields a plan with empty routes and
    /// the cluster visualization intact, so callers can still render the
    /// student distribution.
    pub fn optimize(
        &self,
        school: &School,
        students: &[Student],
        max_buses: usize,
    ) -> Result<Plan, PlanError> {
        if students.is_empty() {
            return Err(PlanError::NoStudents);
        }
        if max_buses == 0 || students.len() > max_buses * self.config.capacity {
            return Err(PlanError::InfeasibleCapacity {
                students: students.len(),
                max_buses,
                capacity: self.config.capacity,
            });
        }

        let analysis = cluster::analyze(students, school, &self.config);
        info!(
            clusters = analysis.clusters.len(),
            isolated = analysis.isolated.len(),
            strategy = ?analysis.strategy,
            fleet = analysis.recommended_fleet,
            "analysis complete"
        );

        let planned = match analysis.strategy {
            Strategy::FarApart => self.route_per_cluster(school, students, &analysis),
            Strategy::CloseOrSingle => {
                self.sweep_fleet_sizes(school, students, max_buses, &analysis)
            }
        };

        let (mut routes, note) = match planned {
            Some(outcome) => outcome,
            None => {
                return Ok(Plan::no_solution(
                    analysis.visualization,
                    "Could not create routes",
                ));
            }
        };

        self.enrich(&mut routes);
        self.check_invariants(school, students, &routes)?;

        let total_km = routes.iter().map(|r| r.distance_km).sum();
        let max_secs = routes.iter().map(|r| r.time_secs).fold(0.0, f64::max);
        Ok(Plan {
            total_buses: routes.len(),
            routes,
            max_route_time_secs: max_secs,
            total_distance_km: total_km,
            optimization_note: note,
            cluster_visualization: analysis.visualization,
        })
    }

    /// One independent CVRP per cluster, isolated students attached to the
    /// geodesically nearest centroid first.
    fn route_per_cluster(
        &self,
        school: &School,
        students: &[Student],
        analysis: &ClusterAnalysis,
    ) -> Option<(Vec<Route>, String)> {
        let mut groups: Vec<Vec<usize>> =
            analysis.clusters.iter().map(|c| c.members.clone()).collect();

        for &iso in &analysis.isolated {
            let p = students[iso].point();
            let nearest = analysis
                .clusters
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    geo::haversine_km(p, a.centroid)
                        .partial_cmp(&geo::haversine_km(p, b.centroid))
                        .expect("centroid distances are finite")
                })
                .map(|(i, _)| i)?;
            debug!(student = %students[iso].name, cluster = nearest, "attached isolated student");
            groups[nearest].push(iso);
        }

        let solved: Vec<Option<Vec<Route>>> = groups
            .par_iter()
            .map(|members| {
                let group: Vec<Student> =
                    members.iter().map(|&i| students[i].clone()).collect();
                let fleet = group.len().div_ceil(self.config.capacity);
                self.solve_group(school, &group, fleet)
            })
            .collect();

        let mut routes = Vec::new();
        for cluster_routes in solved {
            routes.extend(cluster_routes?);
        }
        if routes.is_empty() {
            return None;
        }

        let note = format!(
            "Using {} bus(es) - cluster-based routing ({} clusters, {:.1}km apart)",
            routes.len(),
            analysis.clusters.len(),
            analysis.mean_cluster_km
        );
        Some((routes, note))
    }

    /// Solves the whole student set at several fleet sizes and keeps the
    /// best per the selection rule.
    fn sweep_fleet_sizes(
        &self,
        school: &School,
        students: &[Student],
        max_buses: usize,
        analysis: &ClusterAnalysis,
    ) -> Option<(Vec<Route>, String)> {
        let mut fleet_sizes = vec![1];
        if analysis.recommended_fleet > 1 {
            fleet_sizes.extend(2..=max_buses.min(analysis.recommended_fleet));
        }

        let mut candidates = Vec::new();
        for fleet in fleet_sizes {
            let Some(routes) = self.solve_group(school, students, fleet) else {
                continue;
            };
            let max_time_secs = routes.iter().map(|r| r.time_secs).fold(0.0, f64::max);
            let total_km = routes.iter().map(|r| r.distance_km).sum();
            debug!(
                fleet,
                buses = routes.len(),
                max_secs = max_time_secs as u64,
                "sweep candidate"
            );
            candidates.push(Candidate {
                routes,
                max_time_secs,
                total_km,
            });
        }
        if candidates.is_empty() {
            return None;
        }

        let speed_mode = candidates
            .iter()
            .map(|c| c.max_time_secs)
            .fold(f64::INFINITY, f64::min)
            > self.config.speed_mode_secs;
        let chosen = candidates.swap_remove(select(&candidates, &self.config));

        let note = if speed_mode {
            format!("Using {} bus(es) - prioritizing speed", chosen.routes.len())
        } else {
            format!("Using {} bus(es) - optimal balance", chosen.routes.len())
        };
        Some((chosen.routes, note))
    }

    /// Builds the distance matrix for one CVRP invocation, solves it, and
    /// extracts accounted routes.
    fn solve_group(
        &self,
        school: &School,
        students: &[Student],
        fleet: usize,
    ) -> Option<Vec<Route>> {
        let points: Vec<Point> = students.iter().map(Student::point).collect();
        let matrix = DistanceMatrix::build(school.point(), &points, self.config.road_factor);

        let tours = self.solver.solve(&matrix, fleet, self.config.capacity)?;
        if tours.is_empty() {
            return None;
        }
        Some(
            tours
                .iter()
                .map(|tour| self.build_route(school, students, tour, &matrix))
                .collect(),
        )
    }

    /// Turns a tour of matrix locations into a route with segments and
    /// matrix-estimate accounting: travel time per leg plus a pickup dwell
    /// per student.
    fn build_route(
        &self,
        school: &School,
        students: &[Student],
        tour: &[usize],
        matrix: &DistanceMatrix,
    ) -> Route {
        let point_at = |loc: usize| {
            if loc == 0 {
                school.point()
            } else {
                students[loc - 1].point()
            }
        };

        let mut segments = Vec::with_capacity(tour.len() + 1);
        let mut distance_km = 0.0;
        let mut time_secs = 0.0;
        let mut prev = 0;

        for &loc in tour {
            let km = matrix.km(prev, loc);
            let secs = geo::travel_time_secs(km);
            distance_km += km;
            time_secs += secs + self.config.pickup_dwell_secs;
            segments.push(RouteSegment::straight(
                point_at(prev),
                point_at(loc),
                students[loc - 1].name.clone(),
                km,
                secs,
            ));
            prev = loc;
        }

        let km = matrix.km(prev, 0);
        let secs = geo::travel_time_secs(km);
        distance_km += km;
        time_secs += secs;
        segments.push(RouteSegment::straight(
            point_at(prev),
            school.point(),
            RETURN_LABEL,
            km,
            secs,
        ));

        Route {
            students: tour.iter().map(|&loc| students[loc - 1].clone()).collect(),
            segments,
            distance_km,
            time_secs,
        }
    }

    /// Replaces every segment's estimate with road data, falling back to
    /// the geodesic estimate per segment, then recomputes route totals.
    fn enrich(&self, routes: &mut [Route]) {
        for route in routes.iter_mut() {
            route.segments.par_iter_mut().for_each(|segment| {
                let leg = self
                    .client
                    .route(segment.from, segment.to)
                    .unwrap_or_else(|err| {
                        debug!(error = %err, "road lookup failed, using geodesic fallback");
                        RouteLeg::fallback(segment.from, segment.to)
                    });
                segment.distance_km = leg.distance_km;
                segment.time_secs = leg.duration_secs;
                segment.geometry = leg.geometry;
            });

            route.distance_km = route.segments.iter().map(|s| s.distance_km).sum();
            route.time_secs = route.segments.iter().map(|s| s.time_secs).sum::<f64>()
                + self.config.pickup_dwell_secs * route.students.len() as f64;
        }
    }

    /// Verifies coverage, capacity, depot closure, and geometry before the
    /// plan leaves the engine.
    fn check_invariants(
        &self,
        school: &School,
        students: &[Student],
        routes: &[Route],
    ) -> Result<(), PlanError> {
        let mut seen = HashSet::new();
        for route in routes {
            if route.students.len() > self.config.capacity {
                return Err(PlanError::Internal(format!(
                    "route carries {} students over capacity {}",
                    route.students.len(),
                    self.config.capacity
                )));
            }
            for student in &route.students {
                if !seen.insert(student.id) {
                    return Err(PlanError::Internal(format!(
                        "student {} appears in more than one route",
                        student.id
                    )));
                }
            }

            let (Some(first), Some(last)) = (route.segments.first(), route.segments.last())
            else {
                return Err(PlanError::Internal("route has no segments".to_string()));
            };
            if first.from != school.point() || last.to != school.point() {
                return Err(PlanError::Internal(
                    "route does not start and end at the school".to_string(),
                ));
            }
            if route.segments.iter().any(|s| s.geometry.len() < 2) {
                return Err(PlanError::Internal(
                    "segment with degenerate geometry".to_string(),
                ));
            }
        }

        if seen.len() != students.len() {
            return Err(PlanError::Internal(format!(
                "only {} of {} students were routed",
                seen.len(),
                students.len()
            )));
        }
        Ok(())
    }
}

/// Index of the winning candidate.
///
/// When even the best candidate exceeds the speed-mode threshold the
/// problem is under-provisioned and raw speed wins. Otherwise the smallest
/// fleet within the allowed slack of the best time wins, with total
/// distance as the tie-breaker: a minor time regression is worth a real
/// operating-cost saving.
fn select(candidates: &[Candidate], config: &RoutingConfig) -> usize {
    let best_time = candidates
        .iter()
        .map(|c| c.max_time_secs)
        .fold(f64::INFINITY, f64::min);

    if best_time > config.speed_mode_secs {
        return candidates
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.max_time_secs
                    .partial_cmp(&b.max_time_secs)
                    .expect("route times are finite")
            })
            .map(|(i, _)| i)
            .unwrap_or(0);
    }

    let threshold = best_time * config.fleet_slack;
    candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.max_time_secs <= threshold)
        .min_by(|(_, a), (_, b)| {
            a.routes
                .len()
                .cmp(&b.routes.len())
                .then_with(|| a.total_km.partial_cmp(&b.total_km).expect("distances are finite"))
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::routing::GeodesicRouter;

    fn school() -> School {
        School::new("Test Primary School", "1 School Road", "538123", 1.30, 103.80)
    }

    fn student(id: u32, lat: f64, lng: f64) -> Student {
        Student::new(
            id,
            format!("Student {id}"),
            format!("{id} Test Street"),
            format!("{:06}", 100000 + id),
            lat,
            lng,
        )
    }

    /// `count` students packed well inside one clustering neighborhood.
    fn blob(start_id: u32, center: (f64, f64), count: usize) -> Vec<Student> {
        (0..count)
            .map(|i| {
                student(
                    start_id + i as u32,
                    center.0 + (i % 5) as f64 * 0.001,
                    center.1 + (i / 5) as f64 * 0.001,
                )
            })
            .collect()
    }

    fn optimizer() -> RouteOptimizer<SavingsSolver, GeodesicRouter> {
        let mut config = RoutingConfig::default();
        config.solver_budget = Duration::from_millis(50);
        RouteOptimizer::with_config(config, GeodesicRouter)
    }

    fn assert_plan_invariants(plan: &Plan, students: &[Student], school: &School) {
        let mut routed: Vec<u32> = plan
            .routes
            .iter()
            .flat_map(|r| r.students.iter().map(|s| s.id))
            .collect();
        routed.sort_unstable();
        let mut expected: Vec<u32> = students.iter().map(|s| s.id).collect();
        expected.sort_unstable();
        assert_eq!(routed, expected, "every student routed exactly once");

        for route in &plan.routes {
            assert!(route.students.len() <= 40);
            assert_eq!(route.segments.first().expect("segments").from, school.point());
            assert_eq!(route.segments.last().expect("segments").to, school.point());
            assert!(route.segments.iter().all(|s| s.geometry.len() >= 2));
            assert_eq!(route.segments.len(), route.students.len() + 1);
        }
    }

    #[test]
    fn test_empty_students_is_an_error() {
        let result = optimizer().optimize(&school(), &[], 3);
        assert!(matches!(result, Err(PlanError::NoStudents)));
    }

    #[test]
    fn test_over_capacity_is_an_error() {
        let students = blob(1, (1.30, 103.80), 85);
        let result = optimizer().optimize(&school(), &students, 2);
        assert!(matches!(
            result,
            Err(PlanError::InfeasibleCapacity {
                students: 85,
                max_buses: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_zero_buses_is_an_error() {
        let students = vec![student(1, 1.31, 103.81)];
        let result = optimizer().optimize(&school(), &students, 0);
        assert!(matches!(result, Err(PlanError::InfeasibleCapacity { .. })));
    }

    #[test]
    fn test_single_student_round_trip() {
        let sch = school();
        let students = vec![student(1, 1.31, 103.81)];
        let plan = optimizer().optimize(&sch, &students, 3).expect("plan");

        assert_eq!(plan.total_buses, 1);
        assert_eq!(plan.routes.len(), 1);
        let route = &plan.routes[0];
        assert_eq!(route.students.len(), 1);
        assert_eq!(route.segments.len(), 2);
        assert_eq!(route.segments[0].student, "Student 1");
        assert_eq!(route.segments[1].student, RETURN_LABEL);
        assert_plan_invariants(&plan, &students, &sch);
    }

    #[test]
    fn test_two_near_clusters_share_one_bus() {
        // Two tight 20-student blobs ~4.5 km apart: close enough to share,
        // and exactly at capacity for a single bus.
        let sch = school();
        let mut students = blob(1, (1.30, 103.78), 20);
        students.extend(blob(21, (1.30, 103.82), 20));

        let plan = optimizer().optimize(&sch, &students, 3).expect("plan");
        assert_eq!(plan.total_buses, 1);
        assert_eq!(plan.routes[0].students.len(), 40);
        assert!(plan.optimization_note.starts_with("Using 1 bus"));
        assert_plan_invariants(&plan, &students, &sch);
    }

    #[test]
    fn test_two_far_clusters_get_separate_routes() {
        // Centroids ~12 km apart: one bus per cluster, no fleet sweep.
        let sch = school();
        let cluster_a = blob(1, (1.30, 103.70), 25);
        let cluster_b = blob(101, (1.30, 103.81), 15);
        let mut students = cluster_a.clone();
        students.extend(cluster_b.clone());

        let plan = optimizer().optimize(&sch, &students, 5).expect("plan");
        assert_eq!(plan.total_buses, 2);
        assert!(plan.optimization_note.contains("cluster-based routing"));

        let a_ids: HashSet<u32> = cluster_a.iter().map(|s| s.id).collect();
        let route_with_a = plan
            .routes
            .iter()
            .find(|r| r.students.iter().any(|s| a_ids.contains(&s.id)))
            .expect("route for cluster A");
        assert!(route_with_a.students.iter().all(|s| a_ids.contains(&s.id)));
        assert_eq!(route_with_a.students.len(), 25);
        assert_plan_invariants(&plan, &students, &sch);
    }

    #[test]
    fn test_isolated_students_join_nearest_cluster() {
        // Three far clusters, one bus each, plus two isolated students who
        // must ride with their nearest cluster.
        let sch = school();
        let mut students = blob(1, (1.20, 103.70), 10);
        students.extend(blob(11, (1.20, 103.82), 10));
        students.extend(blob(21, (1.31, 103.76), 10));
        let iso_a = student(31, 1.25, 103.76); // nearest to the third cluster
        let iso_b = student(32, 1.26, 103.70); // nearest to the first cluster
        students.push(iso_a.clone());
        students.push(iso_b.clone());

        let plan = optimizer().optimize(&sch, &students, 3).expect("plan");
        assert_eq!(plan.total_buses, 3);
        assert_plan_invariants(&plan, &students, &sch);

        let route_of = |id: u32| {
            plan.routes
                .iter()
                .position(|r| r.students.iter().any(|s| s.id == id))
                .expect("student routed")
        };
        // Isolated students ride with their nearest cluster's bus.
        assert_eq!(route_of(iso_a.id), route_of(21));
        assert_eq!(route_of(iso_b.id), route_of(1));
        assert_eq!(plan.cluster_visualization.isolated.len(), 2);
    }

    #[test]
    fn test_oversized_cluster_splits_across_buses() {
        let sch = school();
        let students = blob(1, (1.30, 103.80), 85);
        let plan = optimizer().optimize(&sch, &students, 3).expect("plan");

        assert_eq!(plan.total_buses, 3);
        assert!(plan.routes.iter().all(|r| r.students.len() <= 40));
        let total: usize = plan.routes.iter().map(|r| r.students.len()).sum();
        assert_eq!(total, 85);
        assert_plan_invariants(&plan, &students, &sch);
    }

    #[test]
    fn test_enrichment_totals_match_segments() {
        let sch = school();
        let students = vec![
            student(1, 1.31, 103.81),
            student(2, 1.32, 103.80),
            student(3, 1.30, 103.82),
        ];
        let plan = optimizer().optimize(&sch, &students, 3).expect("plan");

        for route in &plan.routes {
            let seg_km: f64 = route.segments.iter().map(|s| s.distance_km).sum();
            let seg_secs: f64 = route.segments.iter().map(|s| s.time_secs).sum();
            assert!((route.distance_km - seg_km).abs() < 1e-9);
            let expected = seg_secs + 60.0 * route.students.len() as f64;
            assert!((route.time_secs - expected).abs() < 1e-9);
        }
    }

    fn candidate(buses: usize, max_time_secs: f64, total_km: f64) -> Candidate {
        let route = Route {
            students: Vec::new(),
            segments: Vec::new(),
            distance_km: 0.0,
            time_secs: 0.0,
        };
        Candidate {
            routes: vec![route; buses],
            max_time_secs,
            total_km,
        }
    }

    #[test]
    fn test_select_prefers_fewer_buses_within_slack() {
        let config = RoutingConfig::default();
        // One bus is 10% slower than two: within the 15% slack, so the
        // single bus wins.
        let candidates = vec![
            candidate(1, 1100.0, 30.0),
            candidate(2, 1000.0, 35.0),
        ];
        assert_eq!(select(&candidates, &config), 0);
    }

    #[test]
    fn test_select_rejects_fleet_outside_slack() {
        let config = RoutingConfig::default();
        // One bus is 30% slower than two: outside the slack.
        let candidates = vec![
            candidate(1, 1300.0, 30.0),
            candidate(2, 1000.0, 35.0),
        ];
        assert_eq!(select(&candidates, &config), 1);
    }

    #[test]
    fn test_select_speed_mode_over_threshold() {
        let config = RoutingConfig::default();
        // Every candidate above 1800 s: minimize time regardless of fleet.
        let candidates = vec![
            candidate(1, 2500.0, 30.0),
            candidate(2, 2000.0, 45.0),
            candidate(3, 1900.0, 50.0),
        ];
        assert_eq!(select(&candidates, &config), 2);
    }

    #[test]
    fn test_select_breaks_bus_ties_by_distance() {
        let config = RoutingConfig::default();
        let candidates = vec![
            candidate(2, 1000.0, 42.0),
            candidate(2, 1050.0, 38.0),
        ];
        assert_eq!(select(&candidates, &config), 1);
    }

    #[test]
    fn test_no_solution_keeps_visualization() {
        // A solver that always gives up.
        struct NoSolver;
        impl CvrpSolver for NoSolver {
            fn solve(&self, _: &DistanceMatrix, _: usize, _: usize) -> Option<Vec<Vec<usize>>> {
                None
            }
        }

        let sch = school();
        let students = blob(1, (1.30, 103.80), 10);
        let optimizer =
            RouteOptimizer::with_solver(RoutingConfig::default(), NoSolver, GeodesicRouter);
        let plan = optimizer.optimize(&sch, &students, 3).expect("plan value");

        assert!(plan.routes.is_empty());
        assert_eq!(plan.total_buses, 0);
        assert_eq!(plan.optimization_note, "Could not create routes");
        assert_eq!(plan.cluster_visualization.clusters.len(), 1);
    }

    #[test]
    fn test_plan_payload_shape() {
        let sch = school();
        let students = vec![student(1, 1.31, 103.81), student(2, 1.29, 103.79)];
        let plan = optimizer().optimize(&sch, &students, 3).expect("plan");
        let json = serde_json::to_value(&plan).expect("serializable");

        assert!(json["total_buses"].is_u64());
        assert!(json["max_route_time_minutes"].is_number());
        assert!(json["optimization_note"].is_string());
        assert!(json["cluster_visualization"]["isolated"].is_array());
        let route = &json["routes"][0];
        assert!(route["segments"][0]["geometry"].is_array());
        assert!(route["time_seconds"].is_u64());
    }
}
