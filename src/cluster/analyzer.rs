//! Student-distribution analysis and bus-count recommendation.
//!
//! Runs density-based clustering over the pickup points, classifies each
//! student as clustered or isolated, and recommends a fleet size together
//! with a routing strategy: clusters far apart get a bus per cluster, while
//! nearby or single clusters are routed globally with a fleet sweep.

use tracing::{debug, info};

use super::dbscan::{dbscan, NOISE};
use crate::config::RoutingConfig;
use crate::geo;
use crate::models::{ClusterMarker, ClusterVisualization, IsolatedMarker, Point, School, Student};

/// Routing strategy chosen from the spatial distribution of pickups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Clusters are far apart; route each cluster independently. Sharing a
    /// bus across separated clusters only lengthens every tour, so the
    /// fleet sweep is skipped.
    FarApart,
    /// Single or nearby clusters; sweep fleet sizes over the whole set.
    CloseOrSingle,
}

/// A dense group of students found by the analyzer.
#[derive(Debug, Clone)]
pub struct ClusterInfo {
    pub id: i32,
    /// Indices into the analyzed student slice.
    pub members: Vec<usize>,
    pub centroid: Point,
    /// Max pairwise geodesic distance among members, kilometers.
    pub spread_km: f64,
    /// Geodesic distance from the centroid to the school, kilometers.
    pub distance_from_school_km: f64,
}

/// Outcome of the pre-clustering stage, produced once per plan.
#[derive(Debug, Clone)]
pub struct ClusterAnalysis {
    pub clusters: Vec<ClusterInfo>,
    /// Indices of students outside every cluster.
    pub isolated: Vec<usize>,
    /// Mean geodesic distance over unordered centroid pairs, kilometers.
    /// Zero when there are fewer than two clusters.
    pub mean_cluster_km: f64,
    pub recommended_fleet: usize,
    pub strategy: Strategy,
    pub visualization: ClusterVisualization,
}

/// Analyzes the student distribution relative to the school.
///
/// Fewer than two students skips clustering entirely: every student is
/// reported isolated and a single bus is recommended.
pub fn analyze(students: &[Student], school: &School, config: &RoutingConfig) -> ClusterAnalysis {
    if students.len() < 2 {
        let isolated: Vec<usize> = (0..students.len()).collect();
        let visualization = build_visualization(&[], &isolated, students, config);
        return ClusterAnalysis {
            clusters: Vec::new(),
            isolated,
            mean_cluster_km: 0.0,
            recommended_fleet: 1,
            strategy: Strategy::CloseOrSingle,
            visualization,
        };
    }

    let points: Vec<Point> = students.iter().map(Student::point).collect();
    let labels = dbscan(&points, config.cluster_eps_deg, config.cluster_min_pts);

    let n_clusters = labels.iter().copied().max().map_or(0, |m| (m + 1).max(0)) as usize;
    let isolated: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|(_, &l)| l == NOISE)
        .map(|(i, _)| i)
        .collect();

    let clusters: Vec<ClusterInfo> = (0..n_clusters as i32)
        .map(|id| {
            let members: Vec<usize> = labels
                .iter()
                .enumerate()
                .filter(|(_, &l)| l == id)
                .map(|(i, _)| i)
                .collect();
            describe_cluster(id, members, &points, school)
        })
        .collect();

    debug!(
        clusters = clusters.len(),
        isolated = isolated.len(),
        "density clustering complete"
    );

    let mean_cluster_km = mean_centroid_distance(&clusters);
    let (recommended_fleet, strategy) = recommend(students.len(), &clusters, &isolated, mean_cluster_km, config);

    info!(
        fleet = recommended_fleet,
        ?strategy,
        mean_km = mean_cluster_km,
        "bus allocation recommended"
    );

    let visualization = build_visualization(&clusters, &isolated, students, config);
    ClusterAnalysis {
        clusters,
        isolated,
        mean_cluster_km,
        recommended_fleet,
        strategy,
        visualization,
    }
}

fn describe_cluster(id: i32, members: Vec<usize>, points: &[Point], school: &School) -> ClusterInfo {
    let lat = members.iter().map(|&i| points[i].lat).sum::<f64>() / members.len() as f64;
    let lng = members.iter().map(|&i| points[i].lng).sum::<f64>() / members.len() as f64;
    let centroid = Point::new(lat, lng);

    let mut spread_km = 0.0f64;
    for (a, &i) in members.iter().enumerate() {
        for &j in &members[a + 1..] {
            spread_km = spread_km.max(geo::haversine_km(points[i], points[j]));
        }
    }

    ClusterInfo {
        id,
        members,
        centroid,
        spread_km,
        distance_from_school_km: geo::haversine_km(centroid, school.point()),
    }
}

fn mean_centroid_distance(clusters: &[ClusterInfo]) -> f64 {
    if clusters.len() < 2 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut count = 0usize;
    for (a, ci) in clusters.iter().enumerate() {
        for cj in &clusters[a + 1..] {
            sum += geo::haversine_km(ci.centroid, cj.centroid);
            count += 1;
        }
    }
    sum / count as f64
}

fn recommend(
    n_students: usize,
    clusters: &[ClusterInfo],
    isolated: &[usize],
    mean_cluster_km: f64,
    config: &RoutingConfig,
) -> (usize, Strategy) {
    if clusters.len() >= 2 && mean_cluster_km > config.far_cluster_km {
        let mut fleet: usize = clusters
            .iter()
            .map(|c| c.members.len().div_ceil(config.capacity))
            .sum();
        if !isolated.is_empty() {
            fleet += isolated.len().div_ceil(config.capacity);
        }
        (fleet, Strategy::FarApart)
    } else {
        (n_students.div_ceil(config.capacity), Strategy::CloseOrSingle)
    }
}

fn build_visualization(
    clusters: &[ClusterInfo],
    isolated: &[usize],
    students: &[Student],
    config: &RoutingConfig,
) -> ClusterVisualization {
    ClusterVisualization {
        clusters: clusters
            .iter()
            .map(|c| ClusterMarker {
                id: c.id,
                center: c.centroid,
                radius: (c.spread_km / 2.0 * 1000.0).max(config.min_marker_radius_m),
                size: c.members.len(),
                distance_from_school: c.distance_from_school_km,
            })
            .collect(),
        isolated: isolated
            .iter()
            .map(|&i| {
                let s = &students[i];
                IsolatedMarker {
                    name: s.name.clone(),
                    lat: s.latitude,
                    lng: s.longitude,
                    address: s.address.clone(),
                }
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_single_student_is_trivial() {
        let students = vec![student(1, 1.31, 103.81)];
        let analysis = analyze(&students, &school(), &RoutingConfig::default());
        assert!(analysis.clusters.is_empty());
        assert_eq!(analysis.isolated, vec![0]);
        assert_eq!(analysis.recommended_fleet, 1);
        assert_eq!(analysis.strategy, Strategy::CloseOrSingle);
        assert_eq!(analysis.visualization.isolated.len(), 1);
    }

    #[test]
    fn test_partition_covers_all_students() {
        let mut students = blob(1, (1.30, 103.78), 10);
        students.extend(blob(11, (1.30, 103.88), 8));
        students.push(student(19, 1.40, 103.83)); // isolated

        let analysis = analyze(&students, &school(), &RoutingConfig::default());
        let mut covered: Vec<usize> = analysis
            .clusters
            .iter()
            .flat_map(|c| c.members.iter().copied())
            .chain(analysis.isolated.iter().copied())
            .collect();
        covered.sort_unstable();
        assert_eq!(covered, (0..students.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_far_clusters_get_one_bus_each() {
        // Centroids ~12 km apart: strategy flips to per-cluster routing.
        let mut students = blob(1, (1.30, 103.70), 10);
        students.extend(blob(11, (1.30, 103.81), 10));

        let analysis = analyze(&students, &school(), &RoutingConfig::default());
        assert_eq!(analysis.clusters.len(), 2);
        assert!(analysis.mean_cluster_km > 7.0);
        assert_eq!(analysis.strategy, Strategy::FarApart);
        assert_eq!(analysis.recommended_fleet, 2);
    }

    #[test]
    fn test_near_clusters_share_buses() {
        // Centroids ~4.5 km apart: below the far threshold.
        let mut students = blob(1, (1.30, 103.78), 10);
        students.extend(blob(11, (1.30, 103.82), 10));

        let analysis = analyze(&students, &school(), &RoutingConfig::default());
        assert_eq!(analysis.clusters.len(), 2);
        assert!(analysis.mean_cluster_km <= 7.0);
        assert_eq!(analysis.strategy, Strategy::CloseOrSingle);
        assert_eq!(analysis.recommended_fleet, 1);
    }

    #[test]
    fn test_oversized_cluster_fleet() {
        let students = blob(1, (1.30, 103.80), 85);
        let analysis = analyze(&students, &school(), &RoutingConfig::default());
        assert_eq!(analysis.clusters.len(), 1);
        assert_eq!(analysis.strategy, Strategy::CloseOrSingle);
        assert_eq!(analysis.recommended_fleet, 3);
    }

    #[test]
    fn test_far_fleet_counts_isolated_students() {
        let mut students = blob(1, (1.30, 103.70), 10);
        students.extend(blob(11, (1.30, 103.81), 10));
        students.push(student(21, 1.40, 103.755));

        let analysis = analyze(&students, &school(), &RoutingConfig::default());
        assert_eq!(analysis.strategy, Strategy::FarApart);
        assert_eq!(analysis.isolated.len(), 1);
        // One bus per cluster plus one for the isolated student.
        assert_eq!(analysis.recommended_fleet, 3);
    }

    #[test]
    fn test_marker_radius_floor() {
        let students = blob(1, (1.30, 103.80), 10);
        let analysis = analyze(&students, &school(), &RoutingConfig::default());
        let marker = &analysis.visualization.clusters[0];
        assert!(marker.radius >= 500.0);
        assert_eq!(marker.size, 10);
    }

    #[test]
    fn test_spread_is_max_pairwise_distance() {
        let students = vec![
            student(1, 1.300, 103.800),
            student(2, 1.300, 103.810),
            student(3, 1.300, 103.805),
        ];
        let analysis = analyze(&students, &school(), &RoutingConfig::default());
        assert_eq!(analysis.clusters.len(), 1);
        let expected = geo::haversine_km(Point::new(1.3, 103.8), Point::new(1.3, 103.81));
        assert!((analysis.clusters[0].spread_km - expected).abs() < 1e-9);
    }
}
