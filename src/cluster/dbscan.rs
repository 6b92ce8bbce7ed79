//! Density-based clustering over raw coordinate degrees.
//!
//! Plain DBSCAN (Ester et al., 1996) with a Euclidean metric on (lat, lng)
//! degrees. Treating degree distance as Euclidean breaks near the poles and
//! over long east-west spans; at city scale the error is negligible, and the
//! metric is kept so cluster boundaries match the production behavior. The
//! neighborhood of a point includes the point itself.

use crate::models::Point;

/// Label assigned to points that belong to no dense cluster.
pub const NOISE: i32 = -1;

const UNVISITED: i32 = -2;

/// Labels each point with a cluster id (`>= 0`) or [`NOISE`].
///
/// A point is a core point when at least `min_pts` points (itself included)
/// lie within `eps_deg` of it. Clusters grow from core points through
/// density-reachability; border points take the id of the first cluster that
/// reaches them.
///
/// # Examples
///
/// ```
/// use busroute::cluster::dbscan;
/// use busroute::models::Point;
///
/// let points = vec![
///     Point::new(0.000, 0.000),
///     Point::new(0.001, 0.001),
///     Point::new(0.002, 0.000),
///     Point::new(1.000, 1.000),
/// ];
/// let labels = dbscan(&points, 0.03, 3);
/// assert_eq!(&labels[..3], &[0, 0, 0]);
/// assert_eq!(labels[3], -1);
/// ```
pub fn dbscan(points: &[Point], eps_deg: f64, min_pts: usize) -> Vec<i32> {
    let n = points.len();
    let mut labels = vec![UNVISITED; n];
    let mut cluster_id = 0;

    for i in 0..n {
        if labels[i] != UNVISITED {
            continue;
        }

        let neighbors = region_query(points, i, eps_deg);
        if neighbors.len() < min_pts {
            labels[i] = NOISE;
            continue;
        }

        labels[i] = cluster_id;
        let mut seeds = neighbors;
        let mut k = 0;
        while k < seeds.len() {
            let q = seeds[k];
            k += 1;

            if labels[q] == NOISE {
                labels[q] = cluster_id;
            }
            if labels[q] != UNVISITED {
                continue;
            }
            labels[q] = cluster_id;

            let q_neighbors = region_query(points, q, eps_deg);
            if q_neighbors.len() >= min_pts {
                seeds.extend(q_neighbors);
            }
        }

        cluster_id += 1;
    }

    labels
}

/// Indices of all points within `eps` of `points[idx]`, itself included.
fn region_query(points: &[Point], idx: usize, eps: f64) -> Vec<usize> {
    let center = points[idx];
    points
        .iter()
        .enumerate()
        .filter(|(_, p)| degree_distance(center, **p) <= eps)
        .map(|(i, _)| i)
        .collect()
}

fn degree_distance(a: Point, b: Point) -> f64 {
    let dlat = a.lat - b.lat;
    let dlng = a.lng - b.lng;
    (dlat * dlat + dlng * dlng).sqrt()
}
