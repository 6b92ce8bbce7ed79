//! Final plan payload returned to the caller.

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use super::{round1, round2, Point, Route};

/// Map marker for one dense cluster of students.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterMarker {
    pub id: i32,
    pub center: Point,
    /// Display radius in meters.
    pub radius: f64,
    pub size: usize,
    /// Geodesic distance from the school in kilometers.
    pub distance_from_school: f64,
}

/// Map marker for a student outside every dense cluster.
#[derive(Debug, Clone, Serialize)]
pub struct IsolatedMarker {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub address: String,
}

/// Cluster overlay rendered by the map UI alongside the routes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClusterVisualization {
    pub clusters: Vec<ClusterMarker>,
    pub isolated: Vec<IsolatedMarker>,
}

/// A complete bus plan.
///
/// A plan with no routes signals that the solver found no solution; the
/// cluster visualization is retained so the UI can still render the student
/// distribution.
#[derive(Debug, Clone)]
pub struct Plan {
    pub routes: Vec<Route>,
    pub total_buses: usize,
    /// Longest route time across buses, seconds.
    pub max_route_time_secs: f64,
    pub total_distance_km: f64,
    pub optimization_note: String,
    pub cluster_visualization: ClusterVisualization,
}

impl Plan {
    /// Plan reporting that no routes could be built.
    pub fn no_solution(visualization: ClusterVisualization, note: impl Into<String>) -> Self {
        Self {
            routes: Vec::new(),
            total_buses: 0,
            max_route_time_secs: 0.0,
            total_distance_km: 0.0,
            optimization_note: note.into(),
            cluster_visualization: visualization,
        }
    }
}

impl Serialize for Plan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Plan", 6)?;
        s.serialize_field("routes", &self.routes)?;
        s.serialize_field("total_buses", &self.total_buses)?;
        s.serialize_field(
            "max_route_time_minutes",
            &round1(self.max_route_time_secs / 60.0),
        )?;
        s.serialize_field("total_distance_km", &round2(self.total_distance_km))?;
        s.serialize_field("optimization_note", &self.optimization_note)?;
        s.serialize_field("cluster_visualization", &self.cluster_visualization)?;
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_solution_plan() {
        let plan = Plan::no_solution(ClusterVisualization::default(), "Could not create routes");
        assert!(plan.routes.is_empty());
        assert_eq!(plan.total_buses, 0);
        assert_eq!(plan.optimization_note, "Could not create routes");
    }

    #[test]
    fn test_plan_payload_rounding() {
        let mut plan = Plan::no_solution(ClusterVisualization::default(), "note");
        plan.max_route_time_secs = 1234.0;
        plan.total_distance_km = 12.3456;
        let json = serde_json::to_value(&plan).expect("serializable");
        assert_eq!(json["max_route_time_minutes"], 20.6);
        assert_eq!(json["total_distance_km"], 12.35);
        assert_eq!(json["total_buses"], 0);
    }

    #[test]
    fn test_visualization_payload_fields() {
        let viz = ClusterVisualization {
            clusters: vec![ClusterMarker {
                id: 0,
                center: Point::new(1.3, 103.8),
                radius: 500.0,
                size: 12,
                distance_from_school: 4.2,
            }],
            isolated: vec![IsolatedMarker {
                name: "Cara Ong".into(),
                lat: 1.25,
                lng: 103.7,
                address: "5 Far Lane".into(),
            }],
        };
        let json = serde_json::to_value(&viz).expect("serializable");
        assert_eq!(json["clusters"][0]["center"]["lat"], 1.3);
        assert_eq!(json["clusters"][0]["radius"], 500.0);
        assert_eq!(json["isolated"][0]["name"], "Cara Ong");
    }
}
