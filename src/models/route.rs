//! Route and segment types.

use serde::ser::{Serialize, SerializeStruct, Serializer};

use super::{round1, round2, Point, Student};

/// Label carried by the terminal segment back to the school.
pub const RETURN_LABEL: &str = "Return to School";

/// One leg of a bus tour.
///
/// Distance, time, and geometry hold matrix-based estimates until the plan
/// is enriched with road data; enrichment overwrites all three exactly once.
#[derive(Debug, Clone)]
pub struct RouteSegment {
    pub from: Point,
    pub to: Point,
    /// Name of the student picked up at `to`, or [`RETURN_LABEL`].
    pub student: String,
    /// Driving distance in kilometers.
    pub distance_km: f64,
    /// Driving time in seconds, excluding pickup dwell.
    pub time_secs: f64,
    /// Road geometry; a two-point straight line until enrichment.
    pub geometry: Vec<Point>,
}

impl RouteSegment {
    /// Segment with a straight-line two-point geometry.
    pub fn straight(
        from: Point,
        to: Point,
        student: impl Into<String>,
        distance_km: f64,
        time_secs: f64,
    ) -> Self {
        Self {
            from,
            to,
            student: student.into(),
            distance_km,
            time_secs,
            geometry: vec![from, to],
        }
    }
}

impl Serialize for RouteSegment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let pairs: Vec<[f64; 2]> = self.geometry.iter().map(|p| [p.lat, p.lng]).collect();
        let mut s = serializer.serialize_struct("RouteSegment", 6)?;
        s.serialize_field("from", &self.from)?;
        s.serialize_field("to", &self.to)?;
        s.serialize_field("student", &self.student)?;
        s.serialize_field("distance", &self.distance_km)?;
        s.serialize_field("time", &self.time_secs)?;
        s.serialize_field("geometry", &pairs)?;
        s.end()
    }
}

/// An ordered bus tour over a subset of students.
///
/// The first segment leaves the school and the last returns to it. Totals
/// include the per-student pickup dwell.
#[derive(Debug, Clone)]
pub struct Route {
    pub students: Vec<Student>,
    pub segments: Vec<RouteSegment>,
    /// Total driving distance in kilometers.
    pub distance_km: f64,
    /// Total time in seconds, including pickup dwell.
    pub time_secs: f64,
}

impl Route {
    /// Number of students picked up on this route.
    pub fn student_count(&self) -> usize {
        self.students.len()
    }

    /// Total time in minutes.
    pub fn time_minutes(&self) -> f64 {
        self.time_secs / 60.0
    }
}

impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Route", 6)?;
        s.serialize_field("students", &self.students)?;
        s.serialize_field("distance_km", &round2(self.distance_km))?;
        s.serialize_field("time_seconds", &(self.time_secs.round() as u64))?;
        s.serialize_field("time_minutes", &round1(self.time_minutes()))?;
        s.serialize_field("student_count", &self.student_count())?;
        s.serialize_field("segments", &self.segments)?;
        s.end()
    }
}
