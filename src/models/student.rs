//! Student and school record types.

use serde::{Deserialize, Serialize};

use super::Point;

/// A student pickup point.
///
/// Ids are assigned by the ingest layer and are unique within a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: u32,
    pub name: String,
    pub address: String,
    pub postal: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Student {
    /// Creates a student record.
    pub fn new(
        id: u32,
        name: impl Into<String>,
        address: impl Into<String>,
        postal: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            address: address.into(),
            postal: postal.into(),
            latitude,
            longitude,
        }
    }

    /// Pickup location as a coordinate pair.
    pub fn point(&self) -> Point {
        Point::new(self.latitude, self.longitude)
    }
}

/// The school every tour starts and ends at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct School {
    pub name: String,
    pub address: String,
    pub postal: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl School {
    /// Creates a school record.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        postal: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            postal: postal.into(),
            latitude,
            longitude,
        }
    }

    /// Depot location as a coordinate pair.
    pub fn point(&self) -> Point {
        Point::new(self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_point() {
        let s = Student::new(1, "Alice Tan", "1 Orchard Road", "238823", 1.3, 103.83);
        assert_eq!(s.point(), Point::new(1.3, 103.83));
    }

    #[test]
    fn test_student_payload_fields() {
        let s = Student::new(7, "Ben Lim", "2 Bishan St", "570002", 1.35, 103.85);
        let json = serde_json::to_value(&s).expect("serializable");
        assert_eq!(json["id"], 7);
        assert_eq!(json["name"], "Ben Lim");
        assert_eq!(json["postal"], "570002");
        assert_eq!(json["latitude"], 1.35);
    }
}
