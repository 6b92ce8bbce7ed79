//! Dense integer distance matrix.

use crate::geo;
use crate::models::Point;

/// A dense n×n matrix of driving-distance estimates in meters, row-major.
///
/// Index 0 is the school; index `i >= 1` is the i-th student. Entries are
/// geodesic distances scaled by a road factor compensating for the gap
/// between straight-line and driving distance. The real routing service is
/// deliberately not consulted here: that would cost O(n²) external calls
/// per optimization attempt.
///
/// # Examples
///
/// ```
/// use busroute::distance::DistanceMatrix;
/// use busroute::models::Point;
///
/// let school = Point::new(1.30, 103.80);
/// let students = vec![Point::new(1.31, 103.80), Point::new(1.32, 103.80)];
/// let m = DistanceMatrix::build(school, &students, 1.3);
/// assert_eq!(m.size(), 3);
/// assert_eq!(m.get(0, 0), 0);
/// assert_eq!(m.get(0, 1), m.get(1, 0));
/// ```
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    data: Vec<u32>,
    size: usize,
}

impl DistanceMatrix {
    /// Creates a matrix of the given size, initialized to zero.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0; size * size],
            size,
        }
    }

    /// Builds the matrix for a school and its student pickup points.
    ///
    /// Each unordered pair gets `haversine_km × road_factor × 1000`, rounded
    /// to whole meters and stored symmetrically.
    pub fn build(school: Point, students: &[Point], road_factor: f64) -> Self {
        let n = students.len() + 1;
        let mut matrix = Self::new(n);
        let point = |i: usize| if i == 0 { school } else { students[i - 1] };

        for i in 0..n {
            for j in (i + 1)..n {
                let km = geo::haversine_km(point(i), point(j));
                let meters = (km * road_factor * 1000.0).round() as u32;
                matrix.set(i, j, meters);
                matrix.set(j, i, meters);
            }
        }

        matrix
    }

    /// Creates a matrix from an explicit n×n grid of meters.
    ///
    /// Returns `None` if the data length doesn't match `size * size`.
    pub fn from_data(size: usize, data: Vec<u32>) -> Option<Self> {
        if data.len() != size * size {
            return None;
        }
        Some(Self { data, size })
    }

    /// Distance from location `from` to location `to`, in meters.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn get(&self, from: usize, to: usize) -> u32 {
        self.data[from * self.size + to]
    }

    /// Distance from location `from` to location `to`, in kilometers.
    pub fn km(&self, from: usize, to: usize) -> f64 {
        f64::from(self.get(from, to)) / 1000.0
    }

    /// Sets the distance from location `from` to location `to`, in meters.
    pub fn set(&mut self, from: usize, to: usize, meters: u32) {
        self.data[from * self.size + to] = meters;
    }

    /// Number of locations in this matrix.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns `true` if the matrix is symmetric with a zero diagonal.
    pub fn is_symmetric(&self) -> bool {
        for i in 0..self.size {
            if self.get(i, i) != 0 {
                return false;
            }
            for j in (i + 1)..self.size {
                if self.get(i, j) != self.get(j, i) {
                    return false;
                }
            }
        }
        true
    }
}
