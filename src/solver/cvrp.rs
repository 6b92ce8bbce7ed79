//! Budgeted savings-plus-local-search CVRP solver.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::local_search::{exchange, or_opt, relocate, total_distance, two_opt};
use super::savings::clarke_wright;
use super::CvrpSolver;
use crate::distance::DistanceMatrix;

/// Consecutive fruitless perturbation rounds tolerated before stopping
/// ahead of the wall-clock budget.
const STALL_LIMIT: u32 = 12;

/// Default CVRP solver.
///
/// Builds an initial solution with Clarke-Wright savings, forces it onto the
/// requested fleet, then improves it with 2-opt, Or-opt, relocate, and
/// exchange moves. Remaining budget is spent on seeded double-bridge
/// perturbations, keeping the best solution seen.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use busroute::distance::DistanceMatrix;
/// use busroute::models::Point;
/// use busroute::solver::{CvrpSolver, SavingsSolver};
///
/// let school = Point::new(1.30, 103.80);
/// let students = vec![
///     Point::new(1.31, 103.80),
///     Point::new(1.32, 103.80),
///     Point::new(1.33, 103.80),
/// ];
/// let matrix = DistanceMatrix::build(school, &students, 1.3);
/// let solver = SavingsSolver::new(Duration::from_millis(50));
///
/// let tours = solver.solve(&matrix, 1, 40).expect("feasible");
/// assert_eq!(tours.len(), 1);
/// assert_eq!(tours[0].len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct SavingsSolver {
    budget: Duration,
    seed: u64,
}

impl SavingsSolver {
    /// Solver with the given wall-clock budget per invocation.
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            seed: 0x5eed_b005,
        }
    }

    /// Overrides the perturbation seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl CvrpSolver for SavingsSolver {
    fn solve(
        &self,
        matrix: &DistanceMatrix,
        fleet: usize,
        capacity: usize,
    ) -> Option<Vec<Vec<usize>>> {
        let students = matrix.size().saturating_sub(1);
        if students == 0 || fleet == 0 || capacity == 0 {
            return None;
        }
        if students > fleet * capacity {
            return None;
        }

        let start = Instant::now();
        let mut tours = clarke_wright(matrix, capacity);
        reduce_to_fleet(&mut tours, matrix, fleet, capacity)?;
        improve(&mut tours, matrix, capacity);

        let mut best = tours.clone();
        let mut best_meters = total_distance(&best, matrix);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut stall = 0;
        while start.elapsed() < self.budget && stall < STALL_LIMIT {
            perturb(&mut tours, &mut rng);
            improve(&mut tours, matrix, capacity);
            let meters = total_distance(&tours, matrix);
            if meters < best_meters {
                best = tours.clone();
                best_meters = meters;
                stall = 0;
            } else {
                tours = best.clone();
                stall += 1;
            }
        }

        debug!(
            tours = best.len(),
            meters = best_meters,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "cvrp solved"
        );
        Some(best)
    }
}

/// Iterates the improvement operators to a combined local optimum.
fn improve(tours: &mut Vec<Vec<usize>>, matrix: &DistanceMatrix, capacity: usize) {
    let mut improved = true;
    while improved {
        improved = false;
        for tour in tours.iter_mut() {
            improved |= two_opt(tour, matrix);
            improved |= or_opt(tour, matrix);
        }
        improved |= relocate(tours, matrix, capacity);
        improved |= exchange(tours, matrix);
        tours.retain(|t| !t.is_empty());
    }
}

/// Dissolves the smallest tours until at most `fleet` remain.
///
/// Every stop occupies one seat, so when `n <= fleet * capacity` holds the
/// remaining tours always have enough spare seats to absorb a dissolved
/// tour; `None` only guards against violated preconditions.
fn reduce_to_fleet(
    tours: &mut Vec<Vec<usize>>,
    matrix: &DistanceMatrix,
    fleet: usize,
    capacity: usize,
) -> Option<()> {
    while tours.len() > fleet {
        let smallest = tours
            .iter()
            .enumerate()
            .min_by_key(|(_, t)| t.len())
            .map(|(i, _)| i)?;
        let dissolved = tours.remove(smallest);

        for stop in dissolved {
            let mut best: Option<(usize, usize, i64)> = None;
            for (ti, tour) in tours.iter().enumerate() {
                if tour.len() >= capacity {
                    continue;
                }
                for at in 0..=tour.len() {
                    let a = if at == 0 { 0 } else { tour[at - 1] };
                    let b = if at == tour.len() { 0 } else { tour[at] };
                    let cost = i64::from(matrix.get(a, stop)) + i64::from(matrix.get(stop, b))
                        - i64::from(matrix.get(a, b));
                    if best.map_or(true, |(.., c)| cost < c) {
                        best = Some((ti, at, cost));
                    }
                }
            }
            let (ti, at, _) = best?;
            tours[ti].insert(at, stop);
        }
    }
    Some(())
}

/// Double-bridge kick on the longest tour; short tours are reversed.
fn perturb(tours: &mut [Vec<usize>], rng: &mut StdRng) {
    let Some(longest) = (0..tours.len()).max_by_key(|&i| tours[i].len()) else {
        return;
    };
    let tour = &mut tours[longest];
    let n = tour.len();

    if n >= 4 {
        let a = 1 + rng.random_range(0..n - 3);
        let b = a + 1 + rng.random_range(0..n - a - 2);
        let c = b + 1 + rng.random_range(0..n - b - 1);
        let mut next = Vec::with_capacity(n);
        next.extend_from_slice(&tour[..a]);
        next.extend_from_slice(&tour[b..c]);
        next.extend_from_slice(&tour[a..b]);
        next.extend_from_slice(&tour[c..]);
        *tour = next;
    } else if n >= 2 {
        tour.reverse();
    }
}
