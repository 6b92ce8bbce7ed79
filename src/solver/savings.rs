//! Clarke-Wright savings construction.
//!
//! # Algorithm
//!
//! Every student starts on its own tour (school → student → school). Merging
//! the tour ending at `i` with the tour starting at `j` saves
//!
//! ```text
//! s(i, j) = d(0, i) + d(0, j) - d(i, j)
//! ```
//!
//! meters. Merges are applied in decreasing order of savings while the
//! combined tour fits one bus. Each student occupies one seat, so a tour's
//! load is its length.
//!
//! # Reference
//!
//! Clarke, G. & Wright, J.W. (1964). "Scheduling of Vehicles from a Central
//! Depot to a Number of Delivery Points", *Operations Research* 12(4).

use crate::distance::DistanceMatrix;

#[derive(Debug)]
struct Saving {
    i: usize,
    j: usize,
    meters: i64,
}

/// Builds initial tours by the savings heuristic.
///
/// Returns tours of location indices (1-based; the depot is implicit). The
/// tour count is whatever the merges produce; callers needing a fixed fleet
/// reduce it afterwards.
pub(crate) fn clarke_wright(matrix: &DistanceMatrix, capacity: usize) -> Vec<Vec<usize>> {
    let n = matrix.size();
    if n <= 1 {
        return Vec::new();
    }

    let mut savings = Vec::with_capacity((n - 1) * (n - 2) / 2);
    for i in 1..n {
        for j in (i + 1)..n {
            let s = i64::from(matrix.get(0, i)) + i64::from(matrix.get(0, j))
                - i64::from(matrix.get(i, j));
            if s > 0 {
                savings.push(Saving { i, j, meters: s });
            }
        }
    }
    // Decreasing savings; index order breaks ties so runs are reproducible.
    savings.sort_by(|a, b| b.meters.cmp(&a.meters).then_with(|| (a.i, a.j).cmp(&(b.i, b.j))));

    let mut tour_of: Vec<usize> = (0..n).collect();
    let mut members: Vec<Vec<usize>> = (0..n)
        .map(|i| if i == 0 { Vec::new() } else { vec![i] })
        .collect();

    for saving in &savings {
        let ti = tour_of[saving.i];
        let tj = tour_of[saving.j];
        if ti == tj {
            continue;
        }
        if members[ti].len() + members[tj].len() > capacity {
            continue;
        }

        // A merge is only valid across tour endpoints.
        let i_at_start = members[ti].first() == Some(&saving.i);
        let i_at_end = members[ti].last() == Some(&saving.i);
        let j_at_start = members[tj].first() == Some(&saving.j);
        let j_at_end = members[tj].last() == Some(&saving.j);

        let (from, into, reverse_from, reverse_into) = if i_at_end && j_at_start {
            (tj, ti, false, false)
        } else if j_at_end && i_at_start {
            (ti, tj, false, false)
        } else if i_at_end && j_at_end {
            (tj, ti, true, false)
        } else if i_at_start && j_at_start {
            (tj, ti, false, true)
        } else {
            continue;
        };

        let mut moved = std::mem::take(&mut members[from]);
        if reverse_from {
            moved.reverse();
        }
        if reverse_into {
            members[into].reverse();
        }
        members[into].append(&mut moved);

        for &stop in &members[into] {
            tour_of[stop] = into;
        }
    }

    members.into_iter().filter(|m| !m.is_empty()).collect()
}
