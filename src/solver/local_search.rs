//! Local-search operators over tours of matrix locations.
//!
//! Tours are sequences of location indices (the depot, index 0, is implicit
//! at both ends). All deltas are exact integer meters, so every accepted
//! move strictly decreases total distance and each operator terminates.
//!
//! - [`two_opt`] — intra-route edge reversal (Croes, 1958)
//! - [`or_opt`] — intra-route relocation of 1-3 consecutive stops (Or, 1976)
//! - [`relocate`] — inter-route single-stop relocation
//! - [`exchange`] — inter-route one-for-one stop swap

use crate::distance::DistanceMatrix;

/// Total distance of `depot → tour[0] → … → tour[n-1] → depot` in meters.
pub(crate) fn route_distance(tour: &[usize], matrix: &DistanceMatrix) -> i64 {
    if tour.is_empty() {
        return 0;
    }
    let mut meters = i64::from(matrix.get(0, tour[0]));
    for pair in tour.windows(2) {
        meters += i64::from(matrix.get(pair[0], pair[1]));
    }
    meters + i64::from(matrix.get(tour[tour.len() - 1], 0))
}

/// Total distance across all tours, in meters.
pub(crate) fn total_distance(tours: &[Vec<usize>], matrix: &DistanceMatrix) -> i64 {
    tours.iter().map(|t| route_distance(t, matrix)).sum()
}

/// Repeats 2-opt passes until no edge swap improves the tour.
///
/// Returns `true` if the tour changed.
pub(crate) fn two_opt(tour: &mut [usize], matrix: &DistanceMatrix) -> bool {
    let n = tour.len();
    if n < 2 {
        return false;
    }

    let mut changed = false;
    let mut improved = true;
    while improved {
        improved = false;
        for i in 0..n - 1 {
            for j in i + 1..n {
                if two_opt_delta(tour, matrix, i, j) < 0 {
                    tour[i..=j].reverse();
                    improved = true;
                    changed = true;
                }
            }
        }
    }
    changed
}

/// Distance change from reversing `tour[i..=j]`.
fn two_opt_delta(tour: &[usize], matrix: &DistanceMatrix, i: usize, j: usize) -> i64 {
    let n = tour.len();
    let before = if i == 0 { 0 } else { tour[i - 1] };
    let after = if j == n - 1 { 0 } else { tour[j + 1] };

    let old = i64::from(matrix.get(before, tour[i])) + i64::from(matrix.get(tour[j], after));
    let new = i64::from(matrix.get(before, tour[j])) + i64::from(matrix.get(tour[i], after));
    new - old
}

/// Relocates segments of 1-3 consecutive stops within the tour while any
/// such move shortens it.
///
/// Returns `true` if the tour changed.
pub(crate) fn or_opt(tour: &mut Vec<usize>, matrix: &DistanceMatrix) -> bool {
    if tour.len() < 3 {
        return false;
    }

    let mut changed = false;
    let mut improved = true;
    while improved {
        improved = false;
        for seg_len in 1..=3usize.min(tour.len() - 1) {
            if or_opt_pass(tour, matrix, seg_len) {
                improved = true;
                changed = true;
            }
        }
    }
    changed
}

/// One first-improvement pass moving a segment of `seg_len` stops.
fn or_opt_pass(tour: &mut Vec<usize>, matrix: &DistanceMatrix, seg_len: usize) -> bool {
    let n = tour.len();
    for start in 0..=n - seg_len {
        let end = start + seg_len;
        let before = if start == 0 { 0 } else { tour[start - 1] };
        let after = if end == n { 0 } else { tour[end] };
        let first = tour[start];
        let last = tour[end - 1];

        let gain = i64::from(matrix.get(before, first)) + i64::from(matrix.get(last, after))
            - i64::from(matrix.get(before, after));
        if gain <= 0 {
            continue;
        }

        let rest: Vec<usize> = tour[..start]
            .iter()
            .chain(&tour[end..])
            .copied()
            .collect();
        for pos in 0..=rest.len() {
            if pos == start {
                continue;
            }
            let a = if pos == 0 { 0 } else { rest[pos - 1] };
            let b = if pos == rest.len() { 0 } else { rest[pos] };
            let cost = i64::from(matrix.get(a, first)) + i64::from(matrix.get(last, b))
                - i64::from(matrix.get(a, b));
            if cost < gain {
                let mut next = Vec::with_capacity(n);
                next.extend_from_slice(&rest[..pos]);
                next.extend_from_slice(&tour[start..end]);
                next.extend_from_slice(&rest[pos..]);
                *tour = next;
                return true;
            }
        }
    }
    false
}

/// Moves single stops between tours while any move shortens the total and
/// the target tour has seats left.
///
/// May leave a tour empty; callers drop empty tours.
pub(crate) fn relocate(tours: &mut [Vec<usize>], matrix: &DistanceMatrix, capacity: usize) -> bool {
    if tours.len() < 2 {
        return false;
    }

    let mut changed = false;
    loop {
        let mut best: Option<(usize, usize, usize, usize, i64)> = None;

        for from in 0..tours.len() {
            for pos in 0..tours[from].len() {
                let stop = tours[from][pos];
                let before = if pos == 0 { 0 } else { tours[from][pos - 1] };
                let after = if pos + 1 == tours[from].len() {
                    0
                } else {
                    tours[from][pos + 1]
                };
                let gain = i64::from(matrix.get(before, stop))
                    + i64::from(matrix.get(stop, after))
                    - i64::from(matrix.get(before, after));

                for to in 0..tours.len() {
                    if to == from || tours[to].len() >= capacity {
                        continue;
                    }
                    for at in 0..=tours[to].len() {
                        let a = if at == 0 { 0 } else { tours[to][at - 1] };
                        let b = if at == tours[to].len() { 0 } else { tours[to][at] };
                        let delta = i64::from(matrix.get(a, stop))
                            + i64::from(matrix.get(stop, b))
                            - i64::from(matrix.get(a, b))
                            - gain;
                        if delta < best.map_or(0, |(.., d)| d) {
                            best = Some((from, pos, to, at, delta));
                        }
                    }
                }
            }
        }

        match best {
            Some((from, pos, to, at, _)) => {
                let stop = tours[from].remove(pos);
                tours[to].insert(at, stop);
                changed = true;
            }
            None => break,
        }
    }
    changed
}

/// Swaps one stop between two tours while any swap shortens the total.
///
/// A one-for-one swap leaves both loads unchanged, so capacity cannot be
/// violated.
pub(crate) fn exchange(tours: &mut [Vec<usize>], matrix: &DistanceMatrix) -> bool {
    if tours.len() < 2 {
        return false;
    }

    let mut changed = false;
    loop {
        let mut best: Option<(usize, usize, usize, usize, i64)> = None;

        for r1 in 0..tours.len() {
            for r2 in r1 + 1..tours.len() {
                for p1 in 0..tours[r1].len() {
                    for p2 in 0..tours[r2].len() {
                        let delta = swap_delta(&tours[r1], p1, &tours[r2], p2, matrix);
                        if delta < best.map_or(0, |(.., d)| d) {
                            best = Some((r1, p1, r2, p2, delta));
                        }
                    }
                }
            }
        }

        match best {
            Some((r1, p1, r2, p2, _)) => {
                let a = tours[r1][p1];
                let b = tours[r2][p2];
                tours[r1][p1] = b;
                tours[r2][p2] = a;
                changed = true;
            }
            None => break,
        }
    }
    changed
}

fn swap_delta(t1: &[usize], p1: usize, t2: &[usize], p2: usize, matrix: &DistanceMatrix) -> i64 {
    let replace_cost = |tour: &[usize], pos: usize, stop: usize| {
        let before = if pos == 0 { 0 } else { tour[pos - 1] };
        let after = if pos + 1 == tour.len() { 0 } else { tour[pos + 1] };
        let old = i64::from(matrix.get(before, tour[pos])) + i64::from(matrix.get(tour[pos], after));
        let new = i64::from(matrix.get(before, stop)) + i64::from(matrix.get(stop, after));
        new - old
    };
    replace_cost(t1, p1, t2[p2]) + replace_cost(t2, p2, t1[p1])
}
