//! Construction and local-search heuristics on an open path.
//!
//! Paths are sequences of matrix rows. The optional start row (home base)
//! is fixed and not part of the sequence; the path does not return to it.
//!
//! # Complexity
//! - Nearest neighbor: O(n²)
//! - 2-opt: O(n²) per pass, repeated until no improving move remains

use log::debug;

use crate::matrix::DistanceMatrix;

/// Minimum gain for a 2-opt move to count as an improvement (miles).
const IMPROVEMENT_EPS: f64 = 1e-6;

/// Safety cap on 2-opt passes.
const MAX_PASSES: usize = 1_000;

/// Length of an open path, including the leg from `start` when given.
pub fn path_distance(matrix: &DistanceMatrix, start: Option<usize>, order: &[usize]) -> f64 {
    let mut total = 0.0;
    let mut prev = start;
    for &row in order {
        if let Some(p) = prev {
            total += matrix.distance_at(p, row);
        }
        prev = Some(row);
    }
    total
}

/// Greedy nearest-neighbor ordering of `stops`, starting from `start`.
///
/// Without a start row the first stop is taken as the starting point. Ties
/// go to the stop listed first.
pub fn nearest_neighbor(matrix: &DistanceMatrix, start: Option<usize>, stops: &[usize]) -> Vec<usize> {
    let mut remaining: Vec<usize> = stops.to_vec();
    let mut order = Vec::with_capacity(stops.len());

    let mut current = match start {
        Some(s) => s,
        None => {
            if remaining.is_empty() {
                return order;
            }
            let first = remaining.remove(0);
            order.push(first);
            first
        }
    };

    while !remaining.is_empty() {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (k, &row) in remaining.iter().enumerate() {
            let d = matrix.distance_at(current, row);
            if d < best_dist {
                best_dist = d;
                best = k;
            }
        }
        current = remaining.remove(best);
        order.push(current);
    }
    order
}

/// Improves `order` in place with 2-opt segment reversals.
///
/// Any segment `order[i..=j]` may be reversed; for an open path only the
/// two boundary edges change, so each move is evaluated in O(1). Returns the
/// number of improving moves applied. The result is never longer than the
/// input.
pub fn two_opt(matrix: &DistanceMatrix, start: Option<usize>, order: &mut [usize]) -> usize {
    let n = order.len();
    if n < 2 {
        return 0;
    }

    let mut moves = 0;
    for _ in 0..MAX_PASSES {
        let mut improved = false;
        for i in 0..n - 1 {
            for j in (i + 1)..n {
                let prev = if i == 0 { start } else { Some(order[i - 1]) };
                let next = order.get(j + 1).copied();

                let edge = |a: Option<usize>, b: usize| a.map_or(0.0, |a| matrix.distance_at(a, b));
                let before = edge(prev, order[i]) + next.map_or(0.0, |q| matrix.distance_at(order[j], q));
                let after = edge(prev, order[j]) + next.map_or(0.0, |q| matrix.distance_at(order[i], q));

                if after < before - IMPROVEMENT_EPS {
                    order[i..=j].reverse();
                    moves += 1;
                    improved = true;
                }
            }
        }
        if !improved {
            break;
        }
    }

    debug!("2-opt applied {moves} improving moves on {n} stops");
    moves
}
