//! Permutation chromosome for route ordering.
//!
//! # Encoding
//!
//! A chromosome is a permutation of stop indices `0..n`. Gene `k` is the
//! index (into the problem's stop list) of the k-th visited stop. The route
//! start (home base) is not part of the permutation.

use rand::Rng;
use rand::seq::SliceRandom;
use u_metaheur::ga::Individual;

/// Visiting-order chromosome for the route GA.
///
/// Lower fitness = better route (minimization convention).
#[derive(Debug, Clone, PartialEq)]
pub struct RouteChromosome {
    /// Stop indices in visiting order.
    pub order: Vec<usize>,
    /// Fitness value (lower = better).
    pub fitness: f64,
}

impl Individual for RouteChromosome {
    type Fitness = f64;

    fn fitness(&self) -> f64 {
        self.fitness
    }

    fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }
}

impl RouteChromosome {
    /// Wraps an existing order (fitness unevaluated).
    pub fn new(order: Vec<usize>) -> Self {
        Self {
            order,
            fitness: f64::INFINITY,
        }
    }

    /// A uniformly random permutation of `0..n`.
    pub fn random<R: Rng>(n: usize, rng: &mut R) -> Self {
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);
        Self::new(order)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether `order` is a permutation of `0..n`.
    pub fn is_valid(&self, n: usize) -> bool {
        if self.order.len() != n {
            return false;
        }
        let mut seen = vec![false; n];
        for &g in &self.order {
            if g >= n || seen[g] {
                return false;
            }
            seen[g] = true;
        }
        true
    }
}

/// Per-gene swap mutation: each position is, with probability `rate`,
/// swapped with another random position.
pub fn per_gene_swap<R: Rng>(order: &mut [usize], rate: f64, rng: &mut R) {
    let n = order.len();
    if n < 2 || rate <= 0.0 {
        return;
    }
    let p = rate.min(1.0);
    for i in 0..n {
        if rng.random_bool(p) {
            let j = rng.random_range(0..n);
            order.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_random_chromosome() {
        let mut rng = SmallRng::seed_from_u64(42);
        let ch = RouteChromosome::random(8, &mut rng);

        assert_eq!(ch.len(), 8);
        assert!(ch.is_valid(8));
        assert_eq!(ch.fitness(), f64::INFINITY);
    }

    #[test]
    fn test_random_is_reproducible() {
        let a = RouteChromosome::random(10, &mut SmallRng::seed_from_u64(7));
        let b = RouteChromosome::random(10, &mut SmallRng::seed_from_u64(7));
        assert_eq!(a.order, b.order);
    }

    #[test]
    fn test_is_valid_rejects_duplicates() {
        assert!(!RouteChromosome::new(vec![0, 0, 2]).is_valid(3));
        assert!(!RouteChromosome::new(vec![0, 1]).is_valid(3));
        assert!(!RouteChromosome::new(vec![0, 1, 5]).is_valid(3));
        assert!(RouteChromosome::new(vec![2, 0, 1]).is_valid(3));
    }

    #[test]
    fn test_set_fitness() {
        let mut ch = RouteChromosome::new(vec![1, 0]);
        ch.set_fitness(12.5);
        assert!((ch.fitness - 12.5).abs() < 1e-10);
    }

    #[test]
    fn test_per_gene_swap_keeps_permutation() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut ch = RouteChromosome::random(12, &mut rng);
        for _ in 0..20 {
            per_gene_swap(&mut ch.order, 0.3, &mut rng);
            assert!(ch.is_valid(12));
        }
    }

    #[test]
    fn test_per_gene_swap_zero_rate_is_noop() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut order = vec![0, 1, 2, 3];
        per_gene_swap(&mut order, 0.0, &mut rng);
        assert_eq!(order, vec![0, 1, 2, 3]);
    }
}
