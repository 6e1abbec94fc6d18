//! Genetic algorithm for multi-stop route ordering.
//!
//! Built on the `u-metaheur` GA framework: [`RouteGaProblem`] implements
//! [`GaProblem`] with a permutation encoding, order crossover and per-gene
//! swap mutation, and [`GaRunner`] drives the evolutionary loop.
//!
//! # Algorithm
//!
//! 1. Create `population_size` random visiting orders and evaluate them.
//! 2. Each generation keeps the best `elite_count` unchanged, then fills the
//!    rest by tournament selection, order crossover and swap mutation.
//! 3. After `max_generations` (or when the time limit runs out) the best
//!    order seen is returned.
//!
//! [`RouteGaConfig`] is the serde-facing parameter set; it is translated
//! into a runner configuration per run, seeded from the caller's RNG so a
//! seeded RNG reproduces a run exactly.
//!
//! # Reference
//! - Holland (1975), "Adaptation in Natural and Artificial Systems"
//! - Davis (1985), "Applying Adaptive Algorithms to Epistatic Domains" (OX)

mod chromosome;
mod problem;

pub use chromosome::{RouteChromosome, per_gene_swap};
pub use problem::RouteGaProblem;
pub use u_metaheur::ga::{GaProblem, GaResult, GaRunner, Individual};

use serde::{Deserialize, Serialize};
use u_metaheur::ga::{GaConfig, Selection};

/// Route GA parameters.
///
/// # Example
/// ```
/// use u_fieldops::ga::RouteGaConfig;
///
/// let config = RouteGaConfig::default()
///     .with_population_size(20)
///     .with_max_generations(30);
/// assert_eq!(config.elite_count, 10);
///
/// let runner = config.runner_config(42);
/// assert_eq!(runner.population_size, 20);
/// assert!(runner.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteGaConfig {
    /// Individuals per generation (default: 50, minimum 2).
    pub population_size: usize,
    /// Generations to run (default: 100, minimum 1).
    pub max_generations: usize,
    /// Best individuals copied unchanged into each generation (default: 10).
    pub elite_count: usize,
    /// Per-gene swap probability (default: 0.10).
    pub mutation_rate: f64,
    /// Fitness penalty per arrival-window violation (default: 1000).
    pub violation_penalty: f64,
    /// Tournament size for parent selection (default: 3).
    pub tournament_size: usize,
    /// Wall-clock budget per run in milliseconds. `None` = unlimited,
    /// `Some(0)` = no budget at all.
    pub time_limit_ms: Option<u64>,
}

impl Default for RouteGaConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            max_generations: 100,
            elite_count: 10,
            mutation_rate: 0.10,
            violation_penalty: 1000.0,
            tournament_size: 3,
            time_limit_ms: None,
        }
    }
}

impl RouteGaConfig {
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size.max(2);
        self
    }

    pub fn with_max_generations(mut self, generations: usize) -> Self {
        self.max_generations = generations;
        self
    }

    pub fn with_elite_count(mut self, count: usize) -> Self {
        self.elite_count = count;
        self
    }

    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_violation_penalty(mut self, penalty: f64) -> Self {
        self.violation_penalty = penalty.max(0.0);
        self
    }

    pub fn with_tournament_size(mut self, size: usize) -> Self {
        self.tournament_size = size.max(1);
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Whether a run may start at all under `time_limit_ms`.
    pub fn has_time_budget(&self) -> bool {
        self.time_limit_ms != Some(0)
    }

    /// Runner configuration for one seeded run.
    ///
    /// Out-of-range values are clamped so the result always validates.
    /// Crossover is applied to every pair and mutation to every child; the
    /// per-gene `mutation_rate` is applied inside [`RouteGaProblem`].
    /// Stagnation stopping is off. Evaluation stays on the calling thread,
    /// since route runs are already spread across teams.
    pub fn runner_config(&self, seed: u64) -> GaConfig {
        let population = self.population_size.max(2);
        let elites = self.elite_count.min(population - 1);
        // Midpoint ratio so the runner's floor(population * ratio) == elites.
        let elite_ratio = (elites as f64 + 0.5) / population as f64;

        let mut config = GaConfig::default()
            .with_population_size(population)
            .with_max_generations(self.max_generations.max(1))
            .with_selection(Selection::Tournament(self.tournament_size.max(1)))
            .with_elite_ratio(elite_ratio)
            .with_crossover_rate(1.0)
            .with_mutation_rate(1.0)
            .with_stagnation_limit(0)
            .with_parallel(false)
            .with_seed(seed);
        if let Some(ms) = self.time_limit_ms.filter(|&ms| ms > 0) {
            config = config.with_time_limit_ms(ms);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = RouteGaConfig::default();
        assert_eq!(c.population_size, 50);
        assert_eq!(c.max_generations, 100);
        assert_eq!(c.elite_count, 10);
        assert!((c.mutation_rate - 0.10).abs() < 1e-10);
        assert!(c.has_time_budget());
    }

    #[test]
    fn test_runner_config_keeps_elite_count() {
        for (population, elites) in [(50, 10), (7, 3), (30, 9), (100, 1), (3, 0)] {
            let runner = RouteGaConfig::default()
                .with_population_size(population)
                .with_elite_count(elites)
                .runner_config(1);
            let kept = (runner.population_size as f64 * runner.elite_ratio) as usize;
            assert_eq!(kept, elites, "population {population}");
        }
    }

    #[test]
    fn test_runner_config_clamps_to_valid() {
        let config = RouteGaConfig {
            population_size: 0,
            max_generations: 0,
            elite_count: 50,
            tournament_size: 0,
            ..RouteGaConfig::default()
        };
        let runner = config.runner_config(7);
        assert!(runner.validate().is_ok());
        assert_eq!(runner.population_size, 2);
        assert_eq!(runner.max_generations, 1);
        assert_eq!(runner.selection, Selection::Tournament(1));
        assert_eq!(runner.seed, Some(7));
        assert_eq!(runner.stagnation_limit, 0);
        assert!(!runner.parallel);
    }

    #[test]
    fn test_time_limit() {
        let limited = RouteGaConfig::default().with_time_limit_ms(250);
        assert_eq!(limited.runner_config(1).time_limit_ms, Some(250));

        let none = RouteGaConfig::default().with_time_limit_ms(0);
        assert!(!none.has_time_budget());
        assert!(none.runner_config(1).validate().is_ok());
    }

    #[test]
    fn test_serde_partial() {
        let c: RouteGaConfig = serde_json::from_str(r#"{ "population_size": 12 }"#).unwrap();
        assert_eq!(c.population_size, 12);
        assert_eq!(c.max_generations, 100);
        assert!(c.time_limit_ms.is_none());
    }
}
