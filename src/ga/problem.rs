//! Route GA problem definition.
//!
//! Implements `u_metaheur::ga::GaProblem` for ordering the stops of one
//! route. Fitness = total route distance + `violation_penalty` per stop
//! reached outside its arrival window (or after working hours).

use rand::Rng;
use u_metaheur::ga::GaProblem;
use u_metaheur::ga::operators::order_crossover;

use super::RouteGaConfig;
use super::chromosome::{RouteChromosome, per_gene_swap};
use crate::matrix::DistanceMatrix;
use crate::routing::timeline::{RouteClock, Stop, Timeline, simulate};

/// GA problem for ordering the stops of one route.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use u_fieldops::ga::{GaRunner, RouteGaConfig, RouteGaProblem};
/// use u_fieldops::matrix::{DistanceMatrix, Location};
/// use u_fieldops::models::{Coordinate, WorkingHours};
/// use u_fieldops::routing::timeline::{RouteClock, Stop};
///
/// let locs: Vec<Location> = (0..4)
///     .map(|i| Location::new(format!("L{i}"), "", Some(Coordinate::new(38.0 + 0.1 * i as f64, -98.5))))
///     .collect();
/// let matrix = DistanceMatrix::build(&locs);
/// let stops: Vec<Stop> = (1..4)
///     .map(|row| Stop { row, duration_minutes: 30, window: None })
///     .collect();
/// let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
/// let clock = RouteClock::on(day, &WorkingHours::default(), 15);
///
/// let config = RouteGaConfig::default().with_population_size(20).with_max_generations(20);
/// let problem = RouteGaProblem::new(&matrix, Some(0), stops, clock).with_config(&config);
/// let result = GaRunner::run(&problem, &config.runner_config(42));
/// assert!(result.best_fitness < f64::INFINITY);
/// ```
pub struct RouteGaProblem<'a> {
    matrix: &'a DistanceMatrix,
    start: Option<usize>,
    stops: Vec<Stop>,
    clock: RouteClock,
    mutation_rate: f64,
    violation_penalty: f64,
}

impl<'a> RouteGaProblem<'a> {
    /// Creates a problem. `start` is the matrix row of the home base, if any.
    pub fn new(matrix: &'a DistanceMatrix, start: Option<usize>, stops: Vec<Stop>, clock: RouteClock) -> Self {
        let defaults = RouteGaConfig::default();
        Self {
            matrix,
            start,
            stops,
            clock,
            mutation_rate: defaults.mutation_rate,
            violation_penalty: defaults.violation_penalty,
        }
    }

    /// Takes mutation rate and violation penalty from `config`.
    pub fn with_config(mut self, config: &RouteGaConfig) -> Self {
        self.mutation_rate = config.mutation_rate;
        self.violation_penalty = config.violation_penalty;
        self
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Simulates the route for a visiting order of stop indices.
    pub fn simulate(&self, order: &[usize]) -> Timeline {
        simulate(
            self.matrix,
            self.start,
            order.iter().filter_map(|&i| self.stops.get(i)),
            &self.clock,
        )
    }
}

impl GaProblem for RouteGaProblem<'_> {
    type Individual = RouteChromosome;

    fn create_individual<R: Rng>(&self, rng: &mut R) -> RouteChromosome {
        RouteChromosome::random(self.stops.len(), rng)
    }

    fn evaluate(&self, individual: &RouteChromosome) -> f64 {
        let timeline = self.simulate(&individual.order);
        timeline.total_distance + self.violation_penalty * timeline.violations as f64
    }

    fn crossover<R: Rng>(
        &self,
        parent1: &RouteChromosome,
        parent2: &RouteChromosome,
        rng: &mut R,
    ) -> Vec<RouteChromosome> {
        // OX needs two equal, non-empty permutations.
        if parent1.len() < 2 || parent1.len() != parent2.len() {
            return vec![RouteChromosome::new(parent1.order.clone())];
        }
        let (c1, c2) = order_crossover(&parent1.order, &parent2.order, rng);
        vec![RouteChromosome::new(c1), RouteChromosome::new(c2)]
    }

    fn mutate<R: Rng>(&self, individual: &mut RouteChromosome, rng: &mut R) {
        per_gene_swap(&mut individual.order, self.mutation_rate, rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::GaRunner;
    use crate::matrix::Location;
    use crate::models::{ArrivalWindow, Coordinate, WorkingHours};
    use chrono::{NaiveDate, NaiveTime};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn clock() -> RouteClock {
        RouteClock::on(
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            &WorkingHours::default(),
            15,
        )
    }

    /// Home at row 0, stops at rows 1..=n along a rural meridian.
    fn line(n: usize) -> DistanceMatrix {
        let locs: Vec<Location> = (0..=n)
            .map(|i| {
                Location::new(
                    format!("L{i}"),
                    "",
                    Some(Coordinate::new(38.0 + 0.1 * i as f64, -98.5)),
                )
            })
            .collect();
        DistanceMatrix::build(&locs)
    }

    fn stops(n: usize) -> Vec<Stop> {
        (1..=n)
            .map(|row| Stop {
                row,
                duration_minutes: 20,
                window: None,
            })
            .collect()
    }

    #[test]
    fn test_evaluate_in_order_is_path_length() {
        let m = line(3);
        let problem = RouteGaProblem::new(&m, Some(0), stops(3), clock());
        let f = problem.evaluate(&RouteChromosome::new(vec![0, 1, 2]));
        let expected = m.distance_at(0, 1) + m.distance_at(1, 2) + m.distance_at(2, 3);
        assert!((f - expected).abs() < 1e-10);
    }

    #[test]
    fn test_violation_penalty_applied() {
        let m = line(2);
        let mut s = stops(2);
        let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        s[0].window = Some(ArrivalWindow::new(t(8), t(8)));
        let problem = RouteGaProblem::new(&m, Some(0), s, clock());

        // Visiting stop 1 first makes stop 0 miss its 08:00 window.
        let late = problem.evaluate(&RouteChromosome::new(vec![1, 0]));
        let tl = problem.simulate(&[1, 0]);
        assert_eq!(tl.violations, 1);
        assert!((late - (tl.total_distance + 1000.0)).abs() < 1e-10);
    }

    #[test]
    fn test_crossover_keeps_permutation() {
        let m = line(8);
        let problem = RouteGaProblem::new(&m, Some(0), stops(8), clock());
        let mut rng = SmallRng::seed_from_u64(42);
        let p1 = RouteChromosome::new((0..8).collect());
        let p2 = RouteChromosome::new((0..8).rev().collect());

        for _ in 0..50 {
            for child in problem.crossover(&p1, &p2, &mut rng) {
                assert!(child.is_valid(8), "invalid child {:?}", child.order);
            }
        }
    }

    #[test]
    fn test_crossover_single_stop() {
        let m = line(1);
        let problem = RouteGaProblem::new(&m, Some(0), stops(1), clock());
        let p = RouteChromosome::new(vec![0]);
        let children = problem.crossover(&p, &p, &mut SmallRng::seed_from_u64(1));
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].order, vec![0]);
    }

    #[test]
    fn test_mutation_uses_configured_rate() {
        let m = line(6);
        let frozen = RouteGaConfig::default().with_mutation_rate(0.0);
        let problem = RouteGaProblem::new(&m, Some(0), stops(6), clock()).with_config(&frozen);
        let mut ch = RouteChromosome::new((0..6).collect());
        problem.mutate(&mut ch, &mut SmallRng::seed_from_u64(3));
        assert_eq!(ch.order, (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn test_ga_finds_monotone_order() {
        let m = line(6);
        let problem = RouteGaProblem::new(&m, Some(0), stops(6), clock());
        let result = GaRunner::run(&problem, &RouteGaConfig::default().runner_config(42));

        // Straight line from home outwards is optimal.
        let optimal = problem.evaluate(&RouteChromosome::new((0..6).collect()));
        assert!(result.best.is_valid(6));
        assert!(result.best_fitness >= optimal - 1e-9);
        assert!(result.best_fitness <= optimal * 1.5);
        assert_eq!(result.generations, 100);
    }

    #[test]
    fn test_ga_respects_windows() {
        let m = line(3);
        let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        let mut s = stops(3);
        // Farthest stop must be visited first.
        s[2].window = Some(ArrivalWindow::new(t(8), t(9)));
        let problem = RouteGaProblem::new(&m, Some(0), s, clock());
        let result = GaRunner::run(&problem, &RouteGaConfig::default().runner_config(42));

        assert_eq!(result.best.order[0], 2);
        assert_eq!(problem.simulate(&result.best.order).violations, 0);
    }

    #[test]
    fn test_same_seed_same_route() {
        let m = line(7);
        let problem = RouteGaProblem::new(&m, Some(0), stops(7), clock());
        let config = RouteGaConfig::default()
            .with_population_size(10)
            .with_max_generations(10)
            .runner_config(9);
        let a = GaRunner::run(&problem, &config);
        let b = GaRunner::run(&problem, &config);
        assert_eq!(a.best.order, b.best.order);
        assert_eq!(a.fitness_history, b.fitness_history);
    }

    #[test]
    fn test_best_history_never_worsens() {
        let m = line(8);
        let problem = RouteGaProblem::new(&m, Some(0), stops(8), clock());
        let config = RouteGaConfig::default()
            .with_population_size(20)
            .with_max_generations(30)
            .runner_config(42);
        let result = GaRunner::run(&problem, &config);

        assert_eq!(result.fitness_history.len(), 31);
        for w in result.fitness_history.windows(2) {
            assert!(w[1] <= w[0]);
        }
        assert!(!result.timed_out);
    }
}
