//! Multi-stop route optimization for a single team.
//!
//! # Algorithm
//!
//! - **Base** ([`RouteOptimizer::optimize_route`]): nearest-neighbor
//!   construction from the team's home base (or from the first job when the
//!   home base is not geocoded), then 2-opt to stability.
//! - **Advanced** ([`RouteOptimizer::optimize_multi_stop_route`]): keeps jobs
//!   within `max_distance` of the home base, caps the stop count at
//!   `max_jobs`, then searches visiting orders with the route GA, penalizing
//!   arrival-window misses.
//!
//! Both report savings against the naive route that visits jobs in input
//! order. Jobs without a usable coordinate are listed in
//! [`TravelOptimization::skipped_job_ids`], never silently dropped.
//!
//! # Reference
//! - Rosenkrantz, Stearns & Lewis (1977), nearest-neighbor tour construction
//! - Croes (1958), "A Method for Solving Traveling-Salesman Problems" (2-opt)

pub mod bulk;
mod heuristics;
pub mod timeline;

pub use bulk::{TeamRouteOutcome, TeamRouteRequest, optimize_teams};
pub use heuristics::{nearest_neighbor, path_distance, two_opt};

use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{FieldOpsError, Result};
use crate::ga::{GaRunner, RouteGaConfig, RouteGaProblem};
use crate::geo::{haversine_miles, round2};
use crate::matrix::{DistanceCache, DistanceMatrix, Location};
use crate::models::{
    Job, RoutePoint, RouteSavings, SchedulingConstraints, TeamMember, TravelOptimization,
    WorkingHours,
};
use timeline::{RouteClock, Stop, Timeline, simulate};

/// Limits for [`RouteOptimizer::optimize_multi_stop_route`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiStopConstraints {
    /// Maximum distance of a stop from the home base, miles.
    /// `None` = the team's travel radius.
    pub max_distance: Option<f64>,
    /// Maximum number of stops. `None` = unlimited.
    pub max_jobs: Option<usize>,
}

impl MultiStopConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_distance(mut self, miles: f64) -> Self {
        self.max_distance = Some(miles);
        self
    }

    pub fn with_max_jobs(mut self, max: usize) -> Self {
        self.max_jobs = Some(max);
        self
    }
}

/// Route optimizer for one team at a time.
///
/// Stateless apart from configuration; a shared [`DistanceCache`] may be
/// attached to memoize distances across calls and threads.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use u_fieldops::models::{Job, TeamMember};
/// use u_fieldops::routing::RouteOptimizer;
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
/// let team = TeamMember::new("T1", "north").with_home("Depot", 38.0, -98.5);
/// let jobs = vec![
///     Job::new("J1", "a", day).with_coordinate(38.3, -98.5),
///     Job::new("J2", "b", day).with_coordinate(38.1, -98.5),
///     Job::new("J3", "c", day).with_coordinate(38.2, -98.5),
/// ];
///
/// let route = RouteOptimizer::new().optimize_route(&jobs, &team);
/// assert_eq!(route.job_order(), vec!["J2", "J3", "J1"]);
/// assert!(route.savings.distance_saved > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct RouteOptimizer {
    ga: RouteGaConfig,
    working_hours: WorkingHours,
    buffer_minutes: u32,
    cache: Option<Arc<DistanceCache>>,
}

/// Jobs prepared for routing: matrix, optional home row and stop rows.
struct Prepared<'j> {
    jobs: Vec<&'j Job>,
    matrix: DistanceMatrix,
    start: Option<usize>,
}

impl Prepared<'_> {
    /// Matrix row of the k-th job.
    fn row(&self, k: usize) -> usize {
        if self.start.is_some() {
            k + 1
        } else {
            k
        }
    }

    /// Job index of a matrix row.
    fn job_index(&self, row: usize) -> usize {
        if self.start.is_some() {
            row - 1
        } else {
            row
        }
    }

    fn stops(&self) -> Vec<Stop> {
        self.jobs
            .iter()
            .enumerate()
            .map(|(k, job)| Stop {
                row: self.row(k),
                duration_minutes: job.duration_minutes,
                window: job.arrival_window,
            })
            .collect()
    }
}

impl Default for RouteOptimizer {
    fn default() -> Self {
        Self {
            ga: RouteGaConfig::default(),
            working_hours: WorkingHours::default(),
            buffer_minutes: 15,
            cache: None,
        }
    }
}

impl RouteOptimizer {
    /// Optimizer with default GA settings, 08:00-18:00 and a 15 minute buffer.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ga_config(mut self, config: RouteGaConfig) -> Self {
        self.ga = config;
        self
    }

    pub fn with_working_hours(mut self, hours: WorkingHours) -> Self {
        self.working_hours = hours;
        self
    }

    pub fn with_buffer(mut self, minutes: u32) -> Self {
        self.buffer_minutes = minutes;
        self
    }

    /// Takes working hours and buffer from round constraints.
    pub fn with_constraints(self, constraints: &SchedulingConstraints) -> Self {
        self.with_working_hours(constraints.working_hours)
            .with_buffer(constraints.buffer_minutes)
    }

    pub fn with_cache(mut self, cache: Arc<DistanceCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn ga_config(&self) -> &RouteGaConfig {
        &self.ga
    }

    /// Nearest-neighbor + 2-opt route over `jobs`.
    pub fn optimize_route(&self, jobs: &[Job], team: &TeamMember) -> TravelOptimization {
        let (located, skipped) = split_located(jobs, &team.id);
        if located.len() <= 1 {
            return self.trivial_route(team, &located, skipped);
        }

        let prepared = self.prepare(team, located);
        let stops = prepared.stops();
        let rows: Vec<usize> = stops.iter().map(|s| s.row).collect();

        let mut order = nearest_neighbor(&prepared.matrix, prepared.start, &rows);
        let nn_distance = path_distance(&prepared.matrix, prepared.start, &order);
        two_opt(&prepared.matrix, prepared.start, &mut order);
        debug!(
            "team {}: nearest neighbor {:.2} mi, after 2-opt {:.2} mi",
            team.id,
            nn_distance,
            path_distance(&prepared.matrix, prepared.start, &order)
        );

        let visit: Vec<usize> = order.iter().map(|&r| prepared.job_index(r)).collect();
        self.assemble(team, &prepared, &stops, &visit, skipped)
    }

    /// Constrained multi-stop route searched by the GA.
    ///
    /// The GA is seeded from `rng`, so a seeded `rng` reproduces the route.
    /// Fails only when the GA exceeds `RouteGaConfig::time_limit_ms`.
    pub fn optimize_multi_stop_route<R: Rng>(
        &self,
        jobs: &[Job],
        team: &TeamMember,
        constraints: &MultiStopConstraints,
        rng: &mut R,
    ) -> Result<TravelOptimization> {
        let (mut located, mut skipped) = split_located(jobs, &team.id);

        if let Some(home) = team.home() {
            let limit = constraints.max_distance.unwrap_or(team.travel_radius_miles);
            located.retain(|job| {
                let in_range = job
                    .location()
                    .is_some_and(|c| haversine_miles(&home, &c) <= limit);
                if !in_range {
                    debug!("team {}: job {} beyond {:.1} mi", team.id, job.id, limit);
                    skipped.push(job.id.clone());
                }
                in_range
            });
        }
        if let Some(max_jobs) = constraints.max_jobs {
            if located.len() > max_jobs {
                skipped.extend(located.drain(max_jobs..).map(|j| j.id.clone()));
            }
        }

        if located.len() <= 1 {
            return Ok(self.trivial_route(team, &located, skipped));
        }

        if !self.ga.has_time_budget() {
            warn!("team {}: no GA time budget", team.id);
            return Err(FieldOpsError::TimedOut {
                team_id: team.id.clone(),
                elapsed_ms: 0,
            });
        }

        let prepared = self.prepare(team, located);
        let stops = prepared.stops();
        let clock = self.clock_for(&prepared.jobs);
        let problem = RouteGaProblem::new(&prepared.matrix, prepared.start, stops.clone(), clock)
            .with_config(&self.ga);
        let started = Instant::now();
        let result = GaRunner::run(&problem, &self.ga.runner_config(rng.random()));
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if result.timed_out {
            warn!(
                "team {}: GA stopped after {} generations ({} ms)",
                team.id, result.generations, elapsed_ms
            );
            return Err(FieldOpsError::TimedOut {
                team_id: team.id.clone(),
                elapsed_ms,
            });
        }
        debug!(
            "team {}: GA best {:.2} after {} generations ({} ms)",
            team.id, result.best_fitness, result.generations, elapsed_ms
        );

        Ok(self.assemble(team, &prepared, &stops, &result.best.order, skipped))
    }

    fn prepare<'j>(&self, team: &TeamMember, jobs: Vec<&'j Job>) -> Prepared<'j> {
        let home = team.home();
        let mut locations = Vec::with_capacity(jobs.len() + 1);
        if home.is_some() {
            locations.push(Location::home_of(team));
        }
        locations.extend(jobs.iter().map(|j| Location::from_job(j)));

        let matrix = match &self.cache {
            Some(cache) => DistanceMatrix::build_cached(&locations, cache),
            None => DistanceMatrix::build(&locations),
        };
        Prepared {
            jobs,
            matrix,
            start: home.map(|_| 0),
        }
    }

    /// Route clock on the first job's scheduled date.
    fn clock_for(&self, jobs: &[&Job]) -> RouteClock {
        let date = jobs
            .first()
            .map(|j| j.scheduled_date)
            .unwrap_or_default();
        RouteClock::on(date, &self.working_hours, self.buffer_minutes)
    }

    fn trivial_route(&self, team: &TeamMember, jobs: &[&Job], skipped: Vec<String>) -> TravelOptimization {
        let mut route = TravelOptimization::empty(team.id.clone());
        route.skipped_job_ids = skipped;
        if let Some(job) = jobs.first() {
            let clock = self.clock_for(jobs);
            let stop = Stop {
                row: 0,
                duration_minutes: job.duration_minutes,
                window: job.arrival_window,
            };
            // A single stop is visited without a travel leg.
            let matrix = DistanceMatrix::default();
            let timeline = simulate(&matrix, None, [&stop], &clock);
            route.route = to_points(jobs, &[0], &timeline);
        }
        route
    }

    fn assemble(
        &self,
        team: &TeamMember,
        prepared: &Prepared<'_>,
        stops: &[Stop],
        visit: &[usize],
        skipped: Vec<String>,
    ) -> TravelOptimization {
        let clock = self.clock_for(&prepared.jobs);
        let optimized = simulate(
            &prepared.matrix,
            prepared.start,
            visit.iter().map(|&k| &stops[k]),
            &clock,
        );
        let naive = simulate(&prepared.matrix, prepared.start, stops, &clock);

        let route = to_points(&prepared.jobs, visit, &optimized);
        let total_distance: f64 = route.iter().map(|p| p.distance_from_previous).sum();
        let total_time: u32 = route.iter().map(|p| p.time_from_previous).sum();

        let distance_saved = naive.total_distance - total_distance;
        let savings = RouteSavings {
            distance_saved: round2(distance_saved),
            time_saved: i64::from(naive.total_minutes) - i64::from(total_time),
            percentage_improvement: if naive.total_distance > 0.0 {
                round2(distance_saved / naive.total_distance * 100.0)
            } else {
                0.0
            },
        };

        debug!(
            "team {}: {} stops, {:.2} mi (naive {:.2} mi)",
            team.id,
            route.len(),
            total_distance,
            naive.total_distance
        );

        TravelOptimization {
            team_id: team.id.clone(),
            route,
            total_distance,
            total_time,
            savings,
            skipped_job_ids: skipped,
        }
    }
}

/// Splits jobs into those with a usable coordinate and the ids of the rest.
fn split_located<'j>(jobs: &'j [Job], team_id: &str) -> (Vec<&'j Job>, Vec<String>) {
    let mut located = Vec::with_capacity(jobs.len());
    let mut skipped = Vec::new();
    for job in jobs {
        if job.has_coordinate() {
            located.push(job);
        } else {
            skipped.push(job.id.clone());
        }
    }
    if !skipped.is_empty() {
        warn!(
            "team {team_id}: {} job(s) without coordinates excluded from routing",
            skipped.len()
        );
    }
    (located, skipped)
}

fn to_points(jobs: &[&Job], visit: &[usize], timeline: &Timeline) -> Vec<RoutePoint> {
    visit
        .iter()
        .zip(&timeline.legs)
        .map(|(&k, leg)| RoutePoint {
            job_id: jobs[k].id.clone(),
            address: jobs[k].address.clone(),
            estimated_arrival: leg.arrival,
            estimated_departure: leg.departure,
            distance_from_previous: leg.distance,
            time_from_previous: leg.minutes,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    fn job(id: &str, lat: f64, lon: f64) -> Job {
        Job::new(id, format!("{id} Rd"), day()).with_coordinate(lat, lon)
    }

    fn team() -> TeamMember {
        TeamMember::new("T1", "north").with_home("Depot", 38.0, -98.5)
    }

    fn scattered() -> Vec<Job> {
        vec![
            job("J1", 38.4, -98.1),
            job("J2", 38.05, -98.9),
            job("J3", 38.3, -98.45),
            job("J4", 38.15, -98.2),
            job("J5", 38.25, -98.7),
            job("J6", 38.35, -98.3),
        ]
    }

    #[test]
    fn test_trivial_routes() {
        let opt = RouteOptimizer::new();
        let empty = opt.optimize_route(&[], &team());
        assert_eq!(empty.total_distance, 0.0);
        assert_eq!(empty.savings, RouteSavings::default());

        let one = opt.optimize_route(&[job("J1", 38.3, -98.5)], &team());
        assert_eq!(one.stop_count(), 1);
        assert_eq!(one.total_distance, 0.0);
        assert_eq!(one.savings, RouteSavings::default());
        assert_eq!(one.route[0].estimated_arrival, day().and_hms_opt(8, 0, 0).unwrap());
    }

    #[test]
    fn test_route_totals_equal_leg_sums() {
        let route = RouteOptimizer::new().optimize_route(&scattered(), &team());
        let sum: f64 = route.route.iter().map(|p| p.distance_from_previous).sum();
        let time: u32 = route.route.iter().map(|p| p.time_from_previous).sum();
        assert_eq!(route.stop_count(), 6);
        assert!((route.total_distance - sum).abs() < 1e-10);
        assert_eq!(route.total_time, time);
    }

    #[test]
    fn test_savings_against_zig_zag_input() {
        let jobs = vec![
            job("A", 38.5, -98.5),
            job("B", 38.1, -98.5),
            job("C", 38.4, -98.5),
            job("D", 38.2, -98.5),
            job("E", 38.3, -98.5),
        ];
        let route = RouteOptimizer::new().optimize_route(&jobs, &team());
        assert_eq!(route.job_order(), vec!["B", "D", "E", "C", "A"]);
        assert!(route.savings.distance_saved > 0.0);
        // Naive path covers 1.5 degrees of latitude, optimized 0.5.
        assert!((route.savings.percentage_improvement - 66.67).abs() < 0.5);
        assert!(route.savings.time_saved > 0);
    }

    #[test]
    fn test_route_timing_sequence() {
        let route = RouteOptimizer::new().optimize_route(&scattered(), &team());
        for w in route.route.windows(2) {
            let gap = w[1].estimated_arrival - w[0].estimated_departure;
            assert!(gap.num_minutes() >= 15);
        }
        for p in &route.route {
            assert_eq!((p.estimated_departure - p.estimated_arrival).num_minutes(), 60);
        }
    }

    #[test]
    fn test_missing_coordinates_are_reported() {
        let mut jobs = scattered();
        jobs.push(Job::new("J7", "unknown", day()));
        let route = RouteOptimizer::new().optimize_route(&jobs, &team());
        assert_eq!(route.stop_count(), 6);
        assert_eq!(route.skipped_job_ids, vec!["J7".to_string()]);
    }

    #[test]
    fn test_route_without_home_starts_at_first_job() {
        let team = TeamMember::new("T2", "north");
        let jobs = vec![job("A", 38.0, -98.5), job("B", 38.2, -98.5), job("C", 38.1, -98.5)];
        let route = RouteOptimizer::new().optimize_route(&jobs, &team);
        assert_eq!(route.route[0].distance_from_previous, 0.0);
        assert_eq!(route.job_order(), vec!["A", "C", "B"]);
    }

    #[test]
    fn test_multi_stop_filters_by_distance_and_count() {
        let mut jobs = scattered();
        jobs.push(job("FAR", 40.0, -98.5)); // ~138 mi
        let constraints = MultiStopConstraints::new().with_max_distance(60.0).with_max_jobs(4);
        let mut rng = SmallRng::seed_from_u64(42);

        let route = RouteOptimizer::new()
            .optimize_multi_stop_route(&jobs, &team(), &constraints, &mut rng)
            .unwrap();
        assert_eq!(route.stop_count(), 4);
        assert!(route.skipped_job_ids.contains(&"FAR".to_string()));
        assert_eq!(route.skipped_job_ids.len(), 3);
    }

    #[test]
    fn test_multi_stop_respects_arrival_windows() {
        let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        let jobs = vec![
            job("NEAR", 38.1, -98.5),
            job("MID", 38.2, -98.5),
            job("FAR", 38.3, -98.5).with_arrival_window(t(8), t(9)),
        ];
        let mut rng = SmallRng::seed_from_u64(42);
        let route = RouteOptimizer::new()
            .optimize_multi_stop_route(&jobs, &team(), &MultiStopConstraints::new(), &mut rng)
            .unwrap();
        assert_eq!(route.route[0].job_id, "FAR");
        assert!(route.route[0].estimated_arrival.time() <= t(9));
    }

    #[test]
    fn test_multi_stop_is_reproducible() {
        let c = MultiStopConstraints::new();
        let opt = RouteOptimizer::new();
        let a = opt
            .optimize_multi_stop_route(&scattered(), &team(), &c, &mut SmallRng::seed_from_u64(5))
            .unwrap();
        let b = opt
            .optimize_multi_stop_route(&scattered(), &team(), &c, &mut SmallRng::seed_from_u64(5))
            .unwrap();
        assert_eq!(a.job_order(), b.job_order());
        assert_eq!(a.total_distance, b.total_distance);
    }

    #[test]
    fn test_multi_stop_time_limit() {
        let opt = RouteOptimizer::new().with_ga_config(RouteGaConfig::default().with_time_limit_ms(0));
        let mut rng = SmallRng::seed_from_u64(42);
        let err = opt
            .optimize_multi_stop_route(&scattered(), &team(), &MultiStopConstraints::new(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, FieldOpsError::TimedOut { ref team_id, .. } if team_id == "T1"));
    }

    #[test]
    fn test_cached_optimizer_matches() {
        let cache = Arc::new(DistanceCache::new(128));
        let plain = RouteOptimizer::new().optimize_route(&scattered(), &team());
        let cached = RouteOptimizer::new()
            .with_cache(Arc::clone(&cache))
            .optimize_route(&scattered(), &team());
        assert_eq!(plain.job_order(), cached.job_order());
        assert!(cache.stats().misses > 0);
    }
}
