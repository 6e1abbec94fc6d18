//! One planning round.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use log::info;

use super::PlanKpi;
use crate::allocation::{AllocationResult, TeamAllocator, TeamScorer};
use crate::cluster::{cluster_jobs, ClusteringResult};
use crate::config::FieldOpsConfig;
use crate::conflict::{ConflictResolver, ResolutionReport};
use crate::error::{FieldOpsError, Result};
use crate::matrix::DistanceCache;
use crate::models::{
    AssignmentStatus, Job, OptimizedAssignment, SchedulingConstraints, TeamMember,
};
use crate::routing::{optimize_teams, RouteOptimizer, TeamRouteOutcome, TeamRouteRequest};
use crate::validation::validate_input;

/// Input container for one round.
#[derive(Debug, Clone, Default)]
pub struct PlanRequest {
    /// Jobs to place this round.
    pub jobs: Vec<Job>,
    /// Team roster.
    pub teams: Vec<TeamMember>,
    pub constraints: SchedulingConstraints,
    /// Assignments already committed (count toward load, take part in
    /// conflict resolution).
    pub existing: Vec<OptimizedAssignment>,
}

impl PlanRequest {
    pub fn new(jobs: Vec<Job>, teams: Vec<TeamMember>) -> Self {
        Self {
            jobs,
            teams,
            ..Default::default()
        }
    }

    pub fn with_constraints(mut self, constraints: SchedulingConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Sets previously committed assignments.
    pub fn with_existing(mut self, existing: Vec<OptimizedAssignment>) -> Self {
        self.existing = existing;
        self
    }
}

/// Everything a round produced.
#[derive(Debug)]
pub struct RoundReport {
    pub clusters: ClusteringResult,
    /// Allocator output, before conflict resolution.
    pub allocation: AllocationResult,
    /// Existing plus new assignments after conflict resolution.
    pub assignments: Vec<OptimizedAssignment>,
    pub resolution: ResolutionReport,
    /// One route per (team, date), teams in roster order, dates ascending.
    pub routes: Vec<TeamRouteOutcome>,
    pub kpi: PlanKpi,
}

/// Runs planning rounds with a fixed configuration.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use u_fieldops::config::FieldOpsConfig;
/// use u_fieldops::ga::RouteGaConfig;
/// use u_fieldops::models::{Job, TeamMember};
/// use u_fieldops::planner::{PlanRequest, RoundPlanner};
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
/// let jobs = vec![
///     Job::new("J1", "a", day).with_coordinate(38.1, -98.5),
///     Job::new("J2", "b", day).with_coordinate(38.2, -98.5),
/// ];
/// let teams = vec![TeamMember::new("T1", "north").with_home("Depot", 38.0, -98.5)];
///
/// let config = FieldOpsConfig::default()
///     .with_optimizer(RouteGaConfig::default().with_population_size(10).with_max_generations(10));
/// let report = RoundPlanner::new(config).plan(&PlanRequest::new(jobs, teams)).unwrap();
///
/// assert_eq!(report.kpi.assigned_jobs, 2);
/// assert_eq!(report.routes.len(), 1);
/// assert_eq!(report.routes[0].route.stop_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct RoundPlanner {
    config: FieldOpsConfig,
    scorer: TeamScorer,
    cache: Option<Arc<DistanceCache>>,
}

impl Default for RoundPlanner {
    fn default() -> Self {
        Self::new(FieldOpsConfig::default())
    }
}

impl RoundPlanner {
    /// Creates a planner; a distance cache is attached unless
    /// `config.cache_capacity` is 0.
    pub fn new(config: FieldOpsConfig) -> Self {
        let cache = (config.cache_capacity > 0).then(|| Arc::new(DistanceCache::new(config.cache_capacity)));
        Self {
            config,
            scorer: TeamScorer::standard(),
            cache,
        }
    }

    /// Sets the scorer used by allocation and reassignment.
    pub fn with_scorer(mut self, scorer: TeamScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Shares a distance cache with other planners.
    pub fn with_cache(mut self, cache: Arc<DistanceCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &FieldOpsConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&Arc<DistanceCache>> {
        self.cache.as_ref()
    }

    /// Plans one round.
    ///
    /// # Errors
    /// [`FieldOpsError::Validation`] if the jobs or teams are structurally
    /// invalid. Everything else degrades into the report.
    pub fn plan(&self, request: &PlanRequest) -> Result<RoundReport> {
        validate_input(&request.jobs, &request.teams).map_err(FieldOpsError::Validation)?;

        let clusters = cluster_jobs(&request.jobs, &self.config.cluster);

        let allocation = TeamAllocator::new(request.constraints.clone())
            .with_scorer(self.scorer.clone())
            .assign_with_existing(&request.jobs, &request.teams, &request.existing);

        let mut assignments = request.existing.clone();
        assignments.extend(allocation.assignments.iter().cloned());
        let resolution = ConflictResolver::new(request.constraints.clone())
            .with_config(self.config.resolver.clone())
            .with_scorer(self.scorer.clone())
            .resolve(&mut assignments, &request.jobs, &request.teams);

        let routes = self.route(&assignments, &request.jobs, &request.teams, &request.constraints);

        let kpi = PlanKpi::calculate(&request.jobs, &allocation, &assignments, &routes, &resolution);
        info!(
            "round planned: {}/{} jobs assigned, {} route(s), {} conflict(s) remaining",
            kpi.assigned_jobs,
            kpi.total_jobs,
            routes.len(),
            resolution.remaining_conflicts.len()
        );

        Ok(RoundReport {
            clusters,
            allocation,
            assignments,
            resolution,
            routes,
            kpi,
        })
    }

    /// Builds one route request per (lead, date) and fans them out.
    ///
    /// Jobs are pinned to their assignment's date and start time so the
    /// route timeline follows the resolved schedule.
    fn route(
        &self,
        assignments: &[OptimizedAssignment],
        jobs: &[Job],
        teams: &[TeamMember],
        constraints: &SchedulingConstraints,
    ) -> Vec<TeamRouteOutcome> {
        let mut groups: BTreeMap<(usize, NaiveDate), Vec<&OptimizedAssignment>> = BTreeMap::new();
        for a in assignments.iter().filter(|a| a.status != AssignmentStatus::Cancelled) {
            if let Some(t) = teams.iter().position(|t| t.id == a.lead_id) {
                groups.entry((t, a.scheduled_start.date())).or_default().push(a);
            }
        }

        let requests: Vec<TeamRouteRequest> = groups
            .into_iter()
            .map(|((t, _), mut group)| {
                group.sort_by(|a, b| a.scheduled_start.cmp(&b.scheduled_start).then_with(|| a.id.cmp(&b.id)));
                let pinned = group
                    .iter()
                    .filter_map(|a| {
                        let mut job = jobs.iter().find(|j| j.id == a.job_id)?.clone();
                        job.scheduled_date = a.scheduled_start.date();
                        job.scheduled_time = Some(a.scheduled_start.time());
                        Some(job)
                    })
                    .collect();
                TeamRouteRequest::new(teams[t].clone(), pinned)
            })
            .collect();

        let mut optimizer = RouteOptimizer::new()
            .with_ga_config(self.config.optimizer.clone())
            .with_constraints(constraints);
        if let Some(cache) = &self.cache {
            optimizer = optimizer.with_cache(Arc::clone(cache));
        }
        optimize_teams(&optimizer, &requests, &self.config.routing, self.config.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::{ConflictType, Severity};
    use crate::ga::RouteGaConfig;
    use crate::validation::ValidationErrorKind;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn planner() -> RoundPlanner {
        RoundPlanner::new(
            FieldOpsConfig::default()
                .with_optimizer(RouteGaConfig::default().with_population_size(10).with_max_generations(10)),
        )
    }

    fn team(id: &str, lat: f64) -> TeamMember {
        TeamMember::new(id, "north").with_home("Depot", lat, -98.5)
    }

    #[test]
    fn test_plan_routes_per_team() {
        let jobs = vec![
            Job::new("J1", "a", day(4)).with_coordinate(38.05, -98.5),
            Job::new("J2", "b", day(4)).with_coordinate(38.95, -98.5),
            Job::new("J3", "c", day(4)).with_coordinate(38.10, -98.5),
        ];
        let teams = vec![team("T1", 38.0), team("T2", 39.0)];

        let report = planner().plan(&PlanRequest::new(jobs, teams)).unwrap();

        assert_eq!(report.allocation.assignments.len(), 3);
        assert_eq!(report.routes.len(), 2);
        assert_eq!(report.routes[0].team_id, "T1");
        assert_eq!(report.routes[0].route.stop_count(), 2);
        assert_eq!(report.routes[1].team_id, "T2");
        assert!(report.routes.iter().all(|r| r.is_ok()));
        assert!((report.kpi.assigned_rate - 1.0).abs() < 1e-10);
        assert_eq!(report.clusters.clusters.len(), 2);
    }

    #[test]
    fn test_plan_rejects_invalid_input() {
        let jobs = vec![Job::new("J1", "a", day(4)), Job::new("J1", "b", day(4))];
        let err = planner().plan(&PlanRequest::new(jobs, vec![team("T1", 38.0)])).unwrap_err();
        match err {
            FieldOpsError::Validation(errors) => {
                assert_eq!(errors[0].kind, ValidationErrorKind::DuplicateId);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_plan_reports_degraded_inputs() {
        let jobs = vec![
            Job::new("J1", "a", day(4)).with_coordinate(38.1, -98.5),
            Job::new("J2", "no coordinate", day(4)),
        ];
        let teams = vec![team("T1", 38.0), TeamMember::new("T2", "north")];

        let report = planner().plan(&PlanRequest::new(jobs, teams)).unwrap();

        assert_eq!(report.allocation.unassigned_jobs.len(), 1);
        assert_eq!(report.allocation.invalid_team_ids, vec!["T2".to_string()]);
        assert_eq!(report.kpi.assigned_jobs, 1);
        assert!((report.kpi.assigned_rate - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_plan_surfaces_deadline_conflicts() {
        let jobs = vec![Job::new("J1", "a", day(6))
            .with_coordinate(38.1, -98.5)
            .with_deadline(day(5))];
        let report = planner()
            .plan(&PlanRequest::new(jobs, vec![team("T1", 38.0)]))
            .unwrap();

        assert_eq!(report.resolution.remaining_conflicts.len(), 1);
        assert_eq!(
            report.resolution.remaining_conflicts[0].conflict_type,
            ConflictType::DeadlineConflict
        );
        assert_eq!(report.kpi.remaining(Severity::Critical), 1);
    }

    #[test]
    fn test_plan_resolves_against_existing_work() {
        let nine = day(4).and_hms_opt(9, 0, 0).unwrap();
        let existing = vec![OptimizedAssignment::new("J0", "T1", nine, 60).with_travel(6.9, 10)];
        let jobs = vec![Job::new("J1", "b", day(4))
            .with_coordinate(38.1, -98.5)
            .with_time(nine.time())];
        let request = PlanRequest::new(jobs, vec![team("T1", 38.0)]).with_existing(existing);

        let report = planner().plan(&request).unwrap();

        assert_eq!(report.resolution.metrics.original_count, 1);
        assert!(report.resolution.remaining_conflicts.is_empty());
        let moved = report.assignments.iter().find(|a| a.job_id == "J1").unwrap();
        assert_eq!(moved.status, AssignmentStatus::Rescheduled);
        assert!(moved.scheduled_start >= day(4).and_hms_opt(10, 0, 0).unwrap());
    }

    #[test]
    fn test_plan_without_cache() {
        let planner = RoundPlanner::new(FieldOpsConfig::default().with_cache_capacity(0));
        assert!(planner.cache().is_none());
        assert!(RoundPlanner::default().cache().is_some());
    }
}
