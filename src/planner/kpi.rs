//! Round quality metrics (KPIs).
//!
//! Computes planning-round indicators from the allocation, the resolved
//! assignment set, the per-team routes and the resolution report.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Assigned Rate | Jobs with an active assignment / input jobs |
//! | Avg Utilization | Mean of per-team `assigned / capacity × 100` |
//! | Total Route Distance | Sum of route `total_distance` |
//! | Avg Route Distance | Total distance / routes with at least one stop |
//! | Distance Saved | Sum of route savings against input order |
//! | Remaining Conflicts | Conflicts left after resolution, per severity |
//! | Resolution Rate | From the resolution metrics |

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::allocation::AllocationResult;
use crate::conflict::{ResolutionReport, Severity};
use crate::models::{AssignmentStatus, Job, OptimizedAssignment};
use crate::routing::TeamRouteOutcome;

/// Planning-round performance indicators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanKpi {
    pub total_jobs: usize,
    pub assigned_jobs: usize,
    /// Fraction of jobs assigned (0.0..1.0); 1.0 for an empty round.
    pub assigned_rate: f64,
    /// Average team utilization, percent.
    pub avg_utilization: f64,
    /// Per-team utilization, percent.
    pub utilization_by_team: HashMap<String, f64>,
    pub total_route_distance: f64,
    pub avg_route_distance: f64,
    pub total_distance_saved: f64,
    /// Routes that fell back to an empty route.
    pub failed_routes: usize,
    pub remaining_conflicts: BTreeMap<Severity, usize>,
    pub resolution_rate: f64,
}

impl PlanKpi {
    /// Computes KPIs for one round.
    ///
    /// # Arguments
    /// * `jobs` - The round's input jobs.
    /// * `allocation` - Allocator output (for utilization).
    /// * `assignments` - The assignment set after resolution.
    /// * `routes` - Per-team route outcomes.
    /// * `resolution` - Resolver report.
    pub fn calculate(
        jobs: &[Job],
        allocation: &AllocationResult,
        assignments: &[OptimizedAssignment],
        routes: &[TeamRouteOutcome],
        resolution: &ResolutionReport,
    ) -> Self {
        let input: HashSet<&str> = jobs.iter().map(|j| j.id.as_str()).collect();
        let assigned: HashSet<&str> = assignments
            .iter()
            .filter(|a| a.status != AssignmentStatus::Cancelled)
            .map(|a| a.job_id.as_str())
            .filter(|id| input.contains(id))
            .collect();
        let assigned_rate = if jobs.is_empty() {
            1.0
        } else {
            assigned.len() as f64 / input.len() as f64
        };

        let utilization_by_team: HashMap<String, f64> = allocation
            .utilization
            .iter()
            .map(|u| (u.team_id.clone(), u.utilization))
            .collect();
        let avg_utilization = if utilization_by_team.is_empty() {
            0.0
        } else {
            let sum: f64 = utilization_by_team.values().sum();
            sum / utilization_by_team.len() as f64
        };

        let total_route_distance: f64 = routes.iter().map(|r| r.route.total_distance).sum();
        let routed = routes.iter().filter(|r| r.route.stop_count() > 0).count();
        let avg_route_distance = if routed == 0 {
            0.0
        } else {
            total_route_distance / routed as f64
        };

        let mut remaining_conflicts = BTreeMap::new();
        for c in &resolution.remaining_conflicts {
            *remaining_conflicts.entry(c.severity).or_insert(0) += 1;
        }

        Self {
            total_jobs: input.len(),
            assigned_jobs: assigned.len(),
            assigned_rate,
            avg_utilization,
            utilization_by_team,
            total_route_distance,
            avg_route_distance,
            total_distance_saved: routes.iter().map(|r| r.route.savings.distance_saved).sum(),
            failed_routes: routes.iter().filter(|r| !r.is_ok()).count(),
            remaining_conflicts,
            resolution_rate: resolution.metrics.resolution_rate,
        }
    }

    /// Remaining conflicts of `severity`.
    pub fn remaining(&self, severity: Severity) -> usize {
        self.remaining_conflicts.get(&severity).copied().unwrap_or(0)
    }

    /// Whether the round meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_assigned_rate: f64, max_remaining_high: usize) -> bool {
        let high = self.remaining(Severity::High) + self.remaining(Severity::Critical);
        self.assigned_rate >= min_assigned_rate && high <= max_remaining_high
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::TeamUtilization;
    use crate::conflict::{ConflictType, ResolutionMetrics, SchedulingConflict};
    use crate::models::{RouteSavings, TravelOptimization};
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    fn start() -> chrono::NaiveDateTime {
        day().and_hms_opt(9, 0, 0).unwrap()
    }

    fn route(team: &str, distance: f64, saved: f64, stops: usize) -> TeamRouteOutcome {
        let mut r = TravelOptimization::empty(team);
        r.total_distance = distance;
        r.savings = RouteSavings {
            distance_saved: saved,
            ..RouteSavings::default()
        };
        r.route = (0..stops)
            .map(|i| crate::models::RoutePoint {
                job_id: format!("J{i}"),
                address: String::new(),
                estimated_arrival: start(),
                estimated_departure: start(),
                distance_from_previous: 0.0,
                time_from_previous: 0,
            })
            .collect();
        TeamRouteOutcome {
            team_id: team.to_string(),
            route: r,
            error: None,
            elapsed_ms: 1,
        }
    }

    fn conflict(severity: Severity) -> SchedulingConflict {
        SchedulingConflict {
            id: format!("{severity:?}"),
            conflict_type: ConflictType::TimeOverlap,
            severity,
            description: String::new(),
            job_ids: vec![],
            team_ids: vec![],
            assignment_ids: vec![],
            suggested_resolution: String::new(),
            auto_resolvable: true,
        }
    }

    #[test]
    fn test_kpi_basic() {
        let jobs: Vec<Job> = (0..4).map(|i| Job::new(format!("J{i}"), "x", day())).collect();
        let mut cancelled = OptimizedAssignment::new("J2", "T1", start(), 60);
        cancelled.status = AssignmentStatus::Cancelled;
        let assignments = vec![
            OptimizedAssignment::new("J0", "T1", start(), 60),
            OptimizedAssignment::new("J1", "T2", start(), 60),
            cancelled,
        ];
        let allocation = AllocationResult {
            utilization: vec![
                TeamUtilization {
                    team_id: "T1".into(),
                    assigned: 1,
                    capacity: 4,
                    utilization: 25.0,
                },
                TeamUtilization {
                    team_id: "T2".into(),
                    assigned: 3,
                    capacity: 4,
                    utilization: 75.0,
                },
            ],
            ..AllocationResult::default()
        };
        let routes = vec![route("T1", 10.0, 2.0, 2), route("T2", 0.0, 0.0, 0)];
        let resolution = ResolutionReport {
            remaining_conflicts: vec![conflict(Severity::Low), conflict(Severity::Critical)],
            metrics: ResolutionMetrics {
                resolution_rate: 50.0,
                ..ResolutionMetrics::default()
            },
            ..ResolutionReport::default()
        };

        let kpi = PlanKpi::calculate(&jobs, &allocation, &assignments, &routes, &resolution);
        assert_eq!(kpi.total_jobs, 4);
        assert_eq!(kpi.assigned_jobs, 2);
        assert!((kpi.assigned_rate - 0.5).abs() < 1e-10);
        assert!((kpi.avg_utilization - 50.0).abs() < 1e-10);
        assert!((kpi.total_route_distance - 10.0).abs() < 1e-10);
        assert!((kpi.avg_route_distance - 10.0).abs() < 1e-10);
        assert!((kpi.total_distance_saved - 2.0).abs() < 1e-10);
        assert_eq!(kpi.failed_routes, 0);
        assert_eq!(kpi.remaining(Severity::Critical), 1);
        assert_eq!(kpi.remaining(Severity::High), 0);
        assert!((kpi.resolution_rate - 50.0).abs() < 1e-10);
        assert!(!kpi.meets_thresholds(0.5, 0));
        assert!(kpi.meets_thresholds(0.5, 1));
    }

    #[test]
    fn test_kpi_empty_round() {
        let kpi = PlanKpi::calculate(
            &[],
            &AllocationResult::default(),
            &[],
            &[],
            &ResolutionReport::default(),
        );
        assert_eq!(kpi.assigned_rate, 1.0);
        assert_eq!(kpi.avg_utilization, 0.0);
        assert_eq!(kpi.avg_route_distance, 0.0);
        assert!(kpi.remaining_conflicts.is_empty());
    }
}
