//! Best-fit job-to-team allocator.
//!
//! # Algorithm
//!
//! Jobs are processed in input order (order matters for tie-breaks and is
//! not re-sorted). For each job every eligible team is scored and the lowest
//! score wins; equal scores go to the team listed first.
//!
//! A team is eligible when:
//! - its home base is geocoded,
//! - its round load is below `min(capacity, max_daily_jobs)`,
//! - the home-to-job distance is within `min(travel_radius, max_travel_distance)`,
//! - (strict mode only) it covers every required specialization.
//!
//! Jobs without a coordinate or without an eligible team are reported as
//! unassigned, never force-assigned.

use std::collections::HashMap;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::{Candidate, TeamScorer};
use crate::geo::{estimate_travel_time, haversine_miles, is_urban};
use crate::models::{AssignmentScores, Job, OptimizedAssignment, SchedulingConstraints, TeamMember};

/// Why a job was not assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnassignedReason {
    MissingCoordinate,
    NoEligibleTeam,
}

/// A job left unassigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnassignedJob {
    pub job_id: String,
    pub reason: UnassignedReason,
}

/// Round load of one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamUtilization {
    pub team_id: String,
    pub assigned: u32,
    pub capacity: u32,
    /// `assigned / capacity × 100` (0 for zero capacity).
    pub utilization: f64,
}

/// Output of [`TeamAllocator::assign`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationResult {
    pub assignments: Vec<OptimizedAssignment>,
    pub unassigned_jobs: Vec<UnassignedJob>,
    /// One entry per team, in input order.
    pub utilization: Vec<TeamUtilization>,
    /// Teams without a geocoded home base (never eligible).
    pub invalid_team_ids: Vec<String>,
}

impl AllocationResult {
    /// Utilization entry for a team.
    pub fn utilization_of(&self, team_id: &str) -> Option<&TeamUtilization> {
        self.utilization.iter().find(|u| u.team_id == team_id)
    }
}

/// The winning team for a job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamChoice {
    /// Index into the team slice.
    pub team_index: usize,
    pub distance_miles: f64,
    pub scores: AssignmentScores,
}

/// Assigns jobs to teams by lowest score.
#[derive(Debug, Clone)]
pub struct TeamAllocator {
    constraints: SchedulingConstraints,
    scorer: TeamScorer,
    strict_specializations: bool,
}

impl TeamAllocator {
    /// Allocator with the standard scorer.
    pub fn new(constraints: SchedulingConstraints) -> Self {
        Self {
            constraints,
            scorer: TeamScorer::standard(),
            strict_specializations: false,
        }
    }

    pub fn with_scorer(mut self, scorer: TeamScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// When enabled, teams lacking a required specialization are ineligible
    /// (by default they are eligible but miss the specialization bonus).
    pub fn with_strict_specializations(mut self, strict: bool) -> Self {
        self.strict_specializations = strict;
        self
    }

    pub fn constraints(&self) -> &SchedulingConstraints {
        &self.constraints
    }

    /// Assigns `jobs` to `teams`, starting from empty loads.
    pub fn assign(&self, jobs: &[Job], teams: &[TeamMember]) -> AllocationResult {
        self.assign_with_existing(jobs, teams, &[])
    }

    /// Assigns `jobs`, counting `existing` assignments towards team loads.
    pub fn assign_with_existing(
        &self,
        jobs: &[Job],
        teams: &[TeamMember],
        existing: &[OptimizedAssignment],
    ) -> AllocationResult {
        let mut result = AllocationResult::default();

        for team in teams.iter().filter(|t| t.home().is_none()) {
            warn!("team {} has no geocoded home base; excluded from allocation", team.id);
            result.invalid_team_ids.push(team.id.clone());
        }

        let mut loads: HashMap<&str, u32> = HashMap::new();
        for a in existing {
            *loads.entry(a.lead_id.as_str()).or_insert(0) += 1;
        }

        for job in jobs {
            if !job.has_coordinate() {
                result.unassigned_jobs.push(UnassignedJob {
                    job_id: job.id.clone(),
                    reason: UnassignedReason::MissingCoordinate,
                });
                continue;
            }

            let choice = self.best_team(
                job,
                teams,
                |t| loads.get(t.id.as_str()).copied().unwrap_or(0),
                |_| true,
            );
            match choice {
                Some(choice) => {
                    let team = &teams[choice.team_index];
                    *loads.entry(team.id.as_str()).or_insert(0) += 1;
                    result.assignments.push(self.build_assignment(job, team, &choice));
                }
                None => result.unassigned_jobs.push(UnassignedJob {
                    job_id: job.id.clone(),
                    reason: UnassignedReason::NoEligibleTeam,
                }),
            }
        }

        result.utilization = teams
            .iter()
            .map(|t| {
                let assigned = loads.get(t.id.as_str()).copied().unwrap_or(0);
                TeamUtilization {
                    team_id: t.id.clone(),
                    assigned,
                    capacity: t.capacity,
                    utilization: if t.capacity > 0 {
                        f64::from(assigned) / f64::from(t.capacity) * 100.0
                    } else {
                        0.0
                    },
                }
            })
            .collect();

        info!(
            "allocated {} of {} jobs ({} unassigned)",
            result.assignments.len(),
            jobs.len(),
            result.unassigned_jobs.len()
        );
        result
    }

    /// Finds the lowest-scored eligible team for `job`.
    ///
    /// `load_of` supplies each team's current load; `accept` can veto teams
    /// (e.g. ones busy at the job's time). Returns `None` if the job has no
    /// coordinate or no team qualifies.
    pub fn best_team<L, F>(&self, job: &Job, teams: &[TeamMember], load_of: L, accept: F) -> Option<TeamChoice>
    where
        L: Fn(&TeamMember) -> u32,
        F: Fn(&TeamMember) -> bool,
    {
        let location = job.location()?;
        let required = self.constraints.required_for(job);
        let mut best: Option<TeamChoice> = None;

        for (i, team) in teams.iter().enumerate() {
            let Some(home) = team.home() else {
                continue;
            };
            let load = load_of(team);
            if load >= self.constraints.daily_limit(team) {
                continue;
            }
            let distance = haversine_miles(&home, &location);
            if distance > self.constraints.travel_limit(team) {
                continue;
            }
            if self.strict_specializations && !team.covers(&required) {
                continue;
            }
            if !accept(team) {
                continue;
            }

            let scores = self.scorer.score(&Candidate {
                job,
                team,
                required: &required,
                distance_miles: distance,
                current_load: load,
            });
            if best.is_none_or(|b| scores.total < b.scores.total) {
                best = Some(TeamChoice {
                    team_index: i,
                    distance_miles: distance,
                    scores,
                });
            }
        }
        best
    }

    /// Builds the assignment for a chosen team.
    pub fn build_assignment(&self, job: &Job, team: &TeamMember, choice: &TeamChoice) -> OptimizedAssignment {
        let travel = self.travel_minutes(job, choice.distance_miles);
        OptimizedAssignment::new(
            job.id.clone(),
            team.id.clone(),
            job.scheduled_start(self.constraints.working_hours.start),
            job.duration_minutes,
        )
        .with_travel(choice.distance_miles, travel)
        .with_buffer(self.constraints.buffer_minutes)
        .with_scores(choice.scores)
    }

    /// Travel time to a job, using the job's urban classification.
    pub fn travel_minutes(&self, job: &Job, distance_miles: f64) -> u32 {
        estimate_travel_time(distance_miles, is_urban(&job.address, job.location().as_ref()))
    }
}
