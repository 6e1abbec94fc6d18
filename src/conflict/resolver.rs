//! Rule-based conflict resolution.
//!
//! # Algorithm
//!
//! Each round re-detects conflicts and walks the auto-resolvable ones from
//! most to least severe. For every conflict the resolver builds candidate
//! changes (reschedule or reassign, depending on the type), applies each to a
//! scratch copy of the assignment set and keeps the first one that passes the
//! acceptance test:
//!
//! 1. the target conflict is gone,
//! 2. no conflict type strictly more severe than the target gained members,
//! 3. the count at the target's severity strictly shrank.
//!
//! Accepted changes are strict lexicographic improvements of the
//! (critical, high, medium, low) count vector, so the loop terminates even
//! without the round cap. Rounds stop early once nothing changes.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::detector::{ConflictDetector, Roster};
use super::{ConflictType, SchedulingConflict, Severity};
use crate::allocation::{TeamAllocator, TeamScorer};
use crate::models::{
    AssignmentStatus, HistoryAction, Job, OptimizedAssignment, SchedulingConstraints, TeamMember,
    TimeSpan,
};

/// Resolver parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Upper bound on detect → resolve rounds (default: 5).
    pub max_rounds: usize,
    /// Days after the current date searched when rescheduling (default: 7).
    pub horizon_days: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            horizon_days: 7,
        }
    }
}

impl ResolverConfig {
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds.max(1);
        self
    }

    pub fn with_horizon_days(mut self, days: u32) -> Self {
        self.horizon_days = days;
        self
    }
}

/// One change made while resolving a conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionAction {
    pub conflict_id: String,
    pub conflict_type: ConflictType,
    pub assignment_id: String,
    pub action: HistoryAction,
    /// Same text as the history entry appended to the assignment.
    pub detail: String,
}

/// Summary counts of a resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionMetrics {
    pub original_count: usize,
    pub resolved_count: usize,
    pub remaining_count: usize,
    /// `(original − remaining) / original × 100`, clamped to [0, 100];
    /// 100 when there was nothing to resolve.
    pub resolution_rate: f64,
}

impl ResolutionMetrics {
    fn new(original_count: usize, resolved_count: usize, remaining_count: usize) -> Self {
        let resolution_rate = if original_count == 0 {
            100.0
        } else {
            let fixed = original_count as f64 - remaining_count as f64;
            (fixed / original_count as f64 * 100.0).clamp(0.0, 100.0)
        };
        Self {
            original_count,
            resolved_count,
            remaining_count,
            resolution_rate,
        }
    }
}

/// Outcome of [`ConflictResolver::resolve`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolutionReport {
    /// Conflicts found before any change.
    pub original_conflicts: Vec<SchedulingConflict>,
    /// Conflicts left for human review.
    pub remaining_conflicts: Vec<SchedulingConflict>,
    /// Original conflict ids that no longer occur, sorted and unique.
    pub resolved_conflict_ids: Vec<String>,
    /// Changes in the order they were applied.
    pub actions: Vec<ResolutionAction>,
    pub metrics: ResolutionMetrics,
    /// Rounds executed.
    pub rounds: usize,
}

impl ResolutionReport {
    /// Remaining conflicts of `severity`.
    pub fn remaining_with(&self, severity: Severity) -> usize {
        self.remaining_conflicts
            .iter()
            .filter(|c| c.severity == severity)
            .count()
    }
}

/// A replacement for one assignment slot.
#[derive(Debug, Clone)]
struct Edit {
    index: usize,
    assignment: OptimizedAssignment,
    action: HistoryAction,
}

/// Detect → resolve → re-detect loop over an exclusively borrowed
/// assignment set.
///
/// # Usage
/// ```
/// use chrono::NaiveDate;
/// use u_fieldops::conflict::ConflictResolver;
/// use u_fieldops::models::{Job, OptimizedAssignment, SchedulingConstraints, TeamMember};
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
/// let nine = day.and_hms_opt(9, 0, 0).unwrap();
/// let jobs = vec![
///     Job::new("J1", "a", day).with_coordinate(38.1, -98.5),
///     Job::new("J2", "b", day).with_coordinate(38.1, -98.5),
/// ];
/// let teams = vec![TeamMember::new("T1", "north").with_home("Depot", 38.0, -98.5)];
/// let mut assignments = vec![
///     OptimizedAssignment::new("J1", "T1", nine, 60),
///     OptimizedAssignment::new("J2", "T1", nine, 60),
/// ];
///
/// let resolver = ConflictResolver::new(SchedulingConstraints::default());
/// let report = resolver.resolve(&mut assignments, &jobs, &teams);
/// assert_eq!(report.metrics.original_count, 1);
/// assert!(report.remaining_conflicts.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ConflictResolver {
    detector: ConflictDetector,
    allocator: TeamAllocator,
    config: ResolverConfig,
}

impl Default for ConflictResolver {
    fn default() -> Self {
        Self::new(SchedulingConstraints::default())
    }
}

impl ConflictResolver {
    /// Reassignment uses the standard scorer with specialization coverage
    /// as a hard requirement.
    pub fn new(constraints: SchedulingConstraints) -> Self {
        Self {
            detector: ConflictDetector::new(constraints.clone()),
            allocator: TeamAllocator::new(constraints).with_strict_specializations(true),
            config: ResolverConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_scorer(mut self, scorer: TeamScorer) -> Self {
        self.allocator = self.allocator.with_scorer(scorer);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn detector(&self) -> &ConflictDetector {
        &self.detector
    }

    fn constraints(&self) -> &SchedulingConstraints {
        self.detector.constraints()
    }

    /// Resolves what it can in place and reports what is left.
    ///
    /// Non-auto-resolvable conflicts (deadlines) are never touched and always
    /// end up in `remaining_conflicts`. A second pass over a set with no
    /// auto-resolvable conflicts left changes nothing.
    pub fn resolve(
        &self,
        assignments: &mut Vec<OptimizedAssignment>,
        jobs: &[Job],
        teams: &[TeamMember],
    ) -> ResolutionReport {
        let roster = Roster::new(jobs, teams);
        let original = self.detector.detect_with(assignments, &roster);
        let mut current = original.clone();
        let mut actions = Vec::new();
        let mut rounds = 0;

        while rounds < self.config.max_rounds && current.iter().any(|c| c.auto_resolvable) {
            rounds += 1;
            let mut progress = false;

            for target in current.iter().filter(|c| c.auto_resolvable) {
                let before = self.detector.detect_with(assignments, &roster);
                if !before.iter().any(|c| c.id == target.id) {
                    continue;
                }
                for edits in self.candidates(target, assignments, &roster, teams) {
                    let mut scratch = assignments.clone();
                    apply(&mut scratch, &edits);
                    let after = self.detector.detect_with(&scratch, &roster);
                    if !accepts(target, &before, &after) {
                        continue;
                    }
                    debug!("{}: accepted {} edit(s)", target.id, edits.len());
                    actions.extend(edits.iter().map(|e| action_for(target, e)));
                    *assignments = scratch;
                    progress = true;
                    break;
                }
            }

            current = self.detector.detect_with(assignments, &roster);
            if !progress {
                break;
            }
        }

        let remaining_ids: BTreeSet<&str> = current.iter().map(|c| c.id.as_str()).collect();
        let resolved: BTreeSet<String> = original
            .iter()
            .filter(|c| !remaining_ids.contains(c.id.as_str()))
            .map(|c| c.id.clone())
            .collect();

        let metrics = ResolutionMetrics::new(original.len(), resolved.len(), current.len());
        info!(
            "conflict resolution: {} -> {} conflict(s) in {} round(s), rate {:.1}%",
            metrics.original_count, metrics.remaining_count, rounds, metrics.resolution_rate
        );

        ResolutionReport {
            original_conflicts: original,
            remaining_conflicts: current,
            resolved_conflict_ids: resolved.into_iter().collect(),
            actions,
            metrics,
            rounds,
        }
    }

    // ======================== Strategies ========================

    /// Candidate change sets for `target`, best first.
    fn candidates(
        &self,
        target: &SchedulingConflict,
        assignments: &[OptimizedAssignment],
        roster: &Roster<'_>,
        teams: &[TeamMember],
    ) -> Vec<Vec<Edit>> {
        let reason = format!("resolves {}", target.id);
        let indices: Vec<usize> = target
            .assignment_ids
            .iter()
            .filter_map(|id| index_of(assignments, id))
            .collect();
        let horizon = self.config.horizon_days;
        let mut single: Vec<Option<Edit>> = Vec::new();

        match target.conflict_type {
            ConflictType::TimeOverlap => {
                let (Some(&first), Some(&later)) = (indices.first(), indices.last()) else {
                    return Vec::new();
                };
                let from = assignments[first].scheduled_start;
                single.push(self.reschedule(assignments, later, roster, from, 0, &reason));
                single.push(self.reassign(assignments, later, roster, teams, &reason));
                single.push(self.reschedule(assignments, later, roster, from, horizon, &reason));
            }
            ConflictType::CapacityExceeded => {
                return self
                    .shed_overflow(assignments, &indices, roster, teams, &reason)
                    .into_iter()
                    .collect();
            }
            ConflictType::UnavailableTeam => {
                let open = self.constraints().working_hours.start;
                for &i in &indices {
                    let day_open = assignments[i].scheduled_start.date().and_time(open);
                    single.push(self.reschedule(assignments, i, roster, day_open, horizon, &reason));
                    single.push(self.reassign(assignments, i, roster, teams, &reason));
                }
            }
            ConflictType::TravelDistance
            | ConflictType::GeographicMismatch
            | ConflictType::MissingSpecialization => {
                for &i in &indices {
                    single.push(self.reassign(assignments, i, roster, teams, &reason));
                }
            }
            ConflictType::DeadlineConflict => {}
        }
        single.into_iter().flatten().map(|e| vec![e]).collect()
    }

    /// Moves the latest `count − limit` assignments of an overloaded day,
    /// each to another team or else to a later day. All or nothing.
    fn shed_overflow(
        &self,
        assignments: &[OptimizedAssignment],
        indices: &[usize],
        roster: &Roster<'_>,
        teams: &[TeamMember],
        reason: &str,
    ) -> Option<Vec<Edit>> {
        let &first = indices.first()?;
        let lead = roster.team(&assignments[first].lead_id)?;
        let date = assignments[first].scheduled_start.date();
        let limit = self.constraints().daily_limit(lead) as usize;

        let mut latest_first = indices.to_vec();
        latest_first.sort_by(|&x, &y| {
            let (x, y) = (&assignments[x], &assignments[y]);
            y.scheduled_start
                .cmp(&x.scheduled_start)
                .then_with(|| y.id.cmp(&x.id))
        });
        let overflow = latest_first.len().saturating_sub(limit);

        let mut scratch = assignments.to_vec();
        let mut edits = Vec::with_capacity(overflow);
        for &i in latest_first.iter().take(overflow) {
            let edit = self
                .reassign(&scratch, i, roster, teams, reason)
                .or_else(|| self.move_to_later_day(&scratch, i, roster, lead, date, reason))?;
            scratch[i] = edit.assignment.clone();
            edits.push(edit);
        }
        (!edits.is_empty()).then_some(edits)
    }

    /// First slot on a later day (within the horizon) where `lead` is still
    /// under its daily limit.
    fn move_to_later_day(
        &self,
        assignments: &[OptimizedAssignment],
        index: usize,
        roster: &Roster<'_>,
        lead: &TeamMember,
        date: NaiveDate,
        reason: &str,
    ) -> Option<Edit> {
        let limit = self.constraints().daily_limit(lead);
        let open = self.constraints().working_hours.start;
        (1..=self.config.horizon_days).find_map(|offset| {
            let day = date + Duration::days(i64::from(offset));
            if day_load(assignments, index, &lead.id, day) >= limit {
                return None;
            }
            self.reschedule(assignments, index, roster, day.and_time(open), 0, reason)
        })
    }

    /// Reschedules assignment `index` to the earliest start at or after
    /// `from`, searching `horizon_days` extra days.
    ///
    /// The slot must fit inside working hours and every member's calendar,
    /// must not overlap the members' other work (buffers included) and must
    /// not fall after the job's deadline.
    fn reschedule(
        &self,
        assignments: &[OptimizedAssignment],
        index: usize,
        roster: &Roster<'_>,
        from: NaiveDateTime,
        horizon_days: u32,
        reason: &str,
    ) -> Option<Edit> {
        let a = &assignments[index];
        let lead = roster.team(&a.lead_id)?;
        let busy = busy_spans(assignments, index, a);
        let start = lead.availability.next_free_start(
            from,
            a.duration_minutes + a.buffer_minutes,
            &self.constraints().working_hours,
            horizon_days,
            &busy,
        )?;
        if start == a.scheduled_start {
            return None;
        }
        self.reschedule_to(assignments, index, roster, start, reason)
    }

    fn reschedule_to(
        &self,
        assignments: &[OptimizedAssignment],
        index: usize,
        roster: &Roster<'_>,
        start: NaiveDateTime,
        reason: &str,
    ) -> Option<Edit> {
        let a = &assignments[index];
        let span = TimeSpan::from_start(start, a.duration_minutes);
        let all_available = a
            .member_ids()
            .filter_map(|m| roster.team(m))
            .all(|t| t.availability.is_available_for(&span));
        if !all_available || self.past_deadline(a, roster, start.date()) {
            return None;
        }

        let mut moved = a.clone();
        moved.reschedule(start, reason);
        Some(Edit {
            index,
            assignment: moved,
            action: HistoryAction::Rescheduled,
        })
    }

    /// Hands assignment `index` to the best-scored team that is in range,
    /// specialized, under its daily limit, available and free for the span.
    fn reassign(
        &self,
        assignments: &[OptimizedAssignment],
        index: usize,
        roster: &Roster<'_>,
        teams: &[TeamMember],
        reason: &str,
    ) -> Option<Edit> {
        let a = &assignments[index];
        let job = roster.job(&a.job_id)?;
        let date = a.scheduled_start.date();
        let span = a.span();
        let occupied = a.occupied_span();

        let choice = self.allocator.best_team(
            job,
            teams,
            |t| day_load(assignments, index, &t.id, date),
            |t| {
                !a.involves(&t.id)
                    && t.availability.is_available_for(&span)
                    && !assignments.iter().enumerate().any(|(i, o)| {
                        i != index
                            && o.status != AssignmentStatus::Cancelled
                            && o.involves(&t.id)
                            && o.occupied_span().overlaps(&occupied)
                    })
            },
        )?;

        let team = &teams[choice.team_index];
        let mut moved = a.clone();
        moved.reassign(
            &team.id,
            choice.distance_miles,
            self.allocator.travel_minutes(job, choice.distance_miles),
            choice.scores,
            reason,
        );
        Some(Edit {
            index,
            assignment: moved,
            action: HistoryAction::Reassigned,
        })
    }

    fn past_deadline(&self, a: &OptimizedAssignment, roster: &Roster<'_>, date: NaiveDate) -> bool {
        roster
            .job(&a.job_id)
            .and_then(|job| self.constraints().deadline_for(job))
            .is_some_and(|deadline| date > deadline)
    }
}

fn index_of(assignments: &[OptimizedAssignment], id: &str) -> Option<usize> {
    assignments.iter().position(|a| a.id == id)
}

/// Occupied spans of the other active assignments sharing a member with `a`.
fn busy_spans(assignments: &[OptimizedAssignment], index: usize, a: &OptimizedAssignment) -> Vec<TimeSpan> {
    assignments
        .iter()
        .enumerate()
        .filter(|(i, o)| {
            *i != index
                && o.status != AssignmentStatus::Cancelled
                && a.member_ids().any(|m| o.involves(m))
        })
        .map(|(_, o)| o.occupied_span())
        .collect()
}

/// Active assignments led by `team_id` on `date`, excluding `index`.
fn day_load(assignments: &[OptimizedAssignment], index: usize, team_id: &str, date: NaiveDate) -> u32 {
    assignments
        .iter()
        .enumerate()
        .filter(|(i, o)| {
            *i != index
                && o.status != AssignmentStatus::Cancelled
                && o.lead_id == team_id
                && o.scheduled_start.date() == date
        })
        .count() as u32
}

fn apply(assignments: &mut [OptimizedAssignment], edits: &[Edit]) {
    for edit in edits {
        assignments[edit.index] = edit.assignment.clone();
    }
}

fn action_for(target: &SchedulingConflict, edit: &Edit) -> ResolutionAction {
    ResolutionAction {
        conflict_id: target.id.clone(),
        conflict_type: target.conflict_type,
        assignment_id: edit.assignment.id.clone(),
        action: edit.action,
        detail: edit
            .assignment
            .history
            .last()
            .map(|h| h.detail.clone())
            .unwrap_or_default(),
    }
}

/// Conflict counts per severity, most severe first.
fn severity_counts(conflicts: &[SchedulingConflict]) -> [usize; 4] {
    let mut counts = [0; 4];
    for c in conflicts {
        counts[3 - c.severity as usize] += 1;
    }
    counts
}

fn accepts(
    target: &SchedulingConflict,
    before: &[SchedulingConflict],
    after: &[SchedulingConflict],
) -> bool {
    if after.iter().any(|c| c.id == target.id) {
        return false;
    }
    let b = severity_counts(before);
    let a = severity_counts(after);
    let level = 3 - target.severity as usize;
    (0..level).all(|i| a[i] <= b[i]) && a[level] < b[level]
}
