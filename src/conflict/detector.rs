//! Seven-rule conflict scan.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use log::debug;

use super::{ConflictType, SchedulingConflict};
use crate::models::{AssignmentStatus, Job, OptimizedAssignment, SchedulingConstraints, TeamMember};

/// Id lookups over the round's jobs and teams.
pub(crate) struct Roster<'a> {
    jobs: HashMap<&'a str, &'a Job>,
    teams: HashMap<&'a str, &'a TeamMember>,
}

impl<'a> Roster<'a> {
    pub(crate) fn new(jobs: &'a [Job], teams: &'a [TeamMember]) -> Self {
        Self {
            jobs: jobs.iter().map(|j| (j.id.as_str(), j)).collect(),
            teams: teams.iter().map(|t| (t.id.as_str(), t)).collect(),
        }
    }

    pub(crate) fn job(&self, id: &str) -> Option<&'a Job> {
        self.jobs.get(id).copied()
    }

    pub(crate) fn team(&self, id: &str) -> Option<&'a TeamMember> {
        self.teams.get(id).copied()
    }
}

/// Scans assignments for conflicts.
///
/// Cancelled assignments are ignored. Assignments referencing unknown jobs
/// or teams are checked only by the rules that do not need them.
#[derive(Debug, Clone, Default)]
pub struct ConflictDetector {
    constraints: SchedulingConstraints,
}

impl ConflictDetector {
    pub fn new(constraints: SchedulingConstraints) -> Self {
        Self { constraints }
    }

    pub fn constraints(&self) -> &SchedulingConstraints {
        &self.constraints
    }

    /// Returns all conflicts, most severe first (ties by type, then id).
    pub fn detect(
        &self,
        assignments: &[OptimizedAssignment],
        jobs: &[Job],
        teams: &[TeamMember],
    ) -> Vec<SchedulingConflict> {
        let roster = Roster::new(jobs, teams);
        self.detect_with(assignments, &roster)
    }

    pub(crate) fn detect_with(
        &self,
        assignments: &[OptimizedAssignment],
        roster: &Roster<'_>,
    ) -> Vec<SchedulingConflict> {
        let active: Vec<&OptimizedAssignment> = assignments
            .iter()
            .filter(|a| a.status != AssignmentStatus::Cancelled)
            .collect();

        let mut conflicts = Vec::new();
        self.time_overlaps(&active, &mut conflicts);
        self.capacity(&active, roster, &mut conflicts);
        for &a in &active {
            self.travel_distance(a, roster, &mut conflicts);
            self.availability(a, roster, &mut conflicts);
            self.specialization(a, roster, &mut conflicts);
            self.deadline(a, roster, &mut conflicts);
        }
        self.geographic_mismatch(&active, &mut conflicts);

        conflicts.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(a.conflict_type.cmp(&b.conflict_type))
                .then_with(|| a.id.cmp(&b.id))
        });
        debug!("detected {} conflict(s) in {} assignments", conflicts.len(), active.len());
        conflicts
    }

    fn time_overlaps(&self, active: &[&OptimizedAssignment], out: &mut Vec<SchedulingConflict>) {
        let mut by_member: BTreeMap<&str, Vec<&OptimizedAssignment>> = BTreeMap::new();
        for &a in active {
            for m in a.member_ids() {
                by_member.entry(m).or_default().push(a);
            }
        }

        for (member, mut list) in by_member {
            list.sort_by(|a, b| a.scheduled_start.cmp(&b.scheduled_start).then_with(|| a.id.cmp(&b.id)));
            for i in 0..list.len() {
                let first = list[i];
                let span = first.span();
                for second in &list[i + 1..] {
                    // Equal starts clash even when a span is empty.
                    let same_start = second.scheduled_start == first.scheduled_start;
                    if second.scheduled_start >= span.end && !same_start {
                        break;
                    }
                    if !same_start && !span.overlaps(&second.span()) {
                        continue;
                    }
                    out.push(conflict(
                        ConflictType::TimeOverlap,
                        format!("time_overlap:{member}:{}:{}", first.id, second.id),
                        format!(
                            "{member} is booked for jobs {} and {} at overlapping times",
                            first.job_id, second.job_id
                        ),
                        vec![first.job_id.clone(), second.job_id.clone()],
                        vec![member.to_string()],
                        vec![first.id.clone(), second.id.clone()],
                        "Reschedule the later job after the earlier one, or reassign it",
                    ));
                }
            }
        }
    }

    fn capacity(&self, active: &[&OptimizedAssignment], roster: &Roster<'_>, out: &mut Vec<SchedulingConflict>) {
        let mut by_day: BTreeMap<(&str, NaiveDate), Vec<&OptimizedAssignment>> = BTreeMap::new();
        for &a in active {
            by_day
                .entry((a.lead_id.as_str(), a.scheduled_start.date()))
                .or_default()
                .push(a);
        }

        for ((lead, date), list) in by_day {
            let Some(team) = roster.team(lead) else {
                continue;
            };
            let limit = self.constraints.daily_limit(team);
            if list.len() <= limit as usize {
                continue;
            }
            out.push(conflict(
                ConflictType::CapacityExceeded,
                format!("capacity_exceeded:{lead}:{date}"),
                format!("{lead} has {} jobs on {date}, limit is {limit}", list.len()),
                list.iter().map(|a| a.job_id.clone()).collect(),
                vec![lead.to_string()],
                list.iter().map(|a| a.id.clone()).collect(),
                "Move the latest jobs to another team or another day",
            ));
        }
    }

    fn travel_distance(&self, a: &OptimizedAssignment, roster: &Roster<'_>, out: &mut Vec<SchedulingConflict>) {
        let Some(team) = roster.team(&a.lead_id) else {
            return;
        };
        let limit = self.constraints.travel_limit(team);
        if a.estimated_distance_miles <= limit {
            return;
        }
        out.push(conflict(
            ConflictType::TravelDistance,
            format!("travel_distance:{}", a.id),
            format!(
                "job {} is {:.1} mi from {}'s base, limit is {:.1} mi",
                a.job_id, a.estimated_distance_miles, a.lead_id, limit
            ),
            vec![a.job_id.clone()],
            vec![a.lead_id.clone()],
            vec![a.id.clone()],
            "Reassign to a team based closer to the job",
        ));
    }

    fn availability(&self, a: &OptimizedAssignment, roster: &Roster<'_>, out: &mut Vec<SchedulingConflict>) {
        let span = a.span();
        for member in a.member_ids() {
            let Some(team) = roster.team(member) else {
                continue;
            };
            if team.availability.is_available_for(&span) {
                continue;
            }
            out.push(conflict(
                ConflictType::UnavailableTeam,
                format!("unavailable_team:{member}:{}", a.id),
                format!(
                    "{member} is not available for job {} at {}",
                    a.job_id, a.scheduled_start
                ),
                vec![a.job_id.clone()],
                vec![member.to_string()],
                vec![a.id.clone()],
                "Reschedule into the member's availability, or reassign",
            ));
        }
    }

    fn specialization(&self, a: &OptimizedAssignment, roster: &Roster<'_>, out: &mut Vec<SchedulingConflict>) {
        let Some(job) = roster.job(&a.job_id) else {
            return;
        };
        let required = self.constraints.required_for(job);
        if required.is_empty() {
            return;
        }
        let mut declared: BTreeSet<&str> = BTreeSet::new();
        for m in a.member_ids() {
            if let Some(team) = roster.team(m) {
                declared.extend(team.specializations.iter().map(String::as_str));
            }
        }
        let missing: Vec<&str> = required
            .iter()
            .map(String::as_str)
            .filter(|tag| !declared.contains(tag))
            .collect();
        if missing.is_empty() {
            return;
        }
        out.push(conflict(
            ConflictType::MissingSpecialization,
            format!("missing_specialization:{}", a.id),
            format!(
                "job {} requires {} which {} lacks",
                a.job_id,
                missing.join(", "),
                a.lead_id
            ),
            vec![a.job_id.clone()],
            a.member_ids().map(str::to_string).collect(),
            vec![a.id.clone()],
            "Reassign to a team with the required specializations",
        ));
    }

    fn deadline(&self, a: &OptimizedAssignment, roster: &Roster<'_>, out: &mut Vec<SchedulingConflict>) {
        let Some(job) = roster.job(&a.job_id) else {
            return;
        };
        let Some(deadline) = self.constraints.deadline_for(job) else {
            return;
        };
        let date = a.scheduled_start.date();
        if date <= deadline {
            return;
        }
        out.push(conflict(
            ConflictType::DeadlineConflict,
            format!("deadline_conflict:{}", a.id),
            format!("job {} is scheduled on {date}, after its deadline {deadline}", a.job_id),
            vec![a.job_id.clone()],
            vec![a.lead_id.clone()],
            vec![a.id.clone()],
            "Review manually: move the job before its deadline or renegotiate",
        ));
    }

    fn geographic_mismatch(&self, active: &[&OptimizedAssignment], out: &mut Vec<SchedulingConflict>) {
        let mut by_lead: BTreeMap<&str, Vec<&OptimizedAssignment>> = BTreeMap::new();
        for &a in active {
            by_lead.entry(a.lead_id.as_str()).or_default().push(a);
        }

        for (lead, list) in by_lead {
            let average =
                list.iter().map(|a| a.estimated_distance_miles).sum::<f64>() / list.len() as f64;
            for a in list {
                if a.estimated_distance_miles <= 2.0 * average {
                    continue;
                }
                out.push(conflict(
                    ConflictType::GeographicMismatch,
                    format!("geographic_mismatch:{}", a.id),
                    format!(
                        "job {} is {:.1} mi away, more than twice {lead}'s average of {:.1} mi",
                        a.job_id, a.estimated_distance_miles, average
                    ),
                    vec![a.job_id.clone()],
                    vec![lead.to_string()],
                    vec![a.id.clone()],
                    "Reassign to a team working nearer the job",
                ));
            }
        }
    }
}

fn conflict(
    conflict_type: ConflictType,
    id: String,
    description: String,
    job_ids: Vec<String>,
    team_ids: Vec<String>,
    assignment_ids: Vec<String>,
    suggestion: &str,
) -> SchedulingConflict {
    SchedulingConflict {
        id,
        conflict_type,
        severity: conflict_type.severity(),
        description,
        job_ids,
        team_ids,
        assignment_ids,
        suggested_resolution: suggestion.to_string(),
        auto_resolvable: conflict_type.is_auto_resolvable(),
    }
}
