//! Optimized assignment model.
//!
//! An assignment binds one job to a lead team member (and optionally an
//! assistant) at a concrete start time. Assignments are durable: the calling
//! service persists them, and conflict resolution mutates them in place while
//! recording every change in `history`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::TimeSpan;

/// Assignment lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentStatus {
    #[default]
    Proposed,
    Confirmed,
    Rescheduled,
    Reassigned,
    Cancelled,
}

/// Scoring breakdown recorded when the assignment was made.
///
/// `total = distance_miles × region_factor × specialization_factor × load_factor`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssignmentScores {
    pub distance_miles: f64,
    pub region_factor: f64,
    pub specialization_factor: f64,
    pub load_factor: f64,
    pub total: f64,
}

impl Default for AssignmentScores {
    fn default() -> Self {
        Self {
            distance_miles: 0.0,
            region_factor: 1.0,
            specialization_factor: 1.0,
            load_factor: 1.0,
            total: 0.0,
        }
    }
}

/// Kind of change recorded in an assignment's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryAction {
    Created,
    Rescheduled,
    Reassigned,
}

/// One entry in an assignment's change log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub action: HistoryAction,
    pub detail: String,
}

/// A job-to-team assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizedAssignment {
    /// Unique assignment identifier.
    pub id: String,
    /// Assigned job.
    pub job_id: String,
    /// Lead team member.
    pub lead_id: String,
    /// Optional assisting team member.
    pub assistant_id: Option<String>,
    pub status: AssignmentStatus,
    /// Planned start on site.
    pub scheduled_start: NaiveDateTime,
    /// Planned on-site duration in minutes.
    pub duration_minutes: u32,
    /// Estimated one-way distance from the lead's home base, in miles.
    pub estimated_distance_miles: f64,
    /// Estimated one-way travel time, in minutes.
    pub estimated_travel_minutes: u32,
    /// Buffer reserved after the job, in minutes.
    pub buffer_minutes: u32,
    pub scores: AssignmentScores,
    /// Free-form annotations.
    pub metadata: HashMap<String, String>,
    /// Change log, oldest first.
    pub history: Vec<HistoryEntry>,
}

impl OptimizedAssignment {
    /// Creates a proposed assignment with a `Created` history entry.
    pub fn new(
        job_id: impl Into<String>,
        lead_id: impl Into<String>,
        scheduled_start: NaiveDateTime,
        duration_minutes: u32,
    ) -> Self {
        let job_id = job_id.into();
        let lead_id = lead_id.into();
        Self {
            id: format!("{job_id}@{lead_id}"),
            history: vec![HistoryEntry {
                action: HistoryAction::Created,
                detail: format!("assigned to {lead_id}"),
            }],
            job_id,
            lead_id,
            assistant_id: None,
            status: AssignmentStatus::Proposed,
            scheduled_start,
            duration_minutes,
            estimated_distance_miles: 0.0,
            estimated_travel_minutes: 0,
            buffer_minutes: 0,
            scores: AssignmentScores::default(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_assistant(mut self, assistant_id: impl Into<String>) -> Self {
        self.assistant_id = Some(assistant_id.into());
        self
    }

    pub fn with_travel(mut self, distance_miles: f64, travel_minutes: u32) -> Self {
        self.estimated_distance_miles = distance_miles;
        self.estimated_travel_minutes = travel_minutes;
        self
    }

    pub fn with_buffer(mut self, minutes: u32) -> Self {
        self.buffer_minutes = minutes;
        self
    }

    pub fn with_scores(mut self, scores: AssignmentScores) -> Self {
        self.scores = scores;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The on-site interval [start, start + duration).
    pub fn span(&self) -> TimeSpan {
        TimeSpan::from_start(self.scheduled_start, self.duration_minutes)
    }

    /// The on-site interval extended by the trailing buffer.
    pub fn occupied_span(&self) -> TimeSpan {
        TimeSpan::from_start(
            self.scheduled_start,
            self.duration_minutes + self.buffer_minutes,
        )
    }

    /// Lead and assistant ids, each listed once.
    pub fn member_ids(&self) -> impl Iterator<Item = &str> {
        let lead = self.lead_id.as_str();
        std::iter::once(lead).chain(self.assistant_id.as_deref().filter(|a| *a != lead))
    }

    /// Whether `member_id` works on this assignment.
    pub fn involves(&self, member_id: &str) -> bool {
        self.member_ids().any(|m| m == member_id)
    }

    /// Moves the assignment to a new start time.
    pub fn reschedule(&mut self, start: NaiveDateTime, reason: &str) {
        let detail = format!("{} -> {}: {reason}", self.scheduled_start, start);
        self.scheduled_start = start;
        self.status = AssignmentStatus::Rescheduled;
        self.history.push(HistoryEntry {
            action: HistoryAction::Rescheduled,
            detail,
        });
    }

    /// Hands the assignment to a different lead.
    pub fn reassign(
        &mut self,
        lead_id: &str,
        distance_miles: f64,
        travel_minutes: u32,
        scores: AssignmentScores,
        reason: &str,
    ) {
        let detail = format!("{} -> {lead_id}: {reason}", self.lead_id);
        self.lead_id = lead_id.to_string();
        if self.assistant_id.as_deref() == Some(lead_id) {
            self.assistant_id = None;
        }
        self.estimated_distance_miles = distance_miles;
        self.estimated_travel_minutes = travel_minutes;
        self.scores = scores;
        self.status = AssignmentStatus::Reassigned;
        self.history.push(HistoryEntry {
            action: HistoryAction::Reassigned,
            detail,
        });
    }
}
