//! Scheduling constraints supplied with each planning round.
//!
//! Global limits combine with per-team limits by taking the stricter of the
//! two (see [`SchedulingConstraints::daily_limit`] and
//! [`SchedulingConstraints::travel_limit`]).

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use super::{Job, TeamMember};
use crate::error::Result;

/// Daily working hours [start, end].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl WorkingHours {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }
}

impl Default for WorkingHours {
    /// 08:00 to 18:00.
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(8, 0, 0).expect("valid time of day"),
            end: NaiveTime::from_hms_opt(18, 0, 0).expect("valid time of day"),
        }
    }
}

/// Round-level scheduling constraints.
///
/// Field names serialize in camelCase to match the calling service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulingConstraints {
    /// Global per-team daily job limit.
    pub max_daily_jobs: Option<u32>,
    /// Global per-assignment travel limit in miles.
    pub max_travel_distance: Option<f64>,
    /// Gap kept between consecutive jobs, in minutes.
    #[serde(rename = "bufferTime")]
    pub buffer_minutes: u32,
    /// Extra required capability tags per job id.
    pub required_specializations: HashMap<String, BTreeSet<String>>,
    /// Latest service date per job id. Overrides `Job::deadline`.
    pub deadlines: HashMap<String, NaiveDate>,
    pub working_hours: WorkingHours,
}

impl Default for SchedulingConstraints {
    fn default() -> Self {
        Self {
            max_daily_jobs: None,
            max_travel_distance: None,
            buffer_minutes: 15,
            required_specializations: HashMap::new(),
            deadlines: HashMap::new(),
            working_hours: WorkingHours::default(),
        }
    }
}

impl SchedulingConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads constraints from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_max_daily_jobs(mut self, max: u32) -> Self {
        self.max_daily_jobs = Some(max);
        self
    }

    pub fn with_max_travel_distance(mut self, miles: f64) -> Self {
        self.max_travel_distance = Some(miles);
        self
    }

    pub fn with_buffer(mut self, minutes: u32) -> Self {
        self.buffer_minutes = minutes;
        self
    }

    pub fn with_working_hours(mut self, hours: WorkingHours) -> Self {
        self.working_hours = hours;
        self
    }

    /// Adds a required tag for a job.
    pub fn with_required_specialization(
        mut self,
        job_id: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        self.required_specializations
            .entry(job_id.into())
            .or_default()
            .insert(tag.into());
        self
    }

    pub fn with_deadline(mut self, job_id: impl Into<String>, date: NaiveDate) -> Self {
        self.deadlines.insert(job_id.into(), date);
        self
    }

    /// Daily job limit for a team: `min(capacity, max_daily_jobs)`.
    pub fn daily_limit(&self, team: &TeamMember) -> u32 {
        match self.max_daily_jobs {
            Some(max) => team.capacity.min(max),
            None => team.capacity,
        }
    }

    /// Travel limit for a team: `min(travel_radius, max_travel_distance)`.
    pub fn travel_limit(&self, team: &TeamMember) -> f64 {
        match self.max_travel_distance {
            Some(max) => team.travel_radius_miles.min(max),
            None => team.travel_radius_miles,
        }
    }

    /// Union of a job's own tags and the tags configured for it here.
    pub fn required_for(&self, job: &Job) -> BTreeSet<String> {
        let mut tags = job.required_specializations.clone();
        if let Some(extra) = self.required_specializations.get(&job.id) {
            tags.extend(extra.iter().cloned());
        }
        tags
    }

    /// Effective deadline of a job.
    pub fn deadline_for(&self, job: &Job) -> Option<NaiveDate> {
        self.deadlines.get(&job.id).copied().or(job.deadline)
    }
}
