//! Service job model.
//!
//! A job is a single on-site visit at a customer address. Jobs are owned by
//! the calling service; the only mutation this crate performs on them is
//! coordinate enrichment via [`Job::enrich_coordinate`].

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::Coordinate;

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    #[default]
    Pending,
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

/// Business priority of a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JobPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

/// Required arrival interval for a route stop, `[start, end]` wall-clock.
///
/// Arriving before `start` means waiting; arriving after `end` is a miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrivalWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl ArrivalWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Whether an arrival at `time` is inside the window (inclusive).
    #[inline]
    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.start && time <= self.end
    }
}

/// A service job to be routed and assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier.
    pub id: String,
    /// Customer display name.
    pub customer_name: String,
    /// Customer contact number.
    pub customer_phone: Option<String>,
    /// Street address of the visit.
    pub address: String,
    /// Geocoded address. `None` = not yet geocoded; such jobs are excluded
    /// from geometric work and reported, never dropped.
    pub coordinate: Option<Coordinate>,
    /// Service region label, matched against a team's region/subregions.
    pub region: Option<String>,
    /// Scheduled service date.
    pub scheduled_date: NaiveDate,
    /// Scheduled start time. `None` = any time within working hours.
    pub scheduled_time: Option<NaiveTime>,
    /// On-site duration in minutes.
    pub duration_minutes: u32,
    pub status: JobStatus,
    pub priority: JobPriority,
    /// Capability tags a team must cover to perform this job.
    pub required_specializations: BTreeSet<String>,
    /// Required arrival interval for this stop.
    pub arrival_window: Option<ArrivalWindow>,
    /// Latest acceptable service date.
    pub deadline: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl Job {
    /// Creates a job with a one-hour default duration.
    pub fn new(id: impl Into<String>, address: impl Into<String>, scheduled_date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            customer_name: String::new(),
            customer_phone: None,
            address: address.into(),
            coordinate: None,
            region: None,
            scheduled_date,
            scheduled_time: None,
            duration_minutes: 60,
            status: JobStatus::Pending,
            priority: JobPriority::Normal,
            required_specializations: BTreeSet::new(),
            arrival_window: None,
            deadline: None,
            notes: None,
        }
    }

    pub fn with_customer(mut self, name: impl Into<String>) -> Self {
        self.customer_name = name.into();
        self
    }

    pub fn with_coordinate(mut self, latitude: f64, longitude: f64) -> Self {
        self.coordinate = Some(Coordinate::new(latitude, longitude));
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_time(mut self, time: NaiveTime) -> Self {
        self.scheduled_time = Some(time);
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    pub fn with_priority(mut self, priority: JobPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Adds a required capability tag.
    pub fn with_specialization(mut self, tag: impl Into<String>) -> Self {
        self.required_specializations.insert(tag.into());
        self
    }

    pub fn with_arrival_window(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.arrival_window = Some(ArrivalWindow::new(start, end));
        self
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Sets a geocoded coordinate obtained by the caller.
    pub fn enrich_coordinate(&mut self, coordinate: Coordinate) {
        self.coordinate = Some(coordinate);
    }

    /// Whether the job carries a usable coordinate.
    pub fn has_coordinate(&self) -> bool {
        self.coordinate.is_some_and(|c| c.is_valid())
    }

    /// The usable coordinate, if any.
    pub fn location(&self) -> Option<Coordinate> {
        self.coordinate.filter(|c| c.is_valid())
    }

    /// Scheduled start, falling back to `default_time` when no time is set.
    pub fn scheduled_start(&self, default_time: NaiveTime) -> NaiveDateTime {
        self.scheduled_date
            .and_time(self.scheduled_time.unwrap_or(default_time))
    }
}
