//! Input validation for a planning round.
//!
//! Checks structural integrity of jobs and team members before allocation.
//! Detects:
//! - Duplicate IDs
//! - Out-of-range coordinates (a *missing* coordinate is not an error; such
//!   jobs and teams are reported as unassigned/invalid downstream)
//! - Teams with zero daily capacity or an unusable travel radius
//! - Availability windows that end before they start
//! - Arrival windows that end before they start

use crate::models::{Coordinate, Job, TeamMember};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    /// Two jobs or two teams share the same ID.
    DuplicateId,
    /// Latitude/longitude outside [-90, 90] / [-180, 180] or not finite.
    InvalidCoordinate,
    /// A team cannot take any job per day.
    ZeroCapacity,
    /// Travel radius is negative or not finite.
    InvalidTravelRadius,
    /// An availability window ends before it starts.
    InvalidAvailabilityWindow,
    /// A job's arrival window ends before it starts.
    InvalidArrivalWindow,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Validates the jobs and team roster of one planning round.
///
/// Checks:
/// 1. No duplicate job IDs
/// 2. No duplicate team IDs
/// 3. Every present coordinate (job location, team home base) is in range
/// 4. Every team has capacity ≥ 1 and a finite, non-negative travel radius
/// 5. Every availability window ends after it starts (dates and times)
/// 6. Every arrival window ends at or after its start
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(jobs: &[Job], teams: &[TeamMember]) -> ValidationResult {
    let mut errors = Vec::new();

    let mut job_ids = HashSet::new();
    for job in jobs {
        if !job_ids.insert(job.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate job ID: {}", job.id),
            ));
        }

        if let Some(c) = &job.coordinate {
            check_coordinate(c, &format!("Job '{}'", job.id), &mut errors);
        }

        if let Some(w) = &job.arrival_window {
            if w.end < w.start {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidArrivalWindow,
                    format!("Job '{}' arrival window ends at {} before it starts at {}", job.id, w.end, w.start),
                ));
            }
        }
    }

    let mut team_ids = HashSet::new();
    for team in teams {
        if !team_ids.insert(team.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate team ID: {}", team.id),
            ));
        }

        if let Some(c) = &team.home_coordinate {
            check_coordinate(c, &format!("Team '{}' home base", team.id), &mut errors);
        }

        if team.capacity == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::ZeroCapacity,
                format!("Team '{}' has zero daily capacity", team.id),
            ));
        }

        if !team.travel_radius_miles.is_finite() || team.travel_radius_miles < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTravelRadius,
                format!("Team '{}' has travel radius {}", team.id, team.travel_radius_miles),
            ));
        }

        for (i, w) in team.availability.windows.iter().enumerate() {
            let dates_reversed = w.end_date.is_some_and(|end| end < w.start_date);
            if dates_reversed || w.end_time <= w.start_time {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidAvailabilityWindow,
                    format!("Team '{}' availability window #{} ends before it starts", team.id, i + 1),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_coordinate(c: &Coordinate, owner: &str, errors: &mut Vec<ValidationError>) {
    if !c.is_valid() {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidCoordinate,
            format!("{owner} has out-of-range coordinate ({}, {})", c.latitude, c.longitude),
        ));
    }
}
