//! Scheduling conflict detection and resolution.
//!
//! [`ConflictDetector`] scans a frozen assignment set for seven conflict
//! types; [`ConflictResolver`] runs a detect → resolve → re-detect loop that
//! reschedules or reassigns assignments until no auto-resolvable conflict
//! can be fixed.
//!
//! # Conflict types
//!
//! | Type | Severity | Auto-resolvable |
//! |------|----------|-----------------|
//! | `time_overlap` | high | yes |
//! | `capacity_exceeded` | medium | yes |
//! | `travel_distance` | medium | yes |
//! | `unavailable_team` | high | yes |
//! | `missing_specialization` | high | yes |
//! | `deadline_conflict` | critical | **no** |
//! | `geographic_mismatch` | low | yes |
//!
//! Deadline conflicts are always surfaced for human review.

mod detector;
mod resolver;

pub use detector::ConflictDetector;
pub use resolver::{
    ConflictResolver, ResolutionAction, ResolutionMetrics, ResolutionReport, ResolverConfig,
};

use serde::{Deserialize, Serialize};

/// Conflict category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    TimeOverlap,
    CapacityExceeded,
    TravelDistance,
    UnavailableTeam,
    MissingSpecialization,
    DeadlineConflict,
    GeographicMismatch,
}

impl ConflictType {
    /// Wire name, e.g. `"time_overlap"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::TimeOverlap => "time_overlap",
            ConflictType::CapacityExceeded => "capacity_exceeded",
            ConflictType::TravelDistance => "travel_distance",
            ConflictType::UnavailableTeam => "unavailable_team",
            ConflictType::MissingSpecialization => "missing_specialization",
            ConflictType::DeadlineConflict => "deadline_conflict",
            ConflictType::GeographicMismatch => "geographic_mismatch",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ConflictType::DeadlineConflict => Severity::Critical,
            ConflictType::TimeOverlap
            | ConflictType::UnavailableTeam
            | ConflictType::MissingSpecialization => Severity::High,
            ConflictType::CapacityExceeded | ConflictType::TravelDistance => Severity::Medium,
            ConflictType::GeographicMismatch => Severity::Low,
        }
    }

    pub fn is_auto_resolvable(&self) -> bool {
        !matches!(self, ConflictType::DeadlineConflict)
    }
}

impl std::fmt::Display for ConflictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conflict severity; ordered `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// A detected scheduling conflict.
///
/// Ephemeral: regenerated on every scan. Ids are deterministic, so the same
/// problem keeps the same id across scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingConflict {
    pub id: String,
    pub conflict_type: ConflictType,
    pub severity: Severity,
    pub description: String,
    pub job_ids: Vec<String>,
    pub team_ids: Vec<String>,
    pub assignment_ids: Vec<String>,
    pub suggested_resolution: String,
    pub auto_resolvable: bool,
}
