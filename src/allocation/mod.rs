//! Job-to-team allocation.
//!
//! Each job is offered to every eligible team and goes to the lowest score:
//!
//! ```text
//! score = distance × region_factor × specialization_factor × load_factor × (custom factors)
//! ```
//!
//! Factors are composable [`ScoringFactor`]s combined by a [`TeamScorer`].
//! The standard set is region match (0.8), specialization coverage (0.9)
//! and load penalty (1 + 0.1 × current load).
//!
//! # Usage
//!
//! ```
//! use chrono::NaiveDate;
//! use u_fieldops::allocation::TeamAllocator;
//! use u_fieldops::models::{Job, SchedulingConstraints, TeamMember};
//!
//! let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
//! let teams = vec![
//!     TeamMember::new("T1", "north").with_home("A", 40.0, -74.0),
//!     TeamMember::new("T2", "south").with_home("B", 39.5, -74.0),
//! ];
//! let jobs = vec![Job::new("J1", "x", day).with_coordinate(39.55, -74.0)];
//!
//! let result = TeamAllocator::new(SchedulingConstraints::default()).assign(&jobs, &teams);
//! assert_eq!(result.assignments[0].lead_id, "T2");
//! ```
//!
//! # References
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//!   (priority rule composition)

mod allocator;
pub mod factors;
mod scorer;

pub use allocator::{
    AllocationResult, TeamAllocator, TeamChoice, TeamUtilization, UnassignedJob, UnassignedReason,
};
pub use scorer::TeamScorer;

use std::collections::BTreeSet;
use std::fmt::Debug;

use crate::models::{Job, TeamMember};

/// A job/team pairing under evaluation.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub job: &'a Job,
    pub team: &'a TeamMember,
    /// Effective required tags (job tags plus round constraints).
    pub required: &'a BTreeSet<String>,
    /// Home base to job, miles.
    pub distance_miles: f64,
    /// Jobs already held by the team in this round.
    pub current_load: u32,
}

/// Where a factor's value is reported in [`AssignmentScores`].
///
/// [`AssignmentScores`]: crate::models::AssignmentScores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorKind {
    Region,
    Specialization,
    Load,
    /// Contributes to the total only.
    Custom,
}

/// A multiplicative scoring factor.
///
/// # Score Convention
/// **Lower = better.** Factors below 1.0 favor a team, above 1.0 penalize it.
pub trait ScoringFactor: Send + Sync + Debug {
    /// Factor name (e.g., "region").
    fn name(&self) -> &'static str;

    /// Multiplier for a candidate pairing.
    fn factor(&self, candidate: &Candidate<'_>) -> f64;

    fn kind(&self) -> FactorKind {
        FactorKind::Custom
    }

    fn description(&self) -> &'static str {
        self.name()
    }
}
