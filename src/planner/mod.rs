//! Planning-round orchestration and KPI evaluation.
//!
//! Runs one scheduling round end to end over caller-owned inputs.
//!
//! # Pipeline
//!
//! 1. Validate jobs and teams (structural errors abort the round).
//! 2. Cluster jobs geographically (reported for route sheets).
//! 3. Allocate jobs to teams with the scoring engine.
//! 4. Detect and resolve conflicts over the full assignment set.
//! 5. Optimize one route per (team, date) in parallel, isolating failures.
//! 6. Compute round KPIs.
//!
//! Missing coordinates, unassignable jobs, failed routes and unresolved
//! conflicts all surface in [`RoundReport`] rather than as errors.

mod kpi;
mod round;

pub use kpi::PlanKpi;
pub use round::{PlanRequest, RoundPlanner, RoundReport};
