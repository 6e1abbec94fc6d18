//! Field-service domain models.
//!
//! Inputs are owned by the surrounding service and treated as read-only:
//! jobs, team members and the constraints object. Outputs are computed
//! per call: routes, assignments and (in [`crate::conflict`]) conflicts.
//!
//! # Domain Mappings
//!
//! | u-fieldops | Field service | Home healthcare | Installation crews |
//! |------------|---------------|-----------------|--------------------|
//! | Job | Service call | Home visit | Install order |
//! | TeamMember | Technician / crew | Nurse | Crew lead |
//! | Availability | Shift roster | Rota | Crew calendar |
//! | OptimizedAssignment | Dispatch | Visit booking | Work order |

mod assignment;
mod availability;
mod constraints;
mod coordinate;
mod job;
mod route;
mod team;

pub use assignment::{
    AssignmentScores, AssignmentStatus, HistoryAction, HistoryEntry, OptimizedAssignment,
};
pub use availability::{Availability, AvailabilityWindow, TimeSpan};
pub use constraints::{SchedulingConstraints, WorkingHours};
pub use coordinate::Coordinate;
pub use job::{ArrivalWindow, Job, JobPriority, JobStatus};
pub use route::{RoutePoint, RouteSavings, TravelOptimization};
pub use team::{PerformanceMetrics, TeamMember};
