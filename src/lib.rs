//! Field-service planning engine for the U-Engine ecosystem.
//!
//! Turns service jobs and a field-team roster into team assignments,
//! per-team multi-stop routes and a reviewed conflict report. Every call is
//! a synchronous, side-effect-free computation over caller-owned inputs; the
//! host service owns persistence, transport and presentation.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Job`, `TeamMember`, `Availability`,
//!   `OptimizedAssignment`, `SchedulingConstraints`, `TravelOptimization`
//! - **`geo`**: Great-circle distance, travel-time estimation, urban detection
//! - **`cluster`**: Radius-based spatial clustering of jobs
//! - **`matrix`**: Pairwise distance/duration matrices and a bounded shared cache
//! - **`routing`**: Nearest-neighbor + 2-opt and GA route search, bulk per-team fan-out
//! - **`ga`**: Route-ordering problem for the `u-metaheur` GA runner
//! - **`allocation`**: Scored job-to-team allocation with pluggable factors
//! - **`conflict`**: Seven-rule conflict detection and rule-based resolution
//! - **`planner`**: One planning round end to end, with KPIs
//! - **`validation`**: Input integrity checks (duplicate IDs, ranges, windows)
//! - **`config`**: Aggregated serde-loadable configuration
//!
//! # Degraded inputs
//!
//! Jobs or teams without coordinates are excluded from geometric work and
//! listed in the result structures (`skipped_job_ids`, `unassigned_jobs`,
//! `invalid_team_ids`), never dropped. A failing per-team route falls back to
//! an empty route flagged with its error. Deadline conflicts are always left
//! for human review.
//!
//! # References
//!
//! - Toth & Vigo (2014), "Vehicle Routing: Problems, Methods, and Applications"
//! - Croes (1958), "A Method for Solving Traveling-Salesman Problems"
//! - Goldberg (1989), "Genetic Algorithms in Search, Optimization, and Machine Learning"

pub mod allocation;
pub mod cluster;
pub mod config;
pub mod conflict;
pub mod error;
pub mod ga;
pub mod geo;
pub mod matrix;
pub mod models;
pub mod planner;
pub mod routing;
pub mod validation;

pub use error::{FieldOpsError, Result};
