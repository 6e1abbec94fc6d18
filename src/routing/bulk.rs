//! Per-team route optimization fan-out.
//!
//! One unit of work per team, run in parallel with rayon when the
//! `parallel` feature is enabled (sequentially otherwise). Units share no
//! mutable state apart from an optional synchronized [`DistanceCache`].
//!
//! A unit that panics or exceeds its GA time limit yields a zero-route
//! fallback with `error` set; the other units are unaffected.
//!
//! [`DistanceCache`]: crate::matrix::DistanceCache

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::SmallRng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{MultiStopConstraints, RouteOptimizer};
use crate::error::{FieldOpsError, Result};
use crate::models::{Job, TeamMember, TravelOptimization};

/// Jobs to route for one team.
#[derive(Debug, Clone)]
pub struct TeamRouteRequest {
    pub team: TeamMember,
    pub jobs: Vec<Job>,
}

impl TeamRouteRequest {
    pub fn new(team: TeamMember, jobs: Vec<Job>) -> Self {
        Self { team, jobs }
    }
}

/// Result of one team's unit of work.
#[derive(Debug)]
pub struct TeamRouteOutcome {
    pub team_id: String,
    /// Optimized route, or an empty fallback listing every job as skipped.
    pub route: TravelOptimization,
    /// Set when the unit failed or timed out.
    pub error: Option<FieldOpsError>,
    pub elapsed_ms: u64,
}

impl TeamRouteOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Optimizes one route per request.
///
/// Request `i` draws its randomness from `SmallRng::seed_from_u64(base_seed + i)`,
/// so results are reproducible regardless of thread scheduling. Outcomes are
/// returned in request order.
pub fn optimize_teams(
    optimizer: &RouteOptimizer,
    requests: &[TeamRouteRequest],
    constraints: &MultiStopConstraints,
    base_seed: u64,
) -> Vec<TeamRouteOutcome> {
    let unit = |(i, req): (usize, &TeamRouteRequest)| {
        let seed = base_seed.wrapping_add(i as u64);
        run_isolated(&req.team.id, &req.jobs, || {
            let mut rng = SmallRng::seed_from_u64(seed);
            optimizer.optimize_multi_stop_route(&req.jobs, &req.team, constraints, &mut rng)
        })
    };

    #[cfg(feature = "parallel")]
    let outcomes: Vec<TeamRouteOutcome> = requests.par_iter().enumerate().map(unit).collect();

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<TeamRouteOutcome> = requests.iter().enumerate().map(unit).collect();

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    info!(
        "optimized routes for {} team(s), {} failed",
        outcomes.len(),
        failed
    );
    outcomes
}

/// Runs one unit, converting errors and panics into a fallback outcome.
fn run_isolated<F>(team_id: &str, jobs: &[Job], work: F) -> TeamRouteOutcome
where
    F: FnOnce() -> Result<TravelOptimization>,
{
    let started = Instant::now();
    let result = match catch_unwind(AssertUnwindSafe(work)) {
        Ok(result) => result,
        Err(payload) => Err(FieldOpsError::OptimizationFailed {
            team_id: team_id.to_string(),
            reason: panic_message(payload.as_ref()),
        }),
    };
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(route) => TeamRouteOutcome {
            team_id: team_id.to_string(),
            route,
            error: None,
            elapsed_ms,
        },
        Err(e) => {
            warn!("team {team_id}: falling back to empty route: {e}");
            let mut route = TravelOptimization::empty(team_id);
            route.skipped_job_ids = jobs.iter().map(|j| j.id.clone()).collect();
            TeamRouteOutcome {
                team_id: team_id.to_string(),
                route,
                error: Some(e),
                elapsed_ms,
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic during optimization".to_string()
    }
}
