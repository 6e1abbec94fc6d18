//! Route output models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One stop of an optimized route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub job_id: String,
    pub address: String,
    pub estimated_arrival: NaiveDateTime,
    pub estimated_departure: NaiveDateTime,
    /// Leg distance from the previous stop (or the start point), miles.
    pub distance_from_previous: f64,
    /// Leg travel time from the previous stop, minutes.
    pub time_from_previous: u32,
}

/// Improvement of an optimized route over visiting jobs in input order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteSavings {
    /// Miles saved (negative if the optimized route is longer).
    pub distance_saved: f64,
    /// Travel minutes saved.
    pub time_saved: i64,
    /// `distance_saved / naive_distance × 100`, 0 when the naive route is empty.
    pub percentage_improvement: f64,
}

/// An optimized route for one team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TravelOptimization {
    pub team_id: String,
    /// Stops in visiting order.
    pub route: Vec<RoutePoint>,
    /// Sum of leg distances, miles.
    pub total_distance: f64,
    /// Sum of leg travel times, minutes.
    pub total_time: u32,
    pub savings: RouteSavings,
    /// Jobs left out of the route (no coordinate, out of range or over
    /// the stop limit).
    pub skipped_job_ids: Vec<String>,
}

impl TravelOptimization {
    /// A zero-distance route with no stops.
    pub fn empty(team_id: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
            ..Default::default()
        }
    }

    /// Job ids in visiting order.
    pub fn job_order(&self) -> Vec<&str> {
        self.route.iter().map(|p| p.job_id.as_str()).collect()
    }

    pub fn stop_count(&self) -> usize {
        self.route.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_route() {
        let r = TravelOptimization::empty("T1");
        assert_eq!(r.team_id, "T1");
        assert_eq!(r.stop_count(), 0);
        assert_eq!(r.total_distance, 0.0);
        assert_eq!(r.savings, RouteSavings::default());
        assert!(r.job_order().is_empty());
    }
}
