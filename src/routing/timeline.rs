//! Route timing simulation.
//!
//! Walks a visiting order over a [`DistanceMatrix`] and computes, per stop,
//! the leg distance/time and the arrival/departure wall-clock times.
//!
//! # Timing rules
//! - The route clock starts at working-hours start on the route date.
//! - Arrival = previous departure + buffer + leg travel time (the first leg
//!   from the home base starts at the day start, without buffer).
//! - Arriving before a stop's arrival window opens means waiting for it.
//! - Arriving after the window closes (or, without a window, after the end of
//!   working hours) is a violation.
//! - Departure = arrival + on-site duration.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::matrix::DistanceMatrix;
use crate::models::{ArrivalWindow, WorkingHours};

/// A stop to simulate: its matrix row plus on-site requirements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stop {
    pub row: usize,
    pub duration_minutes: u32,
    pub window: Option<ArrivalWindow>,
}

/// Day boundaries and buffer for one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteClock {
    pub day_start: NaiveDateTime,
    pub day_end: NaiveDateTime,
    pub buffer_minutes: u32,
}

impl RouteClock {
    /// Clock for `date` under `hours`.
    pub fn on(date: NaiveDate, hours: &WorkingHours, buffer_minutes: u32) -> Self {
        Self {
            day_start: date.and_time(hours.start),
            day_end: date.and_time(hours.end),
            buffer_minutes,
        }
    }
}

/// One simulated leg, ending at a stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leg {
    pub distance: f64,
    pub minutes: u32,
    pub arrival: NaiveDateTime,
    pub departure: NaiveDateTime,
    pub on_time: bool,
}

/// Result of simulating a full visiting order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    pub legs: Vec<Leg>,
    pub total_distance: f64,
    pub total_minutes: u32,
    pub violations: usize,
}

/// Simulates visiting `stops` in order, starting from matrix row `start`
/// (`None` = begin at the first stop).
pub fn simulate<'a, I>(matrix: &DistanceMatrix, start: Option<usize>, stops: I, clock: &RouteClock) -> Timeline
where
    I: IntoIterator<Item = &'a Stop>,
{
    let mut timeline = Timeline::default();
    let mut prev = start;
    let mut ready = clock.day_start;

    for stop in stops {
        let (distance, minutes) = match prev {
            Some(p) => (matrix.distance_at(p, stop.row), matrix.duration_at(p, stop.row)),
            None => (0.0, 0),
        };

        let mut arrival = ready + Duration::minutes(i64::from(minutes));
        let on_time = match stop.window {
            Some(w) => {
                let opens = arrival.date().and_time(w.start);
                if arrival < opens {
                    arrival = opens;
                }
                arrival.date() == clock.day_start.date() && w.contains(arrival.time())
            }
            None => arrival <= clock.day_end,
        };
        let departure = arrival + Duration::minutes(i64::from(stop.duration_minutes));

        timeline.total_distance += distance;
        timeline.total_minutes += minutes;
        if !on_time {
            timeline.violations += 1;
        }
        timeline.legs.push(Leg {
            distance,
            minutes,
            arrival,
            departure,
            on_time,
        });

        ready = departure + Duration::minutes(i64::from(clock.buffer_minutes));
        prev = Some(stop.row);
    }

    timeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Location;
    use crate::models::Coordinate;
    use chrono::NaiveTime;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn clock() -> RouteClock {
        RouteClock::on(
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            &WorkingHours::default(),
            15,
        )
    }

    fn line_matrix() -> DistanceMatrix {
        // Rural points spaced ~6.9 miles apart along a meridian.
        let locs: Vec<Location> = (0..4)
            .map(|i| {
                Location::new(
                    format!("L{i}"),
                    "Route 9",
                    Some(Coordinate::new(38.0 + 0.1 * i as f64, -98.5)),
                )
            })
            .collect();
        DistanceMatrix::build(&locs)
    }

    fn stop(row: usize) -> Stop {
        Stop {
            row,
            duration_minutes: 60,
            window: None,
        }
    }

    #[test]
    fn test_simulate_from_home() {
        let m = line_matrix();
        let stops = [stop(1), stop(2)];
        let tl = simulate(&m, Some(0), &stops, &clock());

        assert_eq!(tl.legs.len(), 2);
        let leg0 = tl.legs[0];
        assert_eq!(leg0.distance, m.distance_at(0, 1));
        assert_eq!(leg0.arrival, clock().day_start + Duration::minutes(i64::from(leg0.minutes)));
        assert_eq!(leg0.departure, leg0.arrival + Duration::minutes(60));

        let leg1 = tl.legs[1];
        let expected = leg0.departure + Duration::minutes(15 + i64::from(leg1.minutes));
        assert_eq!(leg1.arrival, expected);

        assert!((tl.total_distance - (leg0.distance + leg1.distance)).abs() < 1e-10);
        assert_eq!(tl.violations, 0);
    }

    #[test]
    fn test_simulate_without_start() {
        let m = line_matrix();
        let stops = [stop(2), stop(3)];
        let tl = simulate(&m, None, &stops, &clock());

        assert_eq!(tl.legs[0].distance, 0.0);
        assert_eq!(tl.legs[0].arrival, clock().day_start);
        assert_eq!(tl.legs[1].distance, m.distance_at(2, 3));
    }

    #[test]
    fn test_early_arrival_waits() {
        let m = line_matrix();
        let stops = [Stop {
            row: 1,
            duration_minutes: 30,
            window: Some(ArrivalWindow::new(t(10, 0), t(12, 0))),
        }];
        let tl = simulate(&m, Some(0), &stops, &clock());
        assert_eq!(tl.legs[0].arrival.time(), t(10, 0));
        assert!(tl.legs[0].on_time);
        assert_eq!(tl.violations, 0);
    }

    #[test]
    fn test_late_arrival_is_violation() {
        let m = line_matrix();
        let stops = [
            Stop {
                row: 1,
                duration_minutes: 240,
                window: None,
            },
            Stop {
                row: 2,
                duration_minutes: 30,
                window: Some(ArrivalWindow::new(t(8, 0), t(9, 0))),
            },
        ];
        let tl = simulate(&m, Some(0), &stops, &clock());
        assert!(tl.legs[0].on_time);
        assert!(!tl.legs[1].on_time);
        assert_eq!(tl.violations, 1);
    }

    #[test]
    fn test_past_working_hours_is_violation() {
        let m = line_matrix();
        let long = Stop {
            row: 1,
            duration_minutes: 600,
            window: None,
        };
        let stops = [long, stop(2)];
        let tl = simulate(&m, Some(0), &stops, &clock());
        assert_eq!(tl.violations, 1);
        assert!(!tl.legs[1].on_time);
    }
}
