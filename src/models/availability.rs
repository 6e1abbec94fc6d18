//! Availability calendar and time span models.
//!
//! Defines when a team member can work: dated or recurring weekly windows,
//! plus blocked periods (leave, training) expressed as windows with
//! `is_available = false`.
//!
//! # Precedence
//! Blocked windows override available ones. A span is available iff:
//! - It lies inside at least one available window (or no available windows
//!   are defined at all), AND
//! - It does NOT overlap any blocked window.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::WorkingHours;

/// A wall-clock interval [start, end).
///
/// Half-open interval: includes start, excludes end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeSpan {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Span of `minutes` starting at `start`.
    pub fn from_start(start: NaiveDateTime, minutes: u32) -> Self {
        Self {
            start,
            end: start + Duration::minutes(i64::from(minutes)),
        }
    }

    #[inline]
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Whether two spans overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// One availability (or blocked) window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    /// First date the window applies.
    pub start_date: NaiveDate,
    /// Last date the window applies (inclusive). `None` = open-ended.
    pub end_date: Option<NaiveDate>,
    /// Daily start time.
    pub start_time: NaiveTime,
    /// Daily end time.
    pub end_time: NaiveTime,
    /// Whether the window repeats weekly on `weekdays`.
    pub recurring: bool,
    /// Weekdays of a recurring window.
    pub weekdays: Vec<Weekday>,
    /// `false` = blocked period.
    pub is_available: bool,
}

impl AvailabilityWindow {
    /// A window covering every day from `start_date` to `end_date`.
    pub fn dated(
        start_date: NaiveDate,
        end_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Self {
        Self {
            start_date,
            end_date: Some(end_date),
            start_time,
            end_time,
            recurring: false,
            weekdays: Vec::new(),
            is_available: true,
        }
    }

    /// An open-ended weekly window starting at `from`.
    pub fn weekly(
        from: NaiveDate,
        weekdays: Vec<Weekday>,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Self {
        Self {
            start_date: from,
            end_date: None,
            start_time,
            end_time,
            recurring: true,
            weekdays,
            is_available: true,
        }
    }

    /// Turns this window into a blocked period.
    pub fn blocked(mut self) -> Self {
        self.is_available = false;
        self
    }

    /// Whether the window applies on `date` (ignoring time of day).
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        if date < self.start_date {
            return false;
        }
        if self.end_date.is_some_and(|end| date > end) {
            return false;
        }
        !self.recurring || self.weekdays.contains(&date.weekday())
    }

    /// The concrete interval this window spans on `date`, if it applies.
    pub fn span_on(&self, date: NaiveDate) -> Option<TimeSpan> {
        self.applies_on(date)
            .then(|| TimeSpan::new(date.and_time(self.start_time), date.and_time(self.end_time)))
    }

    /// Whether `span` lies entirely inside this window on a single day.
    pub fn covers(&self, span: &TimeSpan) -> bool {
        match self.span_on(span.start.date()) {
            Some(w) => span.start >= w.start && span.end <= w.end,
            None => false,
        }
    }

    /// Whether `span` touches this window on any day it crosses.
    pub fn overlaps(&self, span: &TimeSpan) -> bool {
        let mut date = span.start.date();
        let last = span.end.date();
        while date <= last {
            if self.span_on(date).is_some_and(|w| w.overlaps(span)) {
                return true;
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        false
    }
}

/// A team member's availability calendar.
///
/// If no available windows are defined, the member is always available
/// (subject to blocked windows).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Availability {
    pub windows: Vec<AvailabilityWindow>,
}

impl Availability {
    /// A calendar with no restrictions.
    pub fn always() -> Self {
        Self::default()
    }

    /// Adds a window.
    pub fn with_window(mut self, window: AvailabilityWindow) -> Self {
        self.windows.push(window);
        self
    }

    /// Whether the member can work throughout `span`.
    pub fn is_available_for(&self, span: &TimeSpan) -> bool {
        if self
            .windows
            .iter()
            .filter(|w| !w.is_available)
            .any(|w| w.overlaps(span))
        {
            return false;
        }

        let mut available = self.windows.iter().filter(|w| w.is_available).peekable();
        if available.peek().is_none() {
            return true;
        }
        available.any(|w| w.covers(span))
    }

    /// Finds the earliest start at or after `from` where a `duration_minutes`
    /// span fits inside working hours and availability without overlapping
    /// any of `busy`.
    ///
    /// Searches `from`'s date plus `horizon_days` following days. Returns
    /// `None` if nothing fits.
    pub fn next_free_start(
        &self,
        from: NaiveDateTime,
        duration_minutes: u32,
        working_hours: &WorkingHours,
        horizon_days: u32,
        busy: &[TimeSpan],
    ) -> Option<NaiveDateTime> {
        for offset in 0..=i64::from(horizon_days) {
            let date = from.date() + Duration::days(offset);
            let day_open = date.and_time(working_hours.start);
            let day_close = date.and_time(working_hours.end);
            let earliest = if offset == 0 { from.max(day_open) } else { day_open };

            // Candidate starts: the earliest moment, every window opening,
            // and the end of every blocked window or busy span that day.
            let mut candidates = vec![earliest];
            for w in &self.windows {
                if let Some(s) = w.span_on(date) {
                    candidates.push(if w.is_available { s.start } else { s.end });
                }
            }
            candidates.extend(busy.iter().map(|b| b.end));
            candidates.retain(|c| *c >= earliest && c.date() == date);
            candidates.sort();
            candidates.dedup();

            for start in candidates {
                let span = TimeSpan::from_start(start, duration_minutes);
                if span.end > day_close {
                    continue;
                }
                if busy.iter().any(|b| b.overlaps(&span)) {
                    continue;
                }
                if self.is_available_for(&span) {
                    return Some(start);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        // 2024-03-04 is a Monday
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn span(day: u32, from: (u32, u32), to: (u32, u32)) -> TimeSpan {
        TimeSpan::new(d(day).and_time(t(from.0, from.1)), d(day).and_time(t(to.0, to.1)))
    }

    #[test]
    fn test_time_span_overlap() {
        let a = span(4, (9, 0), (10, 0));
        let b = span(4, (9, 30), (10, 30));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));

        let c = span(4, (10, 0), (11, 0)); // touching but not overlapping
        assert!(!a.overlaps(&c));
        assert_eq!(a.duration_minutes(), 60);
    }

    #[test]
    fn test_always_available() {
        let cal = Availability::always();
        assert!(cal.is_available_for(&span(4, (3, 0), (4, 0))));
    }

    #[test]
    fn test_weekly_window() {
        let cal = Availability::always().with_window(AvailabilityWindow::weekly(
            d(1),
            vec![Weekday::Mon, Weekday::Tue],
            t(8, 0),
            t(17, 0),
        ));

        assert!(cal.is_available_for(&span(4, (9, 0), (10, 0)))); // Monday
        assert!(!cal.is_available_for(&span(6, (9, 0), (10, 0)))); // Wednesday
        assert!(!cal.is_available_for(&span(4, (16, 30), (17, 30)))); // runs past close
    }

    #[test]
    fn test_dated_window_bounds() {
        let cal = Availability::always().with_window(AvailabilityWindow::dated(
            d(4),
            d(5),
            t(8, 0),
            t(12, 0),
        ));
        assert!(cal.is_available_for(&span(5, (8, 0), (12, 0))));
        assert!(!cal.is_available_for(&span(6, (8, 0), (9, 0))));
    }

    #[test]
    fn test_blocked_overrides() {
        let cal = Availability::always()
            .with_window(AvailabilityWindow::dated(d(4), d(8), t(8, 0), t(17, 0)))
            .with_window(AvailabilityWindow::dated(d(4), d(4), t(12, 0), t(13, 0)).blocked());

        assert!(cal.is_available_for(&span(4, (9, 0), (11, 0))));
        assert!(!cal.is_available_for(&span(4, (11, 30), (12, 30))));
        assert!(cal.is_available_for(&span(5, (11, 30), (12, 30))));
    }

    #[test]
    fn test_next_free_start_same_day() {
        let cal = Availability::always();
        let hours = WorkingHours::new(t(8, 0), t(18, 0));
        let busy = [span(4, (9, 0), (10, 0))];

        let start = cal.next_free_start(d(4).and_time(t(9, 0)), 60, &hours, 0, &busy);
        assert_eq!(start, Some(d(4).and_time(t(10, 0))));
    }

    #[test]
    fn test_next_free_start_rolls_to_next_day() {
        let cal = Availability::always();
        let hours = WorkingHours::new(t(8, 0), t(18, 0));

        let start = cal.next_free_start(d(4).and_time(t(17, 30)), 60, &hours, 1, &[]);
        assert_eq!(start, Some(d(5).and_time(t(8, 0))));

        let none = cal.next_free_start(d(4).and_time(t(17, 30)), 60, &hours, 0, &[]);
        assert!(none.is_none());
    }

    #[test]
    fn test_next_free_start_waits_for_window() {
        let cal = Availability::always().with_window(AvailabilityWindow::weekly(
            d(1),
            vec![Weekday::Wed],
            t(13, 0),
            t(17, 0),
        ));
        let hours = WorkingHours::default();

        let start = cal.next_free_start(d(4).and_time(t(9, 0)), 90, &hours, 7, &[]);
        assert_eq!(start, Some(d(6).and_time(t(13, 0))));
    }

    #[test]
    fn test_next_free_start_after_blocked() {
        let cal = Availability::always()
            .with_window(AvailabilityWindow::dated(d(4), d(4), t(8, 0), t(12, 0)).blocked());
        let hours = WorkingHours::default();

        let start = cal.next_free_start(d(4).and_time(t(8, 0)), 60, &hours, 0, &[]);
        assert_eq!(start, Some(d(4).and_time(t(12, 0))));
    }
}
