//! Calendar date helpers for per-date processing.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{BloomError, BloomResult};

/// Date format used in job input, storage paths and records.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> BloomResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| BloomError::InvalidInput(format!("invalid date '{}': {}", s, e)))
}

/// Inclusive calendar window searched around a target date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// `date - days ..= date + days`
    pub fn around(date: NaiveDate, days: u32) -> Self {
        let offset = Duration::days(days as i64);
        Self {
            start: date - offset,
            end: date + offset,
        }
    }

    /// ISO8601 interval covering whole days, e.g.
    /// `2025-08-29T00:00:00Z/2025-09-04T23:59:59Z`.
    pub fn to_interval(&self) -> String {
        format!(
            "{}T00:00:00Z/{}T23:59:59Z",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// `(date - days, date + days)`.
pub fn search_window(date: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
    let window = DateWindow::around(date, days);
    (window.start, window.end)
}

/// Dates from `start` to `end` inclusive, stepping by `step_days`.
pub fn date_series(start: NaiveDate, end: NaiveDate, step_days: u32) -> Vec<NaiveDate> {
    let step = Duration::days(step_days.max(1) as i64);
    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        dates.push(current);
        current += step;
    }
    dates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_window_around() {
        let w = DateWindow::around(d("2025-09-01"), 3);
        assert_eq!(w.start, d("2025-08-29"));
        assert_eq!(w.end, d("2025-09-04"));
        assert_eq!(w.to_interval(), "2025-08-29T00:00:00Z/2025-09-04T23:59:59Z");
    }

    #[test]
    fn test_window_crosses_year() {
        let w = DateWindow::around(d("2025-01-02"), 3);
        assert_eq!(w.start, d("2024-12-30"));
        assert_eq!(search_window(d("2025-01-02"), 3), (w.start, w.end));
    }

    #[test]
    fn test_weekly_series() {
        let dates = date_series(d("2025-09-01"), d("2025-09-22"), 7);
        assert_eq!(dates.len(), 4);
        assert_eq!(dates[3], d("2025-09-22"));
        assert!(date_series(d("2025-09-02"), d("2025-09-01"), 7).is_empty());
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("2025-13-01").is_err());
        assert!(parse_date("yesterday").is_err());
    }
}
