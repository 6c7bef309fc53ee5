//! Calendar windows and daily series for week-over-week comparison.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A named, contiguous range of days (inclusive on both ends).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(label: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            label: label.into(),
            start,
            end,
        }
    }

    /// Number of days covered.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Two adjacent windows plus the single fetch range covering both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonPeriod {
    pub period_1: Period,
    pub period_2: Period,
    pub fetch_start: NaiveDate,
    pub fetch_end: NaiveDate,
}

/// One day of a search-volume series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub value: u64,
}

impl DailyPoint {
    pub fn new(date: NaiveDate, value: u64) -> Self {
        Self { date, value }
    }
}

/// Direction of the later window relative to the earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

/// Same-offset comparison of two windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayComparison {
    /// 0-based day-of-window index
    pub index: usize,
    pub period_1: DailyPoint,
    pub period_2: DailyPoint,
    pub trend: Trend,
}
