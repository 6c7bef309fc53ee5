//! Rolling week-over-week comparison windows.
//!
//! On a Monday the two most recent full weeks are compared. On any other
//! day the current partial week (Monday through yesterday) is compared with
//! the full week before it.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{ComparisonPeriod, DailyPoint, DayComparison, Period, Trend};

pub const LABEL_THIS_WEEK: &str = "this week";
pub const LABEL_LAST_WEEK: &str = "last week";
pub const LABEL_WEEK_BEFORE_LAST: &str = "week before last";

/// Compute the two windows to compare for `today`.
pub fn compute_periods(today: NaiveDate) -> ComparisonPeriod {
    let offset = i64::from(today.weekday().num_days_from_monday());
    let this_monday = today - Duration::days(offset);
    let yesterday = today - Duration::days(1);

    let (period_1, period_2) = if offset == 0 {
        let last_monday = this_monday - Duration::days(7);
        (
            Period::new(
                LABEL_WEEK_BEFORE_LAST,
                last_monday - Duration::days(7),
                last_monday - Duration::days(1),
            ),
            Period::new(LABEL_LAST_WEEK, last_monday, yesterday),
        )
    } else {
        (
            Period::new(
                LABEL_LAST_WEEK,
                this_monday - Duration::days(7),
                this_monday - Duration::days(1),
            ),
            Period::new(LABEL_THIS_WEEK, this_monday, yesterday),
        )
    };

    ComparisonPeriod {
        fetch_start: period_1.start,
        fetch_end: period_2.end,
        period_1,
        period_2,
    }
}

/// Split one fetched series into the two windows, keeping original order.
pub fn split_series(
    daily_points: &[DailyPoint],
    period_1_end: NaiveDate,
) -> (Vec<DailyPoint>, Vec<DailyPoint>) {
    daily_points
        .iter()
        .copied()
        .partition(|p| p.date <= period_1_end)
}

fn trend_of(before: u64, after: u64) -> Trend {
    match after.cmp(&before) {
        std::cmp::Ordering::Greater => Trend::Up,
        std::cmp::Ordering::Less => Trend::Down,
        std::cmp::Ordering::Equal => Trend::Flat,
    }
}

/// Compare the windows by day-of-window offset, not by calendar date.
///
/// Only offsets present in both windows are compared, so a partial second
/// window is matched against the days it actually has.
pub fn compare_by_day(
    periods: &ComparisonPeriod,
    period_1_points: &[DailyPoint],
    period_2_points: &[DailyPoint],
) -> Vec<DayComparison> {
    let offset = |p: &DailyPoint, start: NaiveDate| (p.date - start).num_days();

    let earlier: HashMap<i64, DailyPoint> = period_1_points
        .iter()
        .filter(|p| periods.period_1.contains(p.date))
        .map(|p| (offset(p, periods.period_1.start), *p))
        .collect();

    let mut comparisons: Vec<DayComparison> = period_2_points
        .iter()
        .filter(|p| periods.period_2.contains(p.date))
        .filter_map(|later| {
            let idx = offset(later, periods.period_2.start);
            earlier.get(&idx).map(|before| DayComparison {
                index: idx as usize,
                period_1: *before,
                period_2: *later,
                trend: trend_of(before.value, later.value),
            })
        })
        .collect();

    comparisons.sort_by_key(|c| c.index);
    comparisons
}
