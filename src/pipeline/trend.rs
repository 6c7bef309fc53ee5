// src/pipeline/trend.rs

//! Week-over-week search volume view for one keyword.

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{ComparisonPeriod, DailyPoint, DayComparison};
use crate::pipeline::period::{compare_by_day, compute_periods, split_series};
use crate::services::SearchVolumeSource;

#[derive(Debug, Clone)]
pub struct TrendOutcome {
    pub keyword: String,
    pub periods: ComparisonPeriod,
    pub period_1_points: Vec<DailyPoint>,
    pub period_2_points: Vec<DailyPoint>,
    pub comparisons: Vec<DayComparison>,
}

/// One fetch over the covering range, split into the two windows.
pub async fn run_trend(
    source: &dyn SearchVolumeSource,
    keyword: &str,
    today: NaiveDate,
) -> Result<TrendOutcome> {
    let periods = compute_periods(today);
    log::info!(
        "Trend '{}': {} ~ {} vs {} ~ {}",
        keyword,
        periods.period_1.start,
        periods.period_1.end,
        periods.period_2.start,
        periods.period_2.end
    );

    let points = source
        .fetch_daily(keyword, periods.fetch_start, periods.fetch_end)
        .await?;
    let (period_1_points, period_2_points) = split_series(&points, periods.period_1.end);
    let comparisons = compare_by_day(&periods, &period_1_points, &period_2_points);

    Ok(TrendOutcome {
        keyword: keyword.to_string(),
        periods,
        period_1_points,
        period_2_points,
        comparisons,
    })
}
