//! Renderers over `RunSummary` and period comparisons.
//!
//! All renderers are pure: they return the document as a `String` and leave
//! printing or writing to the caller.

pub mod console;
pub mod csv;
pub mod html;

use chrono::{DateTime, Local, Utc};

use crate::models::days_since;

pub use console::{render_stats, render_summary, render_trend};
pub use csv::attention_csv;
pub use html::{HtmlReport, render_html};

/// Color band for a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLevel {
    Success,
    Warning,
    Danger,
}

impl RateLevel {
    pub fn of(rate: f64) -> Self {
        if rate >= 70.0 {
            RateLevel::Success
        } else if rate >= 30.0 {
            RateLevel::Warning
        } else {
            RateLevel::Danger
        }
    }

    /// CSS class name.
    pub fn class(self) -> &'static str {
        match self {
            RateLevel::Success => "success",
            RateLevel::Warning => "warning",
            RateLevel::Danger => "danger",
        }
    }
}

/// Local wall-clock rendering of a timestamp.
pub fn format_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// "N days ago" or "no record".
pub fn days_label(last_exposed_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match days_since(last_exposed_at, now) {
        Some(0) => "today".to_string(),
        Some(1) => "1 day ago".to_string(),
        Some(d) => format!("{d} days ago"),
        None => "no record".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_rate_levels() {
        assert_eq!(RateLevel::of(70.0), RateLevel::Success);
        assert_eq!(RateLevel::of(69.9), RateLevel::Warning);
        assert_eq!(RateLevel::of(30.0), RateLevel::Warning);
        assert_eq!(RateLevel::of(0.0), RateLevel::Danger);
    }

    #[test]
    fn test_days_label() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(days_label(None, now), "no record");
        assert_eq!(days_label(Some(now - Duration::hours(5)), now), "today");
        assert_eq!(days_label(Some(now - Duration::hours(49)), now), "2 days ago");
    }
}
