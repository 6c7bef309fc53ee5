// src/report/console.rs

//! Plain-text tables for terminal output.

use chrono::{DateTime, Utc};

use crate::models::{
    Category, ComparisonPeriod, Config, DayComparison, KeywordStatus, RunSummary, Trend,
};
use crate::report::{days_label, format_time};

fn section(
    out: &mut String,
    title: &str,
    items: &[KeywordStatus],
    line: impl Fn(&KeywordStatus) -> String,
) {
    out.push_str(&format!("[{}] {}\n", title, items.len()));
    for item in items {
        out.push_str(&format!("  - {}\n", line(item)));
    }
}

fn not_exposed_line(s: &KeywordStatus, now: DateTime<Utc>) -> String {
    let last = match s.last_exposed_at {
        Some(t) => format!("{} ({})", format_time(t), days_label(Some(t), now)),
        None => days_label(None, now),
    };
    let url = s.last_exposed_url.as_deref().unwrap_or("-");
    let mut line = format!("{}  last exposed: {}  {}", s.keyword, last, url);
    if let Some(top) = &s.top_cafe {
        line.push_str(&format!("  top cafe: #{} {}", top.position, top.cafe_name));
    }
    line
}

/// One summary as bucketed keyword lists followed by its rates.
pub fn render_summary(summary: &RunSummary, title: &str, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let border = "=".repeat(60);
    out.push_str(&format!("{border}\n"));
    out.push_str(&format!(
        "  {} ({})  {}\n",
        title,
        summary.scope,
        format_time(summary.timestamp)
    ));
    out.push_str(&format!("{border}\n"));

    section(&mut out, "Exposed", &summary.exposed, |s| {
        format!("{} ({}/{})", s.keyword, s.exposed_count, s.total_count)
    });
    section(&mut out, "Partially exposed", &summary.partially_exposed, |s| {
        format!("{} ({}/{})", s.keyword, s.exposed_count, s.total_count)
    });
    section(&mut out, "Not exposed", &summary.not_exposed, |s| {
        not_exposed_line(s, now)
    });
    section(&mut out, "No URL", &summary.no_url, |s| s.keyword.clone());

    out.push_str(&format!(
        "Keywords: {}  Published: {}  Exposure rate: {}%  Publish rate: {:.2}%\n",
        summary.total_keywords,
        summary.published_count(),
        summary.exposure_rate,
        summary.publish_rate
    ));
    out
}

/// Statistics table: one row per category plus the overall row.
pub fn render_stats(config: &Config, per_category: &[RunSummary], overall: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<20} {:>8} {:>8} {:>8} {:>8} {:>8} {:>9} {:>9}\n",
        "category", "keywords", "exposed", "partial", "missing", "no_url", "exposure", "publish"
    ));
    let rule = "-".repeat(86);
    out.push_str(&rule);
    out.push('\n');

    let row = |out: &mut String, name: &str, s: &RunSummary| {
        out.push_str(&format!(
            "{:<20} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}% {:>8.2}%\n",
            name,
            s.total_keywords,
            s.exposed.len(),
            s.partially_exposed.len(),
            s.not_exposed.len(),
            s.no_url.len(),
            s.exposure_rate,
            s.publish_rate
        ));
    };

    for summary in per_category {
        let category = Category::new(summary.scope.clone());
        row(&mut out, config.display_name(&category), summary);
    }
    out.push_str(&rule);
    out.push('\n');
    row(&mut out, "all", overall);
    out
}

fn trend_mark(trend: Trend) -> &'static str {
    match trend {
        Trend::Up => "▲",
        Trend::Down => "▼",
        Trend::Flat => "-",
    }
}

/// Day-by-day comparison of two windows for one keyword.
pub fn render_trend(keyword: &str, periods: &ComparisonPeriod, rows: &[DayComparison]) -> String {
    let mut out = String::new();
    let p1 = &periods.period_1;
    let p2 = &periods.period_2;
    out.push_str(&format!("Search volume: {keyword}\n"));
    out.push_str(&format!("  {}: {} ~ {} ({} days)\n", p1.label, p1.start, p1.end, p1.days()));
    out.push_str(&format!("  {}: {} ~ {} ({} days)\n", p2.label, p2.start, p2.end, p2.days()));
    out.push_str(&format!(
        "{:>4}  {:<12} {:>8}  {:<12} {:>8}  {}\n",
        "day", p1.label, "", p2.label, "", "trend"
    ));

    let (mut total_1, mut total_2) = (0u64, 0u64);
    for row in rows {
        total_1 += row.period_1.value;
        total_2 += row.period_2.value;
        out.push_str(&format!(
            "{:>4}  {:<12} {:>8}  {:<12} {:>8}  {}\n",
            row.index + 1,
            row.period_1.date.format("%m-%d (%a)").to_string(),
            row.period_1.value,
            row.period_2.date.format("%m-%d (%a)").to_string(),
            row.period_2.value,
            trend_mark(row.trend)
        ));
    }
    if rows.is_empty() {
        out.push_str("  (no overlapping days)\n");
    } else {
        out.push_str(&format!("total {:>21} {:>22}\n", total_1, total_2));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyPoint, TopCafeHit};
    use crate::pipeline::period::{compare_by_day, compute_periods};
    use chrono::{NaiveDate, TimeZone};

    fn status(keyword: &str, exposed_count: usize, total_count: usize) -> KeywordStatus {
        KeywordStatus {
            category: Category::from("cancer"),
            keyword: keyword.into(),
            priority: String::new(),
            exposed_count,
            total_count,
            last_exposed_at: None,
            last_exposed_url: None,
            top_cafe: None,
        }
    }

    fn summary() -> RunSummary {
        RunSummary {
            scope: "cancer".into(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 10, 3, 0, 0).unwrap(),
            total_keywords: 4,
            exposed: vec![status("exposed-kw", 1, 1)],
            partially_exposed: vec![status("partial-kw", 1, 2)],
            not_exposed: vec![status("missing-kw", 0, 1)],
            no_url: vec![status("draft-kw", 0, 0)],
            exposure_rate: 33,
            publish_rate: 75.0,
        }
    }

    #[test]
    fn test_summary_lists_every_bucket() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 3, 0, 0).unwrap();
        let text = render_summary(&summary(), "암 카테고리", now);
        assert!(text.contains("[Exposed] 1"));
        assert!(text.contains("partial-kw (1/2)"));
        assert!(text.contains("missing-kw  last exposed: no record"));
        assert!(text.contains("[No URL] 1"));
        assert!(text.contains("Exposure rate: 33%"));
        assert!(text.contains("Publish rate: 75.00%"));
    }

    #[test]
    fn test_stats_uses_display_names() {
        let text = render_stats(&Config::default(), &[summary()], &summary());
        assert!(text.contains("암 카테고리"));
        assert!(text.lines().last().unwrap().starts_with("all"));
    }

    #[test]
    fn test_trend_table() {
        let periods = compute_periods(NaiveDate::from_ymd_opt(2026, 3, 11).unwrap());
        let first = vec![DailyPoint::new(periods.period_1.start, 10)];
        let second = vec![DailyPoint::new(periods.period_2.start, 12)];
        let rows = compare_by_day(&periods, &first, &second);
        let text = render_trend("비타민", &periods, &rows);
        assert!(text.contains("▲"));
        assert!(text.contains("(2 days)"));

        let empty = render_trend("비타민", &periods, &[]);
        assert!(empty.contains("no overlapping days"));
    }

    #[test]
    fn test_not_exposed_line_names_top_cafe() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 3, 0, 0).unwrap();
        let mut s = summary();
        s.not_exposed[0].top_cafe = Some(TopCafeHit {
            position: 3,
            url: "https://cafe.example.com/club/5".into(),
            cafe_id: "club".into(),
            cafe_name: "건강카페".into(),
        });
        let text = render_summary(&s, "암 카테고리", now);
        assert!(text.contains("top cafe: #3 건강카페"));
    }
}
