// src/report/csv.rs

//! Needs-attention export for spreadsheet tools.

use chrono::{DateTime, Utc};

use crate::models::{Config, KeywordStatus, RunSummary, days_since};
use crate::report::format_time;
use crate::utils::csv::to_csv_string;

const HEADER: [&str; 9] = [
    "category",
    "keyword",
    "priority",
    "status",
    "exposed/total",
    "last_exposed_at",
    "days_since_exposure",
    "url",
    "top_cafe",
];

fn row(config: &Config, status: &str, s: &KeywordStatus, now: DateTime<Utc>) -> Vec<String> {
    vec![
        config.display_name(&s.category).to_string(),
        s.keyword.clone(),
        s.priority.clone(),
        status.to_string(),
        format!("{}/{}", s.exposed_count, s.total_count),
        s.last_exposed_at.map(format_time).unwrap_or_default(),
        days_since(s.last_exposed_at, now)
            .map(|d| d.to_string())
            .unwrap_or_default(),
        s.last_exposed_url.clone().unwrap_or_default(),
        s.top_cafe
            .as_ref()
            .map(|top| format!("#{} {}", top.position, top.url))
            .unwrap_or_default(),
    ]
}

/// Not-exposed keywords (ranked) then partially exposed ones, per summary.
///
/// Output starts with a UTF-8 BOM.
pub fn attention_csv(config: &Config, summaries: &[RunSummary], now: DateTime<Utc>) -> String {
    let header: Vec<String> = HEADER.iter().map(|h| h.to_string()).collect();
    let rows: Vec<Vec<String>> = summaries
        .iter()
        .flat_map(|summary| {
            summary
                .not_exposed
                .iter()
                .map(|s| row(config, "not_exposed", s, now))
                .chain(
                    summary
                        .partially_exposed
                        .iter()
                        .map(|s| row(config, "partially_exposed", s, now)),
                )
        })
        .collect();
    to_csv_string(&header, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, TopCafeHit};
    use crate::utils::csv::parse_rows;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_attention_rows() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let lost = KeywordStatus {
            category: Category::from("cream"),
            keyword: "갱년기, 크림".into(),
            priority: "상".into(),
            exposed_count: 0,
            total_count: 1,
            last_exposed_at: Some(now - Duration::days(3)),
            last_exposed_url: Some("https://cafe.example.com/x/1".into()),
            top_cafe: Some(TopCafeHit {
                position: 4,
                url: "https://cafe.example.com/mom/3".into(),
                cafe_id: "mom".into(),
                cafe_name: "맘카페".into(),
            }),
        };
        let partial = KeywordStatus {
            keyword: "크림 추천".into(),
            exposed_count: 1,
            total_count: 2,
            last_exposed_at: None,
            last_exposed_url: None,
            top_cafe: None,
            ..lost.clone()
        };
        let summary = RunSummary {
            scope: "cream".into(),
            timestamp: now,
            total_keywords: 2,
            exposed: Vec::new(),
            partially_exposed: vec![partial],
            not_exposed: vec![lost],
            no_url: Vec::new(),
            exposure_rate: 0,
            publish_rate: 100.0,
        };

        let text = attention_csv(&Config::default(), &[summary], now);
        assert!(text.starts_with('\u{feff}'));
        let rows = parse_rows(&text);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][0], "갱년기 카테고리");
        assert_eq!(rows[1][1], "갱년기, 크림");
        assert_eq!(rows[1][6], "3");
        assert_eq!(rows[2][3], "partially_exposed");
        assert_eq!(rows[2][6], "");
        assert_eq!(rows[1][8], "#4 https://cafe.example.com/mom/3");
        assert_eq!(rows[2][8], "");
    }
}
