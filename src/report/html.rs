// src/report/html.rs

//! Daily HTML summary (the body of the report mail).

use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::models::{Category, Config, ExposureVerdict, KeywordStatus, KeywordTarget, RunSummary};
use crate::report::{RateLevel, days_label, format_time};

const STYLE: &str = r#"
  body { font-family: 'Malgun Gothic', Arial, sans-serif; line-height: 1.6; color: #333; }
  .container { max-width: 800px; margin: 0 auto; padding: 20px; }
  h1 { color: #333366; }
  h2 { color: #666699; margin-top: 30px; border-bottom: 1px solid #ccc; padding-bottom: 5px; }
  .summary-card { border: 1px solid #ddd; border-radius: 8px; padding: 15px; margin-bottom: 20px; }
  .card-header { font-size: 18px; font-weight: bold; margin-bottom: 10px; }
  .stat-container { display: flex; gap: 10px; }
  .stat-box { flex: 1; text-align: center; padding: 10px; border-radius: 5px; }
  .success-box { background-color: rgba(0, 128, 0, 0.1); border: 1px solid rgba(0, 128, 0, 0.3); }
  .warning-box { background-color: rgba(255, 165, 0, 0.1); border: 1px solid rgba(255, 165, 0, 0.3); }
  .danger-box { background-color: rgba(255, 0, 0, 0.1); border: 1px solid rgba(255, 0, 0, 0.3); }
  .number { font-size: 24px; font-weight: bold; }
  .label { font-size: 14px; color: #666; }
  .success { color: green; }
  .warning { color: orange; }
  .danger { color: red; }
  table { border-collapse: collapse; width: 100%; }
  th, td { border: 1px solid #ddd; padding: 6px; text-align: left; font-size: 14px; }
  .footer { margin-top: 30px; font-size: 12px; color: #666; border-top: 1px solid #eee; padding-top: 10px; }
"#;

/// Inputs for one HTML report.
pub struct HtmlReport<'a> {
    pub config: &'a Config,
    pub per_category: &'a [RunSummary],
    pub overall: &'a RunSummary,
    /// Recently published targets that are not exposed
    pub recent_unexposed: &'a [(&'a KeywordTarget, ExposureVerdict)],
    pub now: DateTime<Utc>,
}

fn rate_span(rate: f64, text: &str) -> String {
    format!(
        r#"<span class="{}">{}</span>"#,
        RateLevel::of(rate).class(),
        encode_text(text)
    )
}

fn link(url: &str) -> String {
    format!(
        r#"<a href="{}">{}</a>"#,
        encode_double_quoted_attribute(url),
        encode_text(url)
    )
}

fn top_cafe_cell(s: &KeywordStatus) -> String {
    match &s.top_cafe {
        Some(top) => format!(
            r#"#{} <a href="{}">{}</a>"#,
            top.position,
            encode_double_quoted_attribute(&top.url),
            encode_text(&top.cafe_name)
        ),
        None => "-".to_string(),
    }
}

fn stat_boxes(out: &mut String, summary: &RunSummary) {
    let boxes = [
        ("success", summary.exposed.len(), "노출된 키워드"),
        ("warning", summary.partially_exposed.len(), "일부 노출 키워드"),
        ("danger", summary.not_exposed.len(), "노출되지 않은 키워드"),
        ("warning", summary.no_url.len(), "발행하지 않은 키워드"),
    ];
    out.push_str("<div class=\"stat-container\">\n");
    for (class, count, label) in boxes {
        out.push_str(&format!(
            "<div class=\"stat-box {class}-box\"><div class=\"number {class}\">{count}</div><div class=\"label\">{label}</div></div>\n"
        ));
    }
    out.push_str("</div>\n");
}

fn card(out: &mut String, title: &str, summary: &RunSummary) {
    out.push_str("<div class=\"summary-card\">\n");
    out.push_str(&format!(
        "<div class=\"card-header\">{}</div>\n",
        encode_text(title)
    ));
    stat_boxes(out, summary);
    let exposure = f64::from(summary.exposure_rate);
    out.push_str(&format!(
        "<p><strong>노출률:</strong> {} (발행한 키워드 중)</p>\n",
        rate_span(exposure, &format!("{}%", summary.exposure_rate))
    ));
    out.push_str(&format!(
        "<p><strong>발행률:</strong> {} (전체 키워드 중)</p>\n",
        rate_span(summary.publish_rate, &format!("{:.2}%", summary.publish_rate))
    ));
    out.push_str("</div>\n");
}

fn attention_table(out: &mut String, report: &HtmlReport<'_>) {
    let rows: Vec<_> = report
        .per_category
        .iter()
        .flat_map(|s| s.not_exposed.iter())
        .collect();

    out.push_str("<h2>미노출 키워드</h2>\n");
    if rows.is_empty() {
        out.push_str("<p>모든 발행 키워드가 노출 중입니다.</p>\n");
        return;
    }
    out.push_str(
        "<table><tr><th>카테고리</th><th>키워드</th><th>우선순위</th><th>최종노출</th><th>URL</th><th>최상단 카페</th></tr>\n",
    );
    for s in rows {
        let last = match s.last_exposed_at {
            Some(t) => format!("{} ({})", format_time(t), days_label(Some(t), report.now)),
            None => days_label(None, report.now),
        };
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            encode_text(report.config.display_name(&s.category)),
            encode_text(&s.keyword),
            encode_text(&s.priority),
            encode_text(&last),
            s.last_exposed_url.as_deref().map(link).unwrap_or_default(),
            top_cafe_cell(s)
        ));
    }
    out.push_str("</table>\n");
}

fn recent_table(out: &mut String, report: &HtmlReport<'_>) {
    let days = report.config.report.recent_days;
    out.push_str(&format!("<h2>최근 {days}일 발행 미노출</h2>\n"));
    if report.recent_unexposed.is_empty() {
        out.push_str("<p>해당 키워드가 없습니다.</p>\n");
        return;
    }
    out.push_str(
        "<table><tr><th>카테고리</th><th>키워드</th><th>발행일</th><th>상태</th><th>발행아이디</th><th>URL</th></tr>\n",
    );
    for (target, verdict) in report.recent_unexposed {
        let published = target
            .published_at
            .map(|d| d.to_string())
            .unwrap_or_default();
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            encode_text(report.config.display_name(&target.category)),
            encode_text(&target.keyword),
            published,
            verdict,
            encode_text(&target.author_id),
            link(target.target_url.trim())
        ));
    }
    out.push_str("</table>\n");
}

/// Render the full report document.
pub fn render_html(report: &HtmlReport<'_>) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!(
        "<style>{STYLE}</style>\n</head>\n<body>\n<div class=\"container\">\n"
    ));
    out.push_str("<h1>검색 노출 모니터링 일일 요약 리포트</h1>\n");
    out.push_str(&format!("<p>생성 시각: {}</p>\n", format_time(report.now)));

    out.push_str("<h2>카테고리별 요약</h2>\n");
    for summary in report.per_category {
        let category = Category::new(summary.scope.clone());
        let title = format!(
            "{} ({})",
            report.config.display_name(&category),
            summary.scope.to_uppercase()
        );
        card(&mut out, &title, summary);
    }
    card(&mut out, "전체 요약", report.overall);

    attention_table(&mut out, report);
    recent_table(&mut out, report);

    out.push_str("<div class=\"footer\">\n");
    if let Some(url) = &report.config.report.dashboard_url {
        out.push_str(&format!("<p>대시보드: {}</p>\n", link(url)));
    }
    out.push_str("<p>이 리포트는 자동으로 생성되었습니다.</p>\n</div>\n");
    out.push_str("</div>\n</body>\n</html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TopCafeHit;
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn summary(scope: &str, exposure_rate: u8) -> RunSummary {
        RunSummary {
            scope: scope.into(),
            timestamp: now(),
            total_keywords: 1,
            exposed: Vec::new(),
            partially_exposed: Vec::new(),
            not_exposed: vec![KeywordStatus {
                category: Category::from(scope),
                keyword: "<script>kw</script>".into(),
                priority: String::new(),
                exposed_count: 0,
                total_count: 1,
                last_exposed_at: None,
                last_exposed_url: Some("https://cafe.example.com/x/1?a=1&b=2".into()),
                top_cafe: None,
            }],
            no_url: Vec::new(),
            exposure_rate,
            publish_rate: 100.0,
        }
    }

    #[test]
    fn test_cards_and_colors() {
        let config = Config::default();
        let per_category = vec![summary("cancer", 80), summary("cream", 10)];
        let overall = summary("all", 45);
        let html = render_html(&HtmlReport {
            config: &config,
            per_category: &per_category,
            overall: &overall,
            recent_unexposed: &[],
            now: now(),
        });

        assert!(html.contains("암 카테고리 (CANCER)"));
        assert!(html.contains(r#"<span class="success">80%</span>"#));
        assert!(html.contains(r#"<span class="danger">10%</span>"#));
        assert!(html.contains(r#"<span class="warning">45%</span>"#));
        assert!(html.contains("전체 요약"));
    }

    #[test]
    fn test_text_is_escaped() {
        let config = Config::default();
        let per_category = vec![summary("cancer", 0)];
        let html = render_html(&HtmlReport {
            config: &config,
            per_category: &per_category,
            overall: &per_category[0],
            recent_unexposed: &[],
            now: now(),
        });
        assert!(!html.contains("<script>kw"));
        assert!(html.contains("&lt;script&gt;kw"));
        assert!(html.contains("a=1&amp;b=2"));
    }

    #[test]
    fn test_recent_section_lists_targets() {
        let mut config = Config::default();
        config.report.dashboard_url = Some("https://dash.example.com".into());
        let target = KeywordTarget {
            category: Category::from("cream"),
            keyword: "크림".into(),
            target_url: "https://cafe.example.com/x/9".into(),
            priority: String::new(),
            row_reference: String::new(),
            published_at: NaiveDate::from_ymd_opt(2026, 3, 8),
            author_id: "writer2".into(),
            cafe: String::new(),
        };
        let recent = vec![(&target, ExposureVerdict::NotExposed)];
        let overall = summary("all", 0);
        let html = render_html(&HtmlReport {
            config: &config,
            per_category: &[],
            overall: &overall,
            recent_unexposed: &recent,
            now: now(),
        });
        assert!(html.contains("최근 7일 발행 미노출"));
        assert!(html.contains("2026-03-08"));
        assert!(html.contains("writer2"));
        assert!(html.contains("https://dash.example.com"));
    }

    #[test]
    fn test_attention_table_shows_top_cafe() {
        let config = Config::default();
        let mut cancer = summary("cancer", 0);
        cancer.not_exposed[0].top_cafe = Some(TopCafeHit {
            position: 2,
            url: "https://cafe.example.com/club/7".into(),
            cafe_id: "club".into(),
            cafe_name: "건강<카페>".into(),
        });
        let per_category = vec![cancer];
        let html = render_html(&HtmlReport {
            config: &config,
            per_category: &per_category,
            overall: &per_category[0],
            recent_unexposed: &[],
            now: now(),
        });
        assert!(html.contains("<th>최상단 카페</th>"));
        assert!(html.contains(r#"#2 <a href="https://cafe.example.com/club/7">건강&lt;카페&gt;</a>"#));
    }
}
