// src/pipeline/report.rs

//! Report job: re-read persisted state, summarize and render.
//!
//! The job never reuses another job's in-memory results; every call loads
//! targets and records from the store again.

use std::path::PathBuf;

use chrono::{DateTime, Local, Utc};

use crate::error::Result;
use crate::models::{Category, Config, ExposureRecord, KeywordTarget, RunSummary, Scope};
use crate::pipeline::aggregate::{recent_unexposed, summarize, summarize_by_category};
use crate::report::{HtmlReport, attention_csv, render_html, render_stats, render_summary};
use crate::storage::{LocalStorage, RecordStore};
use crate::utils::progress;

/// Which files to write besides the console text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub csv: bool,
    pub html: bool,
}

/// Freshly loaded state and its summaries.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub targets: Vec<KeywordTarget>,
    pub records: Vec<ExposureRecord>,
    pub per_category: Vec<RunSummary>,
    pub overall: RunSummary,
}

/// Rendered report and the files written.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub snapshot: Snapshot,
    pub console: String,
    pub csv_path: Option<PathBuf>,
    pub html_path: Option<PathBuf>,
}

/// Load targets and records for `scope` and summarize them.
pub async fn load_snapshot(
    store: &dyn RecordStore,
    scope: &Scope,
    now: DateTime<Utc>,
) -> Result<Snapshot> {
    let targets = store.load_targets(scope).await?;
    let records = store.load_records(scope).await?;
    let per_category = summarize_by_category(&records, &targets, now);
    let overall = summarize(scope.label(), &records, &targets, now);
    Ok(Snapshot {
        targets,
        records,
        per_category,
        overall,
    })
}

/// Statistics table for `scope`.
pub async fn run_stats(
    config: &Config,
    store: &dyn RecordStore,
    scope: &Scope,
    now: DateTime<Utc>,
) -> Result<String> {
    let snapshot = load_snapshot(store, scope, now).await?;
    Ok(render_stats(config, &snapshot.per_category, &snapshot.overall))
}

/// Build the report for `scope` and write the requested files to `output`.
pub async fn run_report(
    config: &Config,
    store: &dyn RecordStore,
    output: &LocalStorage,
    scope: &Scope,
    options: ReportOptions,
    now: DateTime<Utc>,
) -> Result<ReportOutcome> {
    progress::header(&format!("Exposure report ({})", scope.label()));
    let snapshot = load_snapshot(store, scope, now).await?;

    let mut console = String::new();
    for summary in &snapshot.per_category {
        let category = Category::new(summary.scope.clone());
        console.push_str(&render_summary(summary, config.display_name(&category), now));
        console.push('\n');
    }
    if let Scope::All = scope {
        console.push_str(&render_summary(&snapshot.overall, "전체", now));
        console.push('\n');
    }
    console.push_str(&render_stats(config, &snapshot.per_category, &snapshot.overall));

    let stamp = now.with_timezone(&Local).format("%Y%m%d_%H%M").to_string();
    let mut csv_path = None;
    let mut html_path = None;

    if options.csv {
        let name = format!("attention_{}_{}.csv", scope.file_label(), stamp);
        let text = attention_csv(config, &snapshot.per_category, now);
        output.write_bytes(&name, text.as_bytes()).await?;
        progress::sub_item(&format!("CSV: {}", name));
        csv_path = Some(output.root().join(name));
    }

    if options.html {
        let recent = recent_unexposed(
            &snapshot.overall,
            &snapshot.targets,
            &snapshot.records,
            now,
            config.report.recent_days,
        );
        let html = render_html(&HtmlReport {
            config,
            per_category: &snapshot.per_category,
            overall: &snapshot.overall,
            recent_unexposed: &recent,
            now,
        });
        let name = format!("report_{}_{}.html", scope.file_label(), stamp);
        output.write_bytes(&name, html.as_bytes()).await?;
        progress::sub_item(&format!("HTML: {}", name));
        html_path = Some(output.root().join(name));
    }

    progress::summary(
        "Report",
        &[
            ("Keywords", snapshot.overall.total_keywords.to_string()),
            ("Exposure rate", format!("{}%", snapshot.overall.exposure_rate)),
            ("Publish rate", format!("{:.2}%", snapshot.overall.publish_rate)),
        ],
    );

    Ok(ReportOutcome {
        snapshot,
        console,
        csv_path,
        html_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExposureVerdict;
    use crate::pipeline::merge::merge;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn target(category: &str, keyword: &str, url: &str) -> KeywordTarget {
        KeywordTarget {
            category: Category::from(category),
            keyword: keyword.into(),
            target_url: url.into(),
            priority: String::new(),
            row_reference: String::new(),
            published_at: None,
            author_id: String::new(),
            cafe: String::new(),
        }
    }

    #[tokio::test]
    async fn test_report_rereads_store_and_writes_files() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path());
        let output = LocalStorage::new(tmp.path().join("reports"));
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 3, 0, 0).unwrap();

        let a = target("cancer", "a", "https://cafe.example.com/x/1");
        let b = target("cream", "b", "https://cafe.example.com/x/2");
        store.save_targets(&[a.clone(), b.clone()]).await.unwrap();
        store
            .save_records(
                &Scope::All,
                &[
                    merge(None, &a, ExposureVerdict::Exposed, now),
                    merge(None, &b, ExposureVerdict::NotExposed, now),
                ],
            )
            .await
            .unwrap();

        let outcome = run_report(
            &Config::default(),
            &store,
            &output,
            &Scope::All,
            ReportOptions {
                csv: true,
                html: true,
            },
            now,
        )
        .await
        .unwrap();

        assert_eq!(outcome.snapshot.per_category.len(), 2);
        assert_eq!(outcome.snapshot.overall.exposure_rate, 50);
        assert!(outcome.console.contains("갱년기 카테고리"));
        assert!(outcome.csv_path.unwrap().exists());
        let html = std::fs::read_to_string(outcome.html_path.unwrap()).unwrap();
        assert!(html.contains("전체 요약"));
    }

    #[tokio::test]
    async fn test_stats_on_empty_store() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path());
        let text = run_stats(&Config::default(), &store, &Scope::All, Utc::now())
            .await
            .unwrap();
        assert!(text.contains("all"));
    }

    #[tokio::test]
    async fn test_report_files_stay_in_output_dir() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path().join("state"));
        let output = LocalStorage::new(tmp.path().join("reports"));
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 3, 0, 0).unwrap();

        let a = target("../skin/care", "a", "https://cafe.example.com/x/1");
        store.save_targets(&[a.clone()]).await.unwrap();
        store
            .save_records(&Scope::All, &[merge(None, &a, ExposureVerdict::NotExposed, now)])
            .await
            .unwrap();

        let scope = Scope::Category(a.category.clone());
        let outcome = run_report(
            &Config::default(),
            &store,
            &output,
            &scope,
            ReportOptions {
                csv: true,
                html: true,
            },
            now,
        )
        .await
        .unwrap();

        for path in [outcome.csv_path.unwrap(), outcome.html_path.unwrap()] {
            assert!(path.exists());
            assert_eq!(path.parent(), Some(output.root()));
        }
        assert_eq!(outcome.snapshot.overall.not_exposed.len(), 1);
    }
}
