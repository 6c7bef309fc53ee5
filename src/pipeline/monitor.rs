// src/pipeline/monitor.rs

//! One monitoring pass: fetch results per keyword, classify every target,
//! merge with history and save the batch.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Config, ExposureVerdict, KeywordTarget, RunSummary, Scope};
use crate::pipeline::aggregate::summarize;
use crate::pipeline::classify::{Classifier, find_top_cafe};
use crate::pipeline::merge::{HistoryMerger, MergeReport};
use crate::services::{DeletionProbe, SearchProvider};
use crate::storage::RecordStore;
use crate::utils::http::polite_delay;
use crate::utils::progress;
use crate::utils::url::find_position;

/// Counters and results of one monitor run.
#[derive(Debug, Clone)]
pub struct MonitorOutcome {
    pub scope: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Distinct keyword texts searched
    pub keywords_searched: usize,
    pub targets_checked: usize,
    /// Keywords whose result fetch failed and fell back to `not_exposed`
    pub fetch_failures: usize,
    pub probes_inconclusive: usize,
    /// Targets left untouched by the `skip` deletion policy
    pub skipped: usize,
    pub no_url: usize,
    pub merge: MergeReport,
    pub records_saved: usize,
    pub summary: RunSummary,
}

/// Targets sharing one keyword text, in first-seen order.
fn group_by_keyword(targets: &[KeywordTarget]) -> Vec<(&str, Vec<&KeywordTarget>)> {
    let mut groups: Vec<(&str, Vec<&KeywordTarget>)> = Vec::new();
    for target in targets {
        let keyword = target.keyword.trim();
        match groups.iter_mut().find(|(k, _)| *k == keyword) {
            Some((_, members)) => members.push(target),
            None => groups.push((keyword, vec![target])),
        }
    }
    groups
}

/// Spaces out external calls; the first call goes out immediately.
struct Pacer {
    min_ms: u64,
    max_ms: u64,
    calls: usize,
}

impl Pacer {
    async fn wait(&mut self) {
        if self.calls > 0 {
            polite_delay(self.min_ms, self.max_ms).await;
        }
        self.calls += 1;
    }
}

/// Run one monitoring pass over `scope`.
///
/// Loading or saving through `store` failing aborts the run before anything
/// is written. A failed result fetch only degrades that keyword.
///
/// History is looked up across every category, so a target moved into
/// `scope` from another category keeps its exposure history.
pub async fn run_monitor(
    config: &Config,
    store: &dyn RecordStore,
    search: &dyn SearchProvider,
    probe: &dyn DeletionProbe,
    scope: &Scope,
    now: DateTime<Utc>,
) -> Result<MonitorOutcome> {
    let started_at = Utc::now();
    progress::header(&format!("Exposure monitor ({})", scope.label()));

    progress::step(1, 3, "Loading targets and history");
    let targets = store.load_targets(scope).await?;
    let prior = store.load_records(&Scope::All).await?;
    progress::sub_item(&format!(
        "{} targets, {} prior records",
        targets.len(),
        prior.len()
    ));

    let classifier = Classifier::new(config.monitor.inconclusive_deletion);
    let cafes = config.cafe_list(&targets);
    let mut merger = HistoryMerger::new(prior);
    let mut pacer = Pacer {
        min_ms: config.monitor.request_delay_min_ms,
        max_ms: config.monitor.request_delay_max_ms,
        calls: 0,
    };

    let mut keywords_searched = 0;
    let mut targets_checked = 0;
    let mut fetch_failures = 0;
    let mut probes_inconclusive = 0;
    let mut skipped = 0;
    let mut no_url = 0;

    let groups = group_by_keyword(&targets);
    progress::step(2, 3, &format!("Checking {} keywords", groups.len()));

    for (keyword, members) in &groups {
        let (published, unpublished): (Vec<&KeywordTarget>, Vec<&KeywordTarget>) =
            members.iter().copied().partition(|t| t.has_url());
        no_url += unpublished.len();

        if published.is_empty() {
            log::debug!("'{}': nothing published, skipping search", keyword);
            continue;
        }

        pacer.wait().await;
        keywords_searched += 1;
        let results = match search.fetch_results(keyword).await {
            Ok(urls) => Some(urls),
            Err(e) => {
                log::warn!("'{}': {} (targets fall back to not_exposed)", keyword, e);
                fetch_failures += 1;
                None
            }
        };

        let top_cafe = results
            .as_deref()
            .and_then(|urls| find_top_cafe(urls, &cafes));
        if let Some(hit) = &top_cafe {
            log::debug!("'{}': top own cafe {} at #{}", keyword, hit.cafe_name, hit.position);
        }

        for target in published {
            targets_checked += 1;

            let Some(urls) = &results else {
                merger.apply(target, ExposureVerdict::NotExposed, None, now);
                continue;
            };

            let already_deleted = merger
                .prior(target)
                .is_some_and(|p| p.last_verdict == ExposureVerdict::Deleted);
            if already_deleted && !config.monitor.recheck_deleted {
                merger.apply(target, ExposureVerdict::Deleted, None, now);
                merger.mark_top_cafe(target, top_cafe.as_ref());
                continue;
            }

            pacer.wait().await;
            let deleted = probe.is_post_deleted(target.target_url.trim()).await;
            if deleted.is_none() {
                probes_inconclusive += 1;
                log::warn!("Deletion probe inconclusive for {}", target.target_url);
            }
            if classifier.skips(deleted) {
                skipped += 1;
                continue;
            }

            let verdict = classifier.classify(target, urls, deleted);
            let position =
                find_position(&target.target_url, urls).and_then(|p| u32::try_from(p).ok());
            if let Some(record) = merger.apply(target, verdict, position, now) {
                log::debug!(
                    "'{}' {} -> {}{}",
                    keyword,
                    record.normalized_url,
                    verdict,
                    position.map(|p| format!(" (#{p})")).unwrap_or_default()
                );
            }
            merger.mark_top_cafe(target, top_cafe.as_ref());
        }
    }

    progress::step(3, 3, "Saving history");
    let (records, merge) = merger.finish();
    let meta = store.save_records(scope, &records).await?;
    let summary = summarize(scope.label(), &records, &targets, now);

    let outcome = MonitorOutcome {
        scope: scope.label().to_string(),
        started_at,
        finished_at: Utc::now(),
        keywords_searched,
        targets_checked,
        fetch_failures,
        probes_inconclusive,
        skipped,
        no_url,
        merge,
        records_saved: meta.record_count,
        summary,
    };

    progress::summary(
        "Monitor run",
        &[
            ("Keywords searched", outcome.keywords_searched.to_string()),
            ("Targets checked", outcome.targets_checked.to_string()),
            ("Fetch failures", outcome.fetch_failures.to_string()),
            ("Inconclusive probes", outcome.probes_inconclusive.to_string()),
            ("Gained / lost", format!("{} / {}", outcome.merge.gained, outcome.merge.lost)),
            ("Exposure rate", format!("{}%", outcome.summary.exposure_rate)),
            ("Records saved", outcome.records_saved.to_string()),
        ],
    );

    Ok(outcome)
}
