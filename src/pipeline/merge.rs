//! History merge between the previous run's records and fresh verdicts.
//!
//! The one invariant that matters here: `last_exposed_at` only ever moves
//! forward. It is set to `now` on an `exposed` verdict and carried over
//! unchanged otherwise, so "how long has this post been missing" survives
//! any number of runs without archiving old scrapes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ExposureRecord, ExposureVerdict, KeywordTarget, RecordKey, TopCafeHit};
use crate::utils::url::normalize;

/// Merge one verdict into the prior record for the same key.
pub fn merge(
    prior: Option<&ExposureRecord>,
    target: &KeywordTarget,
    verdict: ExposureVerdict,
    now: DateTime<Utc>,
) -> ExposureRecord {
    let last_exposed_at = if verdict.is_exposed() {
        Some(now)
    } else {
        prior.and_then(|p| p.last_exposed_at)
    };

    ExposureRecord {
        category: target.category.clone(),
        keyword: target.keyword.clone(),
        target_url: target.target_url.trim().to_string(),
        normalized_url: normalize(target.target_url.trim()),
        last_verdict: verdict,
        last_exposed_at,
        last_checked_at: now,
        last_position: None,
        top_cafe: None,
    }
}

/// Collapse records sharing a key into the most recently checked one.
///
/// A target moved between categories can leave an older copy behind; the
/// survivor still keeps the latest exposure of either copy.
pub fn latest_by_key(
    records: impl IntoIterator<Item = ExposureRecord>,
) -> HashMap<RecordKey, ExposureRecord> {
    let mut index: HashMap<RecordKey, ExposureRecord> = HashMap::new();
    for record in records {
        let key = record.key();
        match index.remove(&key) {
            None => {
                index.insert(key, record);
            }
            Some(existing) => {
                let exposed_at = existing.last_exposed_at.max(record.last_exposed_at);
                let mut newest = if record.last_checked_at > existing.last_checked_at {
                    record
                } else {
                    existing
                };
                newest.last_exposed_at = exposed_at;
                index.insert(key, newest);
            }
        }
    }
    index
}

/// Record key for a target.
pub fn key_for(target: &KeywordTarget) -> RecordKey {
    RecordKey::new(&target.keyword, normalize(target.target_url.trim()))
}

/// Counts of notable transitions in one merge pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Keys seen for the first time
    pub first_seen: usize,
    /// Exposed now, not exposed on the prior run
    pub gained: usize,
    /// Exposed on the prior run, not exposed now
    pub lost: usize,
    /// Newly classified as deleted
    pub deleted: usize,
    /// Records merged this run
    pub merged: usize,
}

impl MergeReport {
    pub fn has_changes(&self) -> bool {
        self.gained + self.lost + self.deleted > 0
    }
}

/// Applies verdicts against an index of prior records keyed by normalized URL.
#[derive(Debug, Default)]
pub struct HistoryMerger {
    prior: HashMap<RecordKey, ExposureRecord>,
    merged: HashMap<RecordKey, ExposureRecord>,
    report: MergeReport,
}

impl HistoryMerger {
    /// Index prior records; duplicate keys collapse via [`latest_by_key`].
    pub fn new(prior: Vec<ExposureRecord>) -> Self {
        Self {
            prior: latest_by_key(prior),
            merged: HashMap::new(),
            report: MergeReport::default(),
        }
    }

    /// Prior record for a target, looked up by normalized URL.
    pub fn prior(&self, target: &KeywordTarget) -> Option<&ExposureRecord> {
        self.prior.get(&key_for(target))
    }

    /// Merge a verdict for a target and keep the result for [`finish`](Self::finish).
    ///
    /// `no_url` verdicts are not tracked and return `None`.
    pub fn apply(
        &mut self,
        target: &KeywordTarget,
        verdict: ExposureVerdict,
        position: Option<u32>,
        now: DateTime<Utc>,
    ) -> Option<&ExposureRecord> {
        if verdict == ExposureVerdict::NoUrl {
            return None;
        }

        let key = key_for(target);
        let prior = self.merged.get(&key).or_else(|| self.prior.get(&key));

        match prior {
            None => self.report.first_seen += 1,
            Some(p) => {
                let was_exposed = p.last_verdict.is_exposed();
                if verdict.is_exposed() && !was_exposed {
                    self.report.gained += 1;
                }
                if !verdict.is_exposed() && was_exposed {
                    self.report.lost += 1;
                }
                if verdict == ExposureVerdict::Deleted && p.last_verdict != ExposureVerdict::Deleted
                {
                    self.report.deleted += 1;
                }
            }
        }
        if prior.is_none() && verdict == ExposureVerdict::Deleted {
            self.report.deleted += 1;
        }

        let mut record = merge(prior, target, verdict, now);
        record.last_position = if verdict.is_exposed() { position } else { None };
        self.report.merged += 1;

        self.merged.insert(key.clone(), record);
        self.merged.get(&key)
    }

    /// Attach the keyword's best-ranked own-cafe result to a target merged
    /// this run. Targets not merged this run are left alone.
    pub fn mark_top_cafe(&mut self, target: &KeywordTarget, hit: Option<&TopCafeHit>) {
        if let Some(record) = self.merged.get_mut(&key_for(target)) {
            record.top_cafe = hit.cloned();
        }
    }

    pub fn report(&self) -> &MergeReport {
        &self.report
    }

    /// All records to persist: merged ones plus untouched prior ones.
    ///
    /// Sorted by category, keyword, then URL so saved files are stable.
    pub fn finish(self) -> (Vec<ExposureRecord>, MergeReport) {
        let Self {
            prior,
            mut merged,
            report,
        } = self;

        for (key, record) in prior {
            merged.entry(key).or_insert(record);
        }

        let mut records: Vec<ExposureRecord> = merged.into_values().collect();
        records.sort_by(|a, b| {
            (&a.category, &a.keyword, &a.normalized_url).cmp(&(
                &b.category,
                &b.keyword,
                &b.normalized_url,
            ))
        });
        (records, report)
    }
}
