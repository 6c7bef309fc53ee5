//! Exposure verdicts and the per-target history record persisted across runs.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Category;

/// Outcome of checking one target against one scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureVerdict {
    NoUrl,
    Deleted,
    Exposed,
    NotExposed,
}

impl ExposureVerdict {
    pub fn is_exposed(self) -> bool {
        self == ExposureVerdict::Exposed
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExposureVerdict::NoUrl => "no_url",
            ExposureVerdict::Deleted => "deleted",
            ExposureVerdict::Exposed => "exposed",
            ExposureVerdict::NotExposed => "not_exposed",
        }
    }
}

impl fmt::Display for ExposureVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookup key for history: keyword text plus normalized post URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub keyword: String,
    pub normalized_url: String,
}

impl RecordKey {
    pub fn new(keyword: impl Into<String>, normalized_url: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            normalized_url: normalized_url.into(),
        }
    }
}

/// Highest-ranked result belonging to one of our own cafes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopCafeHit {
    /// 1-based rank in the result list
    pub position: u32,
    pub url: String,
    pub cafe_id: String,
    pub cafe_name: String,
}

/// Persisted exposure history for one (keyword, post) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureRecord {
    pub category: Category,

    pub keyword: String,

    /// Most recent raw spelling of the post URL
    pub target_url: String,

    pub normalized_url: String,

    pub last_verdict: ExposureVerdict,

    /// Last instant the post was seen in results; never cleared once set
    pub last_exposed_at: Option<DateTime<Utc>>,

    pub last_checked_at: DateTime<Utc>,

    /// 1-based rank in the result list when last exposed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_position: Option<u32>,

    /// Our best-ranked cafe result for the keyword on the last check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_cafe: Option<TopCafeHit>,
}

impl ExposureRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.keyword, &self.normalized_url)
    }

    /// Whole days since the last exposure, `None` when there is no exposure on record.
    pub fn days_since_exposure(&self, now: DateTime<Utc>) -> Option<i64> {
        days_since(self.last_exposed_at, now)
    }
}

/// Floor of the elapsed days between `since` and `now`.
pub fn days_since(since: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
    since.map(|t| (now - t).num_days())
}
