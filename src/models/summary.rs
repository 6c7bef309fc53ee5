//! Aggregated run summaries consumed by the report renderers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Category, TopCafeHit};

/// Bucket a keyword falls into for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Exposed,
    PartiallyExposed,
    NotExposed,
    NoUrl,
}

/// Per-keyword status line inside a summary bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordStatus {
    pub category: Category,
    pub keyword: String,
    pub priority: String,
    pub exposed_count: usize,
    pub total_count: usize,
    /// Most recent exposure across the keyword's URLs (`not_exposed` bucket only)
    pub last_exposed_at: Option<DateTime<Utc>>,
    /// URL that achieved `last_exposed_at`, or the first URL when none did
    pub last_exposed_url: Option<String>,
    /// Our best-ranked cafe result on the most recent check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_cafe: Option<TopCafeHit>,
}

/// Partition of one run's keywords plus derived rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Category id or `all`
    pub scope: String,
    pub timestamp: DateTime<Utc>,
    pub total_keywords: usize,
    pub exposed: Vec<KeywordStatus>,
    pub partially_exposed: Vec<KeywordStatus>,
    /// Ranked most-recently-lost first
    pub not_exposed: Vec<KeywordStatus>,
    pub no_url: Vec<KeywordStatus>,
    /// Integer percent of published keywords fully exposed
    pub exposure_rate: u8,
    /// Percent of keywords with a published URL, two decimals
    pub publish_rate: f64,
}

impl RunSummary {
    /// Keywords with at least one published URL.
    pub fn published_count(&self) -> usize {
        self.exposed.len() + self.partially_exposed.len() + self.not_exposed.len()
    }

    /// Which bucket holds a keyword, if any.
    pub fn bucket_of(&self, category: &Category, keyword: &str) -> Option<Bucket> {
        let hit = |list: &[KeywordStatus]| {
            list.iter()
                .any(|s| &s.category == category && s.keyword == keyword)
        };
        if hit(&self.exposed) {
            Some(Bucket::Exposed)
        } else if hit(&self.partially_exposed) {
            Some(Bucket::PartiallyExposed)
        } else if hit(&self.not_exposed) {
            Some(Bucket::NotExposed)
        } else if hit(&self.no_url) {
            Some(Bucket::NoUrl)
        } else {
            None
        }
    }
}
