//! External collaborators consumed by the monitor.
//!
//! - `SearchProvider`: current result URLs for a keyword (`NaverSearch`)
//! - `DeletionProbe`: whether a post still exists (`HttpDeletionProbe`)
//! - `SearchVolumeSource`: daily search volume per keyword (`FileVolumeSource`)

mod deletion;
mod search;
mod volume;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::DailyPoint;

pub use deletion::HttpDeletionProbe;
pub use search::NaverSearch;
pub use volume::FileVolumeSource;

/// Source of ordered candidate result URLs for a keyword.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Fetch the main result URLs for `keyword`, in display order.
    async fn fetch_results(&self, keyword: &str) -> Result<Vec<String>>;
}

/// Checks whether a published post has been removed.
#[async_trait]
pub trait DeletionProbe: Send + Sync {
    /// `Some(true)` deleted, `Some(false)` alive, `None` inconclusive.
    async fn is_post_deleted(&self, url: &str) -> Option<bool>;
}

/// Daily search-volume time series.
#[async_trait]
pub trait SearchVolumeSource: Send + Sync {
    /// Daily points for `keyword` within `[start, end]`.
    async fn fetch_daily(
        &self,
        keyword: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyPoint>>;
}
