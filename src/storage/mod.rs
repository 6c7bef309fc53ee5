//! Persistence of keyword targets and exposure history.
//!
//! Two backends convert their own representation into the canonical
//! `KeywordTarget` / `ExposureRecord` shapes:
//!
//! ```text
//! storage/                  # LocalStorage
//! ├── config.toml
//! ├── targets.json          # configured keyword targets
//! ├── records.json          # exposure history, all categories
//! └── reports/              # rendered CSV / HTML reports
//! ```
//!
//! `SheetStorage` reads and writes a CSV export of the monitoring sheet.

pub mod local;
pub mod sheet;

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::{ExposureRecord, KeywordTarget, Scope};

pub use local::LocalStorage;
pub use sheet::SheetStorage;

/// Metadata about a storage write operation.
#[derive(Debug, Clone)]
pub struct WriteMetadata {
    /// Records written
    pub record_count: usize,
    /// Files (or sheet exports) rewritten
    pub files_written: usize,
    pub timestamp: DateTime<Utc>,
}

/// On-disk envelope for the stored records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordFile {
    pub updated_at: DateTime<Utc>,
    pub count: usize,
    pub records: Vec<ExposureRecord>,
}

impl RecordFile {
    pub fn new(records: Vec<ExposureRecord>) -> Self {
        Self {
            updated_at: Utc::now(),
            count: records.len(),
            records,
        }
    }
}

/// Source of truth for targets and prior exposure state.
///
/// Every failure is reported as `AppError::Persistence` and is fatal for the
/// run that hit it.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Configured targets within `scope`, in configuration order.
    async fn load_targets(&self, scope: &Scope) -> Result<Vec<KeywordTarget>>;

    /// Prior exposure records within `scope`.
    async fn load_records(&self, scope: &Scope) -> Result<Vec<ExposureRecord>>;

    /// Replace the stored records for `scope` with `records` as one batch.
    ///
    /// A record in the batch also supersedes a stored copy of the same key
    /// filed under another category.
    async fn save_records(&self, scope: &Scope, records: &[ExposureRecord])
    -> Result<WriteMetadata>;
}

/// Write bytes atomically (write to temp, then rename).
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
