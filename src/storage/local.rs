//! Local filesystem storage.
//!
//! Targets live in `targets.json` and the whole exposure history in
//! `records.json`. A category-scoped save rewrites that one file with the
//! other categories' records carried over, so every save is a single atomic
//! replace.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{AppError, Result};
use crate::models::{ExposureRecord, KeywordTarget, RecordKey, Scope};
use crate::storage::{RecordFile, RecordStore, WriteMetadata, write_atomic};

const TARGETS_KEY: &str = "targets.json";
const RECORDS_KEY: &str = "records.json";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Write bytes atomically under `key`.
    pub async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        write_atomic(&self.path(key), bytes).await
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Every stored record, regardless of category.
    async fn stored_records(&self) -> Result<Vec<ExposureRecord>> {
        Ok(self
            .read_json::<RecordFile>(RECORDS_KEY)
            .await
            .map_err(|e| AppError::persistence(RECORDS_KEY, e))?
            .map(|f| f.records)
            .unwrap_or_default())
    }

    /// Replace `targets.json`.
    pub async fn save_targets(&self, targets: &[KeywordTarget]) -> Result<()> {
        self.write_json(TARGETS_KEY, targets)
            .await
            .map_err(|e| AppError::persistence(TARGETS_KEY, e))
    }
}

#[async_trait]
impl RecordStore for LocalStorage {
    async fn load_targets(&self, scope: &Scope) -> Result<Vec<KeywordTarget>> {
        let targets: Vec<KeywordTarget> = match self
            .read_json(TARGETS_KEY)
            .await
            .map_err(|e| AppError::persistence(TARGETS_KEY, e))?
        {
            Some(targets) => targets,
            None => {
                log::warn!("No {} found in {}", TARGETS_KEY, self.root_dir.display());
                Vec::new()
            }
        };

        Ok(targets
            .into_iter()
            .enumerate()
            .filter(|(_, t)| scope.contains(&t.category))
            .map(|(i, mut t)| {
                if t.row_reference.is_empty() {
                    t.row_reference = i.to_string();
                }
                t
            })
            .collect())
    }

    async fn load_records(&self, scope: &Scope) -> Result<Vec<ExposureRecord>> {
        let records: Vec<ExposureRecord> = self
            .stored_records()
            .await?
            .into_iter()
            .filter(|r| scope.contains(&r.category))
            .collect();
        log::debug!("Loaded {} records for {}", records.len(), scope.label());
        Ok(records)
    }

    async fn save_records(
        &self,
        scope: &Scope,
        records: &[ExposureRecord],
    ) -> Result<WriteMetadata> {
        let batch: Vec<ExposureRecord> = records
            .iter()
            .filter(|r| scope.contains(&r.category))
            .cloned()
            .collect();
        let record_count = batch.len();

        // Outside the scope, keep what is stored unless the batch now owns the key
        let mut all = match scope {
            Scope::All => Vec::new(),
            Scope::Category(_) => {
                let owned: HashSet<RecordKey> = batch.iter().map(|r| r.key()).collect();
                self.stored_records()
                    .await?
                    .into_iter()
                    .filter(|r| !scope.contains(&r.category) && !owned.contains(&r.key()))
                    .collect()
            }
        };
        all.extend(batch);
        all.sort_by(|a, b| {
            (&a.category, &a.keyword, &a.normalized_url).cmp(&(
                &b.category,
                &b.keyword,
                &b.normalized_url,
            ))
        });

        let file = RecordFile::new(all);
        self.write_json(RECORDS_KEY, &file)
            .await
            .map_err(|e| AppError::persistence(RECORDS_KEY, e))?;
        log::info!(
            "Saved {} records for {} ({} total) to {}",
            record_count,
            scope.label(),
            file.count,
            RECORDS_KEY
        );

        Ok(WriteMetadata {
            record_count,
            files_written: 1,
            timestamp: Utc::now(),
        })
    }
}
