// src/services/volume.rs

//! Search volume loaded from a local JSON file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::DailyPoint;
use crate::services::SearchVolumeSource;

/// Reads `{ "<keyword>": [{ "date": "YYYY-MM-DD", "value": n }, ...] }`.
///
/// A missing file or keyword yields an empty series.
pub struct FileVolumeSource {
    path: PathBuf,
}

impl FileVolumeSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    async fn load(&self) -> Result<HashMap<String, Vec<DailyPoint>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Volume file not found: {}", self.path.display());
                Ok(HashMap::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SearchVolumeSource for FileVolumeSource {
    async fn fetch_daily(
        &self,
        keyword: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyPoint>> {
        let mut all = self.load().await?;
        let mut points: Vec<DailyPoint> = all
            .remove(keyword)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| start <= p.date && p.date <= end)
            .collect();
        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[tokio::test]
    async fn test_filters_range_and_sorts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("volumes.json");
        std::fs::write(
            &path,
            r#"{"비타민": [
                {"date": "2026-03-05", "value": 30},
                {"date": "2026-03-01", "value": 10},
                {"date": "2026-03-03", "value": 20}
            ]}"#,
        )
        .unwrap();

        let source = FileVolumeSource::new(&path);
        let points = source.fetch_daily("비타민", date(2), date(5)).await.unwrap();
        assert_eq!(
            points,
            vec![DailyPoint::new(date(3), 20), DailyPoint::new(date(5), 30)]
        );
        assert!(source.fetch_daily("unknown", date(1), date(9)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let source = FileVolumeSource::new(dir.path().join("none.json"));
        assert!(source.fetch_daily("k", date(1), date(2)).await.unwrap().is_empty());
    }
}
