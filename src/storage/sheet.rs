// src/storage/sheet.rs

//! Adapter for a CSV export of the monitoring spreadsheet.
//!
//! Each data row is one keyword target. The same row carries the latest
//! verdict (`노출`, `삭제` as `O`/`X`), the last check time (`순찰시간`) and
//! the last exposure time (`최종노출`). Saving rewrites those cells in place,
//! plus the keyword's best-ranked own-cafe result (`최상단 카페 URL`, written
//! as `#3 https://...`), and leaves every other column alone.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::error::{AppError, Result};
use crate::models::{
    Category, ExposureRecord, ExposureVerdict, KeywordTarget, RecordKey, Scope, TopCafeHit,
};
use crate::storage::{RecordStore, WriteMetadata, write_atomic};
use crate::utils::csv::{parse_rows, to_csv_string};
use crate::utils::url::{cafe_id, normalize};

pub const COL_CATEGORY: &str = "카테고리";
pub const COL_CAFE: &str = "카페";
pub const COL_KEYWORD: &str = "키워드";
pub const COL_URL: &str = "url";
pub const COL_DELETED: &str = "삭제";
pub const COL_EXPOSED: &str = "노출";
pub const COL_PRIORITY: &str = "우선순위";
pub const COL_PUBLISHED: &str = "발행시간";
pub const COL_CHECKED: &str = "순찰시간";
pub const COL_LAST_EXPOSED: &str = "최종노출";
pub const COL_AUTHOR: &str = "발행아이디";
pub const COL_TOP_CAFE: &str = "최상단 카페 URL";

/// Full header row, in sheet order.
pub const HEADERS: [&str; 12] = [
    COL_CATEGORY,
    COL_CAFE,
    COL_KEYWORD,
    COL_URL,
    COL_DELETED,
    COL_EXPOSED,
    COL_PRIORITY,
    COL_PUBLISHED,
    COL_CHECKED,
    COL_LAST_EXPOSED,
    COL_AUTHOR,
    COL_TOP_CAFE,
];

const MARK_YES: &str = "O";
const MARK_NO: &str = "X";

/// Parsed sheet: header plus data rows.
struct Sheet {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    columns: HashMap<String, usize>,
}

impl Sheet {
    fn parse(text: &str) -> Self {
        let mut rows = parse_rows(text);
        let header = if rows.is_empty() {
            Vec::new()
        } else {
            rows.remove(0)
        };
        let columns = header
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();
        Self {
            header,
            rows,
            columns,
        }
    }

    fn require(&self, name: &str) -> std::result::Result<usize, String> {
        self.columns
            .get(name)
            .copied()
            .ok_or_else(|| format!("missing required column '{name}'"))
    }

    fn cell<'a>(&self, row: &'a [String], name: &str) -> &'a str {
        self.columns
            .get(name)
            .and_then(|&i| row.get(i))
            .map(|s| s.trim())
            .unwrap_or("")
    }

    /// Column index, appending the column when absent.
    fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(&i) = self.columns.get(name) {
            return i;
        }
        self.header.push(name.to_string());
        let i = self.header.len() - 1;
        self.columns.insert(name.to_string(), i);
        i
    }

    fn set(row: &mut Vec<String>, index: usize, value: String) {
        if row.len() <= index {
            row.resize(index + 1, String::new());
        }
        row[index] = value;
    }
}

/// Sheet format for timestamps written back; parses back to the same instant.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Accepts RFC 3339 or the sheet's local `YYYY-MM-DD HH:MM[:SS]` spelling.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y.%m.%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).single())
        .map(|ts| ts.with_timezone(&Utc))
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let head = s.split_whitespace().next()?;
    ["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(head.trim_end_matches('.'), fmt).ok())
}

fn format_top_cafe(hit: &TopCafeHit) -> String {
    format!("#{} {}", hit.position, hit.url)
}

/// Reads `#N url` back; the cafe name is not in the cell, so the id stands in.
fn parse_top_cafe(s: &str) -> Option<TopCafeHit> {
    let (rank, url) = s.strip_prefix('#')?.split_once(char::is_whitespace)?;
    let url = url.trim();
    let id = cafe_id(url)?;
    Some(TopCafeHit {
        position: rank.parse().ok()?,
        url: url.to_string(),
        cafe_name: id.clone(),
        cafe_id: id,
    })
}

fn verdict_from_marks(deleted: &str, exposed: &str) -> Option<ExposureVerdict> {
    if deleted.eq_ignore_ascii_case(MARK_YES) {
        Some(ExposureVerdict::Deleted)
    } else if exposed.eq_ignore_ascii_case(MARK_YES) {
        Some(ExposureVerdict::Exposed)
    } else if exposed.eq_ignore_ascii_case(MARK_NO) {
        Some(ExposureVerdict::NotExposed)
    } else {
        None
    }
}

/// Spreadsheet-backed store over a CSV export.
#[derive(Debug, Clone)]
pub struct SheetStorage {
    path: PathBuf,
    default_category: Category,
}

impl SheetStorage {
    /// `default_category` applies to rows without a `카테고리` value.
    pub fn new(path: impl AsRef<Path>, default_category: Category) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            default_category,
        }
    }

    fn context(&self) -> String {
        self.path.display().to_string()
    }

    /// Write an empty sheet with the full header row unless one exists.
    pub async fn create_template(&self) -> Result<bool> {
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(false);
        }
        let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
        write_atomic(&self.path, to_csv_string(&header, &[]).as_bytes()).await?;
        Ok(true)
    }

    async fn read_sheet(&self) -> Result<Sheet> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| AppError::persistence(self.context(), e))?;
        let sheet = Sheet::parse(&text);
        for required in [COL_KEYWORD, COL_URL] {
            sheet
                .require(required)
                .map_err(|e| AppError::persistence(self.context(), e))?;
        }
        Ok(sheet)
    }

    fn category_of(&self, sheet: &Sheet, row: &[String]) -> Category {
        match sheet.cell(row, COL_CATEGORY) {
            "" => self.default_category.clone(),
            c => Category::new(c),
        }
    }

    /// Data rows as targets, with their sheet row number (1-based, header is 1).
    fn targets_of(&self, sheet: &Sheet) -> Vec<KeywordTarget> {
        sheet
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !sheet.cell(row, COL_KEYWORD).is_empty())
            .map(|(i, row)| KeywordTarget {
                category: self.category_of(sheet, row),
                keyword: sheet.cell(row, COL_KEYWORD).to_string(),
                target_url: sheet.cell(row, COL_URL).to_string(),
                priority: sheet.cell(row, COL_PRIORITY).to_string(),
                row_reference: (i + 2).to_string(),
                published_at: parse_date(sheet.cell(row, COL_PUBLISHED)),
                author_id: sheet.cell(row, COL_AUTHOR).to_string(),
                cafe: sheet.cell(row, COL_CAFE).to_string(),
            })
            .collect()
    }
}

#[async_trait]
impl RecordStore for SheetStorage {
    async fn load_targets(&self, scope: &Scope) -> Result<Vec<KeywordTarget>> {
        let sheet = self.read_sheet().await?;
        Ok(self
            .targets_of(&sheet)
            .into_iter()
            .filter(|t| scope.contains(&t.category))
            .collect())
    }

    async fn load_records(&self, scope: &Scope) -> Result<Vec<ExposureRecord>> {
        let sheet = self.read_sheet().await?;
        let mut records = Vec::new();

        for (target, row) in self.targets_of(&sheet).into_iter().zip(
            sheet
                .rows
                .iter()
                .filter(|row| !sheet.cell(row, COL_KEYWORD).is_empty()),
        ) {
            if !scope.contains(&target.category) || !target.has_url() {
                continue;
            }
            let Some(checked) = parse_timestamp(sheet.cell(row, COL_CHECKED)) else {
                continue;
            };
            let Some(verdict) =
                verdict_from_marks(sheet.cell(row, COL_DELETED), sheet.cell(row, COL_EXPOSED))
            else {
                continue;
            };

            records.push(ExposureRecord {
                normalized_url: normalize(target.target_url.trim()),
                category: target.category,
                keyword: target.keyword,
                target_url: target.target_url,
                last_verdict: verdict,
                last_exposed_at: parse_timestamp(sheet.cell(row, COL_LAST_EXPOSED)),
                last_checked_at: checked,
                last_position: None,
                top_cafe: parse_top_cafe(sheet.cell(row, COL_TOP_CAFE)),
            });
        }
        Ok(records)
    }

    async fn save_records(
        &self,
        scope: &Scope,
        records: &[ExposureRecord],
    ) -> Result<WriteMetadata> {
        let mut sheet = self.read_sheet().await?;
        let by_key: HashMap<(Category, RecordKey), &ExposureRecord> = records
            .iter()
            .filter(|r| scope.contains(&r.category))
            .map(|r| ((r.category.clone(), r.key()), r))
            .collect();

        let deleted_col = sheet.ensure_column(COL_DELETED);
        let exposed_col = sheet.ensure_column(COL_EXPOSED);
        let checked_col = sheet.ensure_column(COL_CHECKED);
        let last_col = sheet.ensure_column(COL_LAST_EXPOSED);
        let top_cafe_col = sheet.ensure_column(COL_TOP_CAFE);

        let mut updates = Vec::new();
        for (i, row) in sheet.rows.iter().enumerate() {
            let keyword = sheet.cell(row, COL_KEYWORD);
            let url = sheet.cell(row, COL_URL);
            if keyword.is_empty() || url.is_empty() {
                continue;
            }
            let key = (
                self.category_of(&sheet, row),
                RecordKey::new(keyword, normalize(url)),
            );
            if let Some(record) = by_key.get(&key) {
                updates.push((i, *record));
            }
        }

        for &(i, record) in &updates {
            let row = &mut sheet.rows[i];
            let (deleted, exposed) = match record.last_verdict {
                ExposureVerdict::Deleted => (MARK_YES, MARK_NO),
                ExposureVerdict::Exposed => (MARK_NO, MARK_YES),
                ExposureVerdict::NotExposed | ExposureVerdict::NoUrl => (MARK_NO, MARK_NO),
            };
            Sheet::set(row, deleted_col, deleted.to_string());
            Sheet::set(row, exposed_col, exposed.to_string());
            Sheet::set(row, checked_col, format_timestamp(record.last_checked_at));
            Sheet::set(
                row,
                last_col,
                record.last_exposed_at.map(format_timestamp).unwrap_or_default(),
            );
            Sheet::set(
                row,
                top_cafe_col,
                record.top_cafe.as_ref().map(format_top_cafe).unwrap_or_default(),
            );
        }

        let unmatched = by_key.len().saturating_sub(updates.len());
        if unmatched > 0 {
            log::debug!("{} records have no matching sheet row", unmatched);
        }

        let text = to_csv_string(&sheet.header, &sheet.rows);
        write_atomic(&self.path, text.as_bytes())
            .await
            .map_err(|e| AppError::persistence(self.context(), e))?;
        log::info!("Updated {} sheet rows in {}", updates.len(), self.context());

        Ok(WriteMetadata {
            record_count: updates.len(),
            files_written: 1,
            timestamp: Utc::now(),
        })
    }
}
