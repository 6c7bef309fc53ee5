// src/models/mod.rs

//! Domain models for the exposure monitor.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod period;
mod record;
mod summary;
mod target;

// Re-export all public types
pub use config::{
    CafeInfo, CategoryInfo, Config, DeletionPolicy, MonitorConfig, ReportConfig, ScheduleConfig,
    ScraperConfig,
};
pub use period::{ComparisonPeriod, DailyPoint, DayComparison, Period, Trend};
pub use record::{ExposureRecord, ExposureVerdict, RecordKey, TopCafeHit, days_since};
pub use summary::{Bucket, KeywordStatus, RunSummary};
pub use target::{Category, KeywordTarget, Scope};
