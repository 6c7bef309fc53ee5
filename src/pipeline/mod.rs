//! Exposure tracking engine and the jobs built on it.
//!
//! - `classify` / `merge` / `aggregate`: per-run core over targets and history
//! - `period`: week-over-week comparison windows
//! - `run_monitor`: fetch, classify, merge and save one batch
//! - `run_report` / `run_stats`: re-read state and render summaries
//! - `run_trend`: search volume comparison for one keyword
//! - `run_scheduler`: periodic host for the monitor and report jobs

pub mod aggregate;
pub mod classify;
pub mod merge;
pub mod monitor;
pub mod period;
pub mod report;
pub mod schedule;
pub mod trend;

pub use aggregate::{summarize, summarize_all, summarize_by_category};
pub use classify::{Classifier, classify, find_top_cafe};
pub use merge::{HistoryMerger, MergeReport, latest_by_key, merge};
pub use monitor::{MonitorOutcome, run_monitor};
pub use period::{compare_by_day, compute_periods, split_series};
pub use report::{ReportOptions, ReportOutcome, run_report, run_stats};
pub use schedule::run_scheduler;
pub use trend::{TrendOutcome, run_trend};
