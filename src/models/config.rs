//! Application configuration structures.

use std::fs;
use std::path::Path;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Category, KeywordTarget};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Batch run behavior
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Search and deletion probe HTTP settings
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Periodic job timers
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Report output settings
    #[serde(default)]
    pub report: ReportConfig,

    /// Category definitions
    #[serde(default = "defaults::categories")]
    pub categories: Vec<CategoryInfo>,

    /// Our own cafes, tracked for the best-ranked cafe result per keyword
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cafes: Vec<CafeInfo>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.monitor.request_delay_min_ms > self.monitor.request_delay_max_ms {
            return Err(AppError::validation(
                "monitor.request_delay_min_ms must not exceed request_delay_max_ms",
            ));
        }
        if self.scraper.user_agents.iter().all(|ua| ua.trim().is_empty()) {
            return Err(AppError::validation("scraper.user_agents is empty"));
        }
        if self.scraper.timeout_secs == 0 {
            return Err(AppError::validation("scraper.timeout_secs must be > 0"));
        }
        if self.scraper.result_selector.trim().is_empty() {
            return Err(AppError::validation("scraper.result_selector is empty"));
        }
        if self.schedule.monitor_interval_hours == 0 {
            return Err(AppError::validation(
                "schedule.monitor_interval_hours must be > 0",
            ));
        }
        self.schedule.report_times()?;
        if self.categories.is_empty() {
            return Err(AppError::validation("No categories defined"));
        }
        Ok(())
    }

    /// Human-readable name of a category, falling back to its id.
    pub fn display_name<'a>(&'a self, category: &'a Category) -> &'a str {
        self.categories
            .iter()
            .find(|c| c.id == category.as_str())
            .map(|c| c.display_name.as_str())
            .unwrap_or_else(|| category.as_str())
    }

    /// Configured cafes plus every distinct `cafe` value of `targets`.
    ///
    /// Ids compare case-insensitively; the configured entry wins.
    pub fn cafe_list(&self, targets: &[KeywordTarget]) -> Vec<CafeInfo> {
        let mut cafes: Vec<CafeInfo> = Vec::new();
        let configured = self.cafes.iter().cloned();
        let from_targets = targets
            .iter()
            .map(|t| t.cafe.trim())
            .filter(|c| !c.is_empty())
            .map(|c| CafeInfo {
                id: c.to_string(),
                name: String::new(),
            });

        for cafe in configured.chain(from_targets) {
            if cafe.id.trim().is_empty()
                || cafes.iter().any(|c| c.id.eq_ignore_ascii_case(cafe.id.trim()))
            {
                continue;
            }
            cafes.push(cafe);
        }
        cafes
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            scraper: ScraperConfig::default(),
            schedule: ScheduleConfig::default(),
            report: ReportConfig::default(),
            categories: defaults::categories(),
            cafes: Vec::new(),
        }
    }
}

/// What to do when the deletion probe cannot decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionPolicy {
    /// Fall through to the URL match
    #[default]
    AssumeAlive,
    /// Classify the target as deleted
    AssumeDeleted,
    /// Leave the target's record untouched this run
    Skip,
}

/// Batch run behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Lower bound of the random pause between external calls
    #[serde(default = "defaults::request_delay_min")]
    pub request_delay_min_ms: u64,

    /// Upper bound of the random pause between external calls
    #[serde(default = "defaults::request_delay_max")]
    pub request_delay_max_ms: u64,

    /// Policy for inconclusive deletion probes
    #[serde(default)]
    pub inconclusive_deletion: DeletionPolicy,

    /// Probe targets again even if they were deleted last run
    #[serde(default)]
    pub recheck_deleted: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            request_delay_min_ms: defaults::request_delay_min(),
            request_delay_max_ms: defaults::request_delay_max(),
            inconclusive_deletion: DeletionPolicy::default(),
            recheck_deleted: false,
        }
    }
}

/// HTTP settings for the search and deletion collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// User-Agent pool; one is picked at random per request
    #[serde(default = "defaults::user_agents")]
    pub user_agents: Vec<String>,

    /// Search endpoint receiving `query` and `start`
    #[serde(default = "defaults::search_url")]
    pub search_url: String,

    /// CSS selector for main result links
    #[serde(default = "defaults::result_selector")]
    pub result_selector: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Page texts that mean a post was removed
    #[serde(default = "defaults::deleted_markers")]
    pub deleted_markers: Vec<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agents: defaults::user_agents(),
            search_url: defaults::search_url(),
            result_selector: defaults::result_selector(),
            timeout_secs: defaults::timeout(),
            deleted_markers: defaults::deleted_markers(),
        }
    }
}

/// Periodic job settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Hours between monitor runs
    #[serde(default = "defaults::monitor_interval")]
    pub monitor_interval_hours: u64,

    /// Local `HH:MM` times for the daily report job
    #[serde(default = "defaults::report_times")]
    pub report_times: Vec<String>,
}

impl ScheduleConfig {
    /// Parse `report_times` into times of day.
    pub fn report_times(&self) -> Result<Vec<NaiveTime>> {
        self.report_times
            .iter()
            .map(|s| {
                NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|e| {
                    AppError::validation(format!("schedule.report_times '{s}': {e}"))
                })
            })
            .collect()
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            monitor_interval_hours: defaults::monitor_interval(),
            report_times: defaults::report_times(),
        }
    }
}

/// Report output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory (relative to storage) for CSV and HTML output
    #[serde(default = "defaults::output_dir")]
    pub output_dir: String,

    /// Window for the "recently published but not exposed" section
    #[serde(default = "defaults::recent_days")]
    pub recent_days: i64,

    /// Link shown in the HTML footer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: defaults::output_dir(),
            recent_days: defaults::recent_days(),
            dashboard_url: None,
        }
    }
}

/// A category id and its display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub id: String,
    pub display_name: String,
}

/// One of our own cafes: the id is the first path segment of its URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CafeInfo {
    pub id: String,
    /// Shown in reports; falls back to the id
    #[serde(default)]
    pub name: String,
}

impl CafeInfo {
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

mod defaults {
    use super::CategoryInfo;

    // Monitor defaults
    pub fn request_delay_min() -> u64 {
        500
    }
    pub fn request_delay_max() -> u64 {
        1500
    }

    // Scraper defaults
    pub fn user_agents() -> Vec<String> {
        vec![
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".into(),
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".into(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_2) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15".into(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0".into(),
        ]
    }
    pub fn search_url() -> String {
        "https://search.naver.com/search.naver".into()
    }
    pub fn result_selector() -> String {
        r#"a[data-heatmap-target=".link"]"#.into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn deleted_markers() -> Vec<String> {
        vec![
            "삭제되었거나 존재하지 않는 게시글".into(),
            "존재하지 않는 게시물".into(),
            "삭제된 게시글".into(),
            "비공개 처리된 게시글".into(),
        ]
    }

    // Schedule defaults
    pub fn monitor_interval() -> u64 {
        2
    }
    pub fn report_times() -> Vec<String> {
        vec!["10:10".into(), "12:30".into()]
    }

    // Report defaults
    pub fn output_dir() -> String {
        "reports".into()
    }
    pub fn recent_days() -> i64 {
        7
    }

    // Category defaults
    pub fn categories() -> Vec<CategoryInfo> {
        vec![
            CategoryInfo {
                id: "cancer".to_string(),
                display_name: "암 카테고리".to_string(),
            },
            CategoryInfo {
                id: "diabetes".to_string(),
                display_name: "당뇨 카테고리".to_string(),
            },
            CategoryInfo {
                id: "cream".to_string(),
                display_name: "갱년기 카테고리".to_string(),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_inverted_delay() {
        let mut config = Config::default();
        config.monitor.request_delay_min_ms = 2000;
        config.monitor.request_delay_max_ms = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_report_time() {
        let mut config = Config::default();
        config.schedule.report_times = vec!["25:99".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_user_agents() {
        let mut config = Config::default();
        config.scraper.user_agents = vec!["  ".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [monitor]
            inconclusive_deletion = "skip"

            [[categories]]
            id = "cream"
            display_name = "Cream"
            "#,
        )
        .unwrap();
        assert_eq!(config.monitor.inconclusive_deletion, DeletionPolicy::Skip);
        assert_eq!(config.monitor.request_delay_max_ms, 1500);
        assert_eq!(config.categories.len(), 1);
        assert_eq!(config.schedule.report_times().unwrap().len(), 2);
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let text = Config::default().to_toml().unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.categories.len(), 3);
        assert_eq!(back.scraper.result_selector, Config::default().scraper.result_selector);
    }

    #[test]
    fn cafe_list_merges_config_and_targets() {
        let mut config = Config::default();
        config.cafes = vec![CafeInfo {
            id: "momcafe".into(),
            name: "맘카페".into(),
        }];
        let target = |cafe: &str| KeywordTarget {
            category: Category::from("cream"),
            keyword: "k".into(),
            target_url: String::new(),
            priority: String::new(),
            row_reference: String::new(),
            published_at: None,
            author_id: String::new(),
            cafe: cafe.into(),
        };
        let targets = [target("MomCafe"), target("health"), target(""), target("health")];

        let cafes = config.cafe_list(&targets);
        assert_eq!(cafes.len(), 2);
        assert_eq!(cafes[0].display_name(), "맘카페");
        assert_eq!(cafes[1].id, "health");
        assert_eq!(cafes[1].display_name(), "health");
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let config = Config::default();
        assert_eq!(config.display_name(&Category::from("cream")), "갱년기 카테고리");
        assert_eq!(config.display_name(&Category::from("other")), "other");
    }
}
