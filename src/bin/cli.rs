//! Exposure Monitor CLI
//!
//! Local execution entry point for one-shot jobs and the long-running scheduler.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use exposure_monitor::{
    error::Result,
    models::{Category, Config, Scope},
    pipeline::{self, ReportOptions},
    report,
    services::{FileVolumeSource, HttpDeletionProbe, NaverSearch},
    storage::{LocalStorage, RecordStore, SheetStorage},
};

/// Search exposure monitor for published keyword posts
#[derive(Parser, Debug)]
#[command(
    name = "exposure-monitor",
    version,
    about = "Tracks whether published posts stay visible in search results"
)]
struct Cli {
    /// Path to storage directory containing config, targets and history
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Config file (default: {storage_dir}/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use a CSV export of the monitoring sheet instead of JSON storage
    #[arg(long)]
    sheet: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check every target once and save the merged history
    Monitor {
        /// Only this category id
        #[arg(long)]
        category: Option<String>,
    },

    /// Summarize stored history and render reports
    Report {
        /// Only this category id
        #[arg(long)]
        category: Option<String>,

        /// Write the needs-attention CSV
        #[arg(long)]
        csv: bool,

        /// Write the HTML summary
        #[arg(long)]
        html: bool,
    },

    /// Show per-category statistics
    Stats,

    /// Compare search volume of a keyword week over week
    Trend {
        #[arg(long)]
        keyword: String,

        /// Reference day (default: today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Run monitor and report jobs on their timers until Ctrl-C
    Schedule,

    /// Validate configuration and storage
    Validate,

    /// Show storage status
    Info,

    /// Write a default config (and sheet template with --sheet)
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

/// Everything a job needs to open its own storage handle.
#[derive(Clone)]
struct Context {
    config: Arc<Config>,
    storage_dir: PathBuf,
    sheet: Option<PathBuf>,
}

impl Context {
    fn open_store(&self) -> Box<dyn RecordStore> {
        match &self.sheet {
            Some(path) => {
                let default_category = self
                    .config
                    .categories
                    .first()
                    .map(|c| Category::new(c.id.clone()))
                    .unwrap_or_else(|| Category::new("default"));
                Box::new(SheetStorage::new(path, default_category))
            }
            None => Box::new(LocalStorage::new(&self.storage_dir)),
        }
    }

    fn report_output(&self) -> LocalStorage {
        LocalStorage::new(self.storage_dir.join(&self.config.report.output_dir))
    }

    async fn monitor(&self, scope: &Scope) -> Result<pipeline::MonitorOutcome> {
        let store = self.open_store();
        let search = NaverSearch::new(self.config.scraper.clone())?;
        let probe = HttpDeletionProbe::new(self.config.scraper.clone())?;
        pipeline::run_monitor(
            &self.config,
            store.as_ref(),
            &search,
            &probe,
            scope,
            Utc::now(),
        )
        .await
    }

    async fn report(
        &self,
        scope: &Scope,
        options: ReportOptions,
    ) -> Result<pipeline::ReportOutcome> {
        let store = self.open_store();
        pipeline::run_report(
            &self.config,
            store.as_ref(),
            &self.report_output(),
            scope,
            options,
            Utc::now(),
        )
        .await
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.storage_dir.join("config.toml"));

    let config = Config::load_or_default(&config_path);
    log::info!("Loaded configuration from {}", config_path.display());

    let ctx = Context {
        config: Arc::new(config),
        storage_dir: cli.storage_dir.clone(),
        sheet: cli.sheet.clone(),
    };

    match &cli.command {
        Command::Init { force } => init(&cli, &config_path, *force).await?,

        Command::Monitor { category } => {
            let outcome = ctx.monitor(&Scope::from(category.clone())).await?;
            if outcome.fetch_failures > 0 {
                log::warn!(
                    "{} keywords could not be searched and were counted as not exposed",
                    outcome.fetch_failures
                );
            }
            println!(
                "{}",
                report::render_summary(&outcome.summary, "Monitor run", Utc::now())
            );
        }

        Command::Report {
            category,
            csv,
            html,
        } => {
            let options = ReportOptions {
                csv: *csv,
                html: *html,
            };
            let outcome = ctx.report(&Scope::from(category.clone()), options).await?;
            println!("{}", outcome.console);
            for path in [outcome.csv_path, outcome.html_path].into_iter().flatten() {
                log::info!("Written {}", path.display());
            }
        }

        Command::Stats => {
            let store = ctx.open_store();
            let text =
                pipeline::run_stats(&ctx.config, store.as_ref(), &Scope::All, Utc::now()).await?;
            println!("{}", text);
        }

        Command::Trend { keyword, today } => {
            let today = today.unwrap_or_else(|| Local::now().date_naive());
            let source = FileVolumeSource::new(cli.storage_dir.join("volumes.json"));
            let outcome = pipeline::run_trend(&source, keyword, today).await?;
            println!(
                "{}",
                report::render_trend(&outcome.keyword, &outcome.periods, &outcome.comparisons)
            );
        }

        Command::Schedule => {
            ctx.config.validate()?;

            let monitor_ctx = ctx.clone();
            let monitor_job = move || {
                let ctx = monitor_ctx.clone();
                async move { ctx.monitor(&Scope::All).await.map(|_| ()) }
            };

            let report_ctx = ctx.clone();
            let report_job = move || {
                let ctx = report_ctx.clone();
                async move {
                    let options = ReportOptions {
                        csv: true,
                        html: true,
                    };
                    ctx.report(&Scope::All, options).await.map(|_| ())
                }
            };

            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("Failed to listen for Ctrl-C: {}", e);
                }
            };

            pipeline::run_scheduler(&ctx.config.schedule, monitor_job, report_job, shutdown)
                .await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = ctx.config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");

            let store = ctx.open_store();
            let targets = store.load_targets(&Scope::All).await?;
            let unknown: BTreeSet<&str> = targets
                .iter()
                .map(|t| t.category.as_str())
                .filter(|id| !ctx.config.categories.iter().any(|c| c.id == *id))
                .collect();
            if !unknown.is_empty() {
                let ids: Vec<&str> = unknown.into_iter().collect();
                log::warn!("Targets use unconfigured categories: {}", ids.join(", "));
            }
            log::info!("✓ Storage OK ({} targets)", targets.len());

            log::info!("All validations passed!");
        }

        Command::Info => {
            log::info!("Storage directory: {}", cli.storage_dir.display());
            if let Some(sheet) = &cli.sheet {
                log::info!("Sheet: {}", sheet.display());
            }

            let store = ctx.open_store();
            let targets = store.load_targets(&Scope::All).await?;
            let records = store.load_records(&Scope::All).await?;
            let published = targets.iter().filter(|t| t.has_url()).count();
            log::info!("Targets: {} ({} published)", targets.len(), published);
            log::info!("Records: {}", records.len());

            match records.iter().map(|r| r.last_checked_at).max() {
                Some(ts) => log::info!("Last checked: {}", report::format_time(ts)),
                None => log::info!("No monitor run recorded yet."),
            }
        }
    }

    log::info!("Done!");

    Ok(())
}

/// Write the default config and empty target stores.
async fn init(cli: &Cli, config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        log::warn!(
            "Config already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    } else {
        let config = Config::default();
        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(config_path, config.to_toml()?).await?;
        log::info!("Config written to {}", config_path.display());
    }

    match &cli.sheet {
        Some(path) => {
            let store = SheetStorage::new(path, Category::new("default"));
            if store.create_template().await? {
                log::info!("Sheet template written to {}", path.display());
            }
        }
        None => {
            let storage = LocalStorage::new(&cli.storage_dir);
            let targets_path = cli.storage_dir.join("targets.json");
            if !targets_path.exists() {
                storage.save_targets(&[]).await?;
                log::info!("Empty targets written to {}", targets_path.display());
            }
        }
    }
    Ok(())
}
