// src/pipeline/schedule.rs

//! Long-running host for the periodic monitor and report jobs.
//!
//! Each job runs in its own task and owns whatever it opens; nothing mutable
//! is shared between them. A failed run is logged and the timer keeps going.

use std::future::Future;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime, TimeDelta};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::Result;
use crate::models::ScheduleConfig;

/// Next local time at or after `now` matching one of `times`.
///
/// A time equal to `now` counts as already passed.
pub fn next_daily_run(now: NaiveDateTime, times: &[NaiveTime]) -> Option<NaiveDateTime> {
    let today = now.date();
    times
        .iter()
        .map(|t| {
            let candidate = today.and_time(*t);
            if candidate > now {
                candidate
            } else {
                candidate + TimeDelta::days(1)
            }
        })
        .min()
}

async fn run_logged<F, Fut>(name: &str, job: &F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    log::info!("[{}] starting", name);
    match job().await {
        Ok(()) => log::info!("[{}] finished", name),
        Err(e) if e.is_fatal() => log::error!("[{}] failed: {}", name, e),
        Err(e) => log::warn!("[{}] failed: {}", name, e),
    }
}

fn spawn_interval<F, Fut>(every: Duration, job: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            run_logged("monitor", &job).await;
        }
    })
}

fn spawn_daily<F, Fut>(times: Vec<NaiveTime>, job: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let now = Local::now().naive_local();
            let Some(next) = next_daily_run(now, &times) else {
                log::warn!("[report] no report times configured");
                return;
            };
            log::info!("[report] next run at {}", next.format("%Y-%m-%d %H:%M"));
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(wait).await;
            run_logged("report", &job).await;
        }
    })
}

/// Run both jobs until `shutdown` resolves.
///
/// The monitor job fires immediately and then every
/// `monitor_interval_hours`; the report job fires at each `report_times`
/// entry in local time.
pub async fn run_scheduler<M, MF, R, RF>(
    schedule: &ScheduleConfig,
    monitor: M,
    report: R,
    shutdown: impl Future<Output = ()>,
) -> Result<()>
where
    M: Fn() -> MF + Send + Sync + 'static,
    MF: Future<Output = Result<()>> + Send + 'static,
    R: Fn() -> RF + Send + Sync + 'static,
    RF: Future<Output = Result<()>> + Send + 'static,
{
    let times = schedule.report_times()?;
    let every = Duration::from_secs(schedule.monitor_interval_hours.max(1) * 3600);

    log::info!(
        "Scheduler started: monitor every {}h, reports at {}",
        schedule.monitor_interval_hours.max(1),
        schedule.report_times.join(", ")
    );

    let monitor_task = spawn_interval(every, monitor);
    let report_task = spawn_daily(times, report);

    shutdown.await;
    log::info!("Shutdown requested, stopping jobs");
    monitor_task.abort();
    report_task.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::NaiveDate;

    use crate::error::AppError;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_next_run_later_today() {
        let now = day(10).and_time(at(11, 0));
        let next = next_daily_run(now, &[at(10, 10), at(12, 30)]).unwrap();
        assert_eq!(next, day(10).and_time(at(12, 30)));
    }

    #[test]
    fn test_next_run_rolls_to_tomorrow() {
        let now = day(10).and_time(at(12, 30));
        let next = next_daily_run(now, &[at(10, 10), at(12, 30)]).unwrap();
        assert_eq!(next, day(11).and_time(at(10, 10)));
    }

    #[test]
    fn test_no_times_means_no_run() {
        assert!(next_daily_run(day(10).and_time(at(0, 0)), &[]).is_none());
    }

    #[tokio::test]
    async fn test_monitor_runs_immediately_and_failures_do_not_stop_host() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let monitor = move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(AppError::persistence("memory", "down"))
            }
        };
        let report = || async { Ok::<_, AppError>(()) };

        run_scheduler(
            &ScheduleConfig::default(),
            monitor,
            report,
            tokio::time::sleep(Duration::from_millis(100)),
        )
        .await
        .unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_report_time_rejected() {
        let schedule = ScheduleConfig {
            report_times: vec!["25:99".into()],
            ..ScheduleConfig::default()
        };
        let result = run_scheduler(
            &schedule,
            || async { Ok::<_, AppError>(()) },
            || async { Ok::<_, AppError>(()) },
            async {},
        )
        .await;
        assert!(result.is_err());
    }
}
