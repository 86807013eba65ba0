//! Recurring maintenance registrations.
//!
//! These run on the cron scheduler, entirely outside the job queue's state
//! machine. The business callables (driver-history rollup, geocoding
//! refresh) are injected by startup code; the queue-depth report is
//! implemented here against the jobs table itself.

use std::future::Future;

use mealhub_job_queue::{JobStatus, JobStore};
use mealhub_scheduler::{CronSchedule, CronScheduler, SchedulerError};
use tracing::info;

use crate::job_ids;

/// Register the standard daily maintenance jobs.
///
/// `driver_history` runs at 23:59 (marks the day's assignments complete and
/// rolls distances into driver history); `geocoding_refresh` runs at 02:00
/// (re-geocodes stale locations). Both are provided by the calling service
/// layer; a failure in either is contained per firing by the scheduler.
pub async fn init_jobs<H, HFut, G, GFut>(
    scheduler: &CronScheduler,
    driver_history: H,
    geocoding_refresh: G,
) -> Result<(), SchedulerError>
where
    H: Fn() -> HFut + Send + Sync + 'static,
    HFut: Future<Output = anyhow::Result<()>> + Send + 'static,
    G: Fn() -> GFut + Send + Sync + 'static,
    GFut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    scheduler
        .add_cron_job(
            job_ids::DAILY_DRIVER_HISTORY,
            CronSchedule::daily_at(23, 59),
            driver_history,
        )
        .await?;
    scheduler
        .add_cron_job(
            job_ids::GEOCODING_REFRESH,
            CronSchedule::daily_at(2, 0),
            geocoding_refresh,
        )
        .await?;
    Ok(())
}

/// Register an hourly (by default) queue-depth report over the jobs table.
pub async fn register_queue_report(
    scheduler: &CronScheduler,
    store: JobStore,
    schedule: CronSchedule,
) -> Result<(), SchedulerError> {
    scheduler
        .add_cron_job(job_ids::QUEUE_REPORT, schedule, move || {
            let store = store.clone();
            async move {
                report_queue_depth(&store).await?;
                Ok(())
            }
        })
        .await
}

/// Log the number of jobs in each non-terminal-entry state plus terminals.
pub async fn report_queue_depth(store: &JobStore) -> anyhow::Result<()> {
    for status in [
        JobStatus::Pending,
        JobStatus::Queued,
        JobStatus::Running,
        JobStatus::Completed,
        JobStatus::Failed,
    ] {
        let count = store.count_by_status(status).await?;
        info!(status = %status, count, "job queue depth");
    }
    Ok(())
}
