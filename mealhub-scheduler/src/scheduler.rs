//! Named recurring jobs on wall-clock triggers, isolated from the job queue.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::error::SchedulerError;
use crate::schedule::CronSchedule;

/// Snapshot of one registered task, for monitoring.
#[derive(Debug, Clone)]
pub struct ScheduledTaskInfo {
    pub job_id: String,
    pub next_run: Option<DateTime<Utc>>,
}

/// Cron scheduler for recurring maintenance work.
///
/// Registered callables fire on their own triggers, each firing dispatched
/// into its own task: a long-running callable delays only its own next
/// firing, never other registered jobs. Errors raised by a callable are
/// caught and logged; the registration survives and the next firing still
/// occurs. Failures here never touch the jobs table.
///
/// Jobs may be registered before or after [`start`](Self::start); triggers
/// only fire once the scheduler is started.
#[derive(Clone)]
pub struct CronScheduler {
    inner: JobScheduler,
    registered: Arc<RwLock<HashMap<String, uuid::Uuid>>>,
}

impl CronScheduler {
    pub async fn new() -> Result<Self, SchedulerError> {
        let inner = JobScheduler::new().await?;
        Ok(Self {
            inner,
            registered: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Start the scheduler's timer.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        let mut inner = self.inner.clone();
        inner.start().await?;
        info!("cron scheduler started");
        Ok(())
    }

    /// Register an async callable under `job_id`. Registering an id that
    /// already exists replaces the previous registration.
    ///
    /// Each firing is spawned fire-and-forget; an error return is logged
    /// and contained at the task boundary.
    pub async fn add_cron_job<F, Fut>(
        &self,
        job_id: &str,
        schedule: CronSchedule,
        run: F,
    ) -> Result<(), SchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        schedule.validate()?;
        let expression = schedule.expression();

        let name = job_id.to_owned();
        let run = Arc::new(run);
        let job = Job::new_async(expression.as_str(), move |_id, _sched| {
            let run = Arc::clone(&run);
            let name = name.clone();
            Box::pin(async move {
                // Fire and forget: the timer never waits on job logic.
                tokio::spawn(async move {
                    if let Err(e) = (*run)().await {
                        error!(job_id = %name, error = %e, "scheduled job failed");
                    }
                });
            })
        })?;

        self.install(job_id, job).await
    }

    /// Register a synchronous callable. It runs to completion on the
    /// blocking thread pool, away from the scheduler's timer.
    pub async fn add_blocking_cron_job<F>(
        &self,
        job_id: &str,
        schedule: CronSchedule,
        run: F,
    ) -> Result<(), SchedulerError>
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let run = Arc::new(run);
        self.add_cron_job(job_id, schedule, move || {
            let run = Arc::clone(&run);
            async move {
                tokio::task::spawn_blocking(move || (*run)())
                    .await
                    .map_err(|e| anyhow::anyhow!("blocking job panicked: {e}"))?
            }
        })
        .await
    }

    async fn install(&self, job_id: &str, job: Job) -> Result<(), SchedulerError> {
        let mut inner = self.inner.clone();
        let new_id = inner.add(job).await?;

        let mut registered = self.registered.write().await;
        if let Some(previous) = registered.insert(job_id.to_owned(), new_id) {
            // Replace-existing semantics: drop the old trigger.
            if let Err(e) = inner.remove(&previous).await {
                warn!(job_id, error = %e, "failed to remove replaced cron job");
            }
        }
        info!(job_id, "registered cron job");
        Ok(())
    }

    /// Remove a registration. Returns false if the id was unknown.
    pub async fn remove_job(&self, job_id: &str) -> Result<bool, SchedulerError> {
        let removed = self.registered.write().await.remove(job_id);
        match removed {
            Some(uuid) => {
                let mut inner = self.inner.clone();
                inner.remove(&uuid).await?;
                info!(job_id, "removed cron job");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// All registered tasks with their next fire time.
    pub async fn list_jobs(&self) -> Vec<ScheduledTaskInfo> {
        let registered = self.registered.read().await;
        let mut infos = Vec::with_capacity(registered.len());
        let mut inner = self.inner.clone();
        for (job_id, uuid) in registered.iter() {
            let next_run = inner.next_tick_for_job(*uuid).await.unwrap_or_default();
            infos.push(ScheduledTaskInfo {
                job_id: job_id.clone(),
                next_run,
            });
        }
        infos.sort_by(|a, b| a.job_id.cmp(&b.job_id));
        infos
    }

    /// Stop the timer. Firings already dispatched run to completion.
    pub async fn shutdown(&self) -> Result<(), SchedulerError> {
        let mut inner = self.inner.clone();
        inner.shutdown().await?;
        info!("cron scheduler stopped");
        Ok(())
    }
}
