//! The worker loop: drives jobs from `queued` to a terminal state and
//! survives process restarts without losing or duplicating work.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::store::JobStore;
use crate::types::Job;
use crate::unit_of_work::UnitOfWork;
use crate::JobQueueError;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_JOB_TIMEOUT_MINUTES: u64 = 30;

/// Process-wide worker tuning, set once at construction.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Sleep between empty polls. Trades pickup latency against database
    /// load; not a correctness parameter.
    pub poll_interval: Duration,
    /// Max time a job may run before it is considered stuck. Applied both
    /// to the in-process execution (the callback is cancelled) and to the
    /// periodic sweep over rows other processes left behind.
    pub job_timeout: Duration,
    /// Reset orphaned `running` rows back to `queued` at startup.
    pub enable_orphan_recovery: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            job_timeout: Duration::from_secs(DEFAULT_JOB_TIMEOUT_MINUTES * 60),
            enable_orphan_recovery: true,
        }
    }
}

/// A single logical consumer of the jobs table.
///
/// The loop is sequential: at most one job is in flight per worker instance.
/// Multiple instances may run against the same store; the claim query in
/// [`JobStore::claim_next`] is the sole mechanism preventing double
/// processing across them.
pub struct JobWorker {
    store: JobStore,
    unit: Arc<dyn UnitOfWork>,
    config: WorkerConfig,
    cancel: CancellationToken,
}

impl JobWorker {
    pub fn new(store: JobStore, unit: Arc<dyn UnitOfWork>, config: WorkerConfig) -> Self {
        Self {
            store,
            unit,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Token observed between iterations and during the poll sleep. Cancel
    /// it to stop the loop; a job already executing runs to completion
    /// first, so shutdown never abandons a claimed job mid-flight.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run until the cancellation token fires.
    ///
    /// Orphan recovery happens once, synchronously, before the first poll:
    /// nothing can legitimately be `running` before this worker has claimed
    /// anything, so every `running` row belongs to a process that died.
    pub async fn run(self) -> Result<(), JobQueueError> {
        info!(unit = self.unit.name(), "job worker starting");

        if self.config.enable_orphan_recovery {
            let recovered = self.store.recover_orphans().await?;
            if recovered.is_empty() {
                debug!("no orphaned jobs found at startup");
            } else {
                info!(count = recovered.len(), jobs = ?recovered, "re-queued orphaned jobs");
            }
        }

        info!("worker loop started; polling for queued jobs");
        while !self.cancel.is_cancelled() {
            // Stuck-job sweep first, so a wedged job from another instance
            // cannot sit in `running` forever.
            match self.store.sweep_stuck(self.config.job_timeout).await {
                Ok(swept) if !swept.is_empty() => {
                    warn!(count = swept.len(), jobs = ?swept, "failed stuck jobs past timeout");
                }
                Ok(_) => {}
                Err(e) => {
                    // Infrastructure trouble, not a job failure. Retry next tick.
                    warn!(error = %e, "stuck-job sweep failed; will retry");
                }
            }

            match self.store.claim_next().await {
                Ok(Some(job)) => {
                    self.process(job).await;
                    // Drain the queue without sleeping between jobs.
                    continue;
                }
                Ok(None) => debug!("no queued jobs"),
                Err(e) => {
                    warn!(error = %e, "claim query failed; will retry");
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        info!("worker loop stopped");
        Ok(())
    }

    /// Execute one claimed job. The job is already `running`; claim_next did
    /// that atomically. Failures are fully contained here: nothing a unit of
    /// work does can terminate the loop.
    async fn process(&self, job: Job) {
        let job_id = job.job_id;
        info!(%job_id, payload_ref = %job.payload_ref, unit = self.unit.name(), "processing job");

        let outcome =
            tokio::time::timeout(self.config.job_timeout, self.unit.execute(&job.payload_ref))
                .await;

        match outcome {
            Ok(Ok(())) => match self.store.mark_completed(job_id).await {
                Ok(true) => info!(%job_id, "job completed"),
                Ok(false) => {
                    // The sweep (or another finalizer) got there first.
                    warn!(%job_id, "job was no longer running; completion not recorded");
                }
                Err(e) => error!(%job_id, error = %e, "failed to record job completion"),
            },
            Ok(Err(e)) => {
                error!(%job_id, error = %e, "unit of work failed");
                self.finalize_failed(job_id).await;
            }
            Err(_) => {
                error!(
                    %job_id,
                    timeout_secs = self.config.job_timeout.as_secs(),
                    "unit of work timed out"
                );
                self.finalize_failed(job_id).await;
            }
        }
    }

    async fn finalize_failed(&self, job_id: uuid::Uuid) {
        match self.store.mark_failed(job_id).await {
            Ok(true) => {}
            Ok(false) => warn!(%job_id, "job was no longer running; failure not recorded"),
            Err(e) => error!(%job_id, error = %e, "failed to record job failure"),
        }
    }
}
