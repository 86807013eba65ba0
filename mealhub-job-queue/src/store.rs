//! Durable persistence of job rows and their state transitions.
//!
//! The `jobs` table is the queue. Every mutation goes through one of the
//! transitions defined here; nothing read-modify-writes a row outside them.
//! Races between the stuck-job sweep and an actively finishing worker are
//! resolved by conditioning every terminal update on the row still being
//! `running`, so the loser of the race is a harmless no-op.

use std::time::Duration;

use chrono::{DateTime, Utc};
use mealhub_db_connection::DbPool;
use uuid::Uuid;

use crate::error::JobQueueError;
use crate::types::{Job, JobStatus};

#[cfg(feature = "sqlite")]
mod sql {
    pub const INSERT: &str = "INSERT INTO jobs (job_id, payload_ref, status, created_at, \
         updated_at) VALUES (?, ?, ?, ?, ?)";

    pub const READ: &str = "SELECT job_id, payload_ref, status, created_at, updated_at, \
         started_at, finished_at FROM jobs WHERE job_id = ?";

    pub const LIST_BY_STATUS: &str = "SELECT job_id, payload_ref, status, created_at, \
         updated_at, started_at, finished_at FROM jobs WHERE status = ? \
         ORDER BY created_at, job_id";

    pub const COUNT_BY_STATUS: &str = "SELECT COUNT(*) FROM jobs WHERE status = ?";

    pub const ENQUEUE: &str =
        "UPDATE jobs SET status = 'queued', updated_at = ? WHERE job_id = ? AND status = 'pending'";

    // A single UPDATE statement is one write transaction in SQLite, which
    // gives the same two-workers-never-share-a-job guarantee that
    // FOR UPDATE SKIP LOCKED provides on Postgres.
    pub const CLAIM_NEXT: &str = "UPDATE jobs SET status = 'running', started_at = ?, updated_at = ? \
         WHERE job_id = (SELECT job_id FROM jobs WHERE status = 'queued' \
         ORDER BY created_at, job_id LIMIT 1) AND status = 'queued' \
         RETURNING job_id, payload_ref, status, created_at, updated_at, started_at, finished_at";

    pub const MARK_TERMINAL: &str = "UPDATE jobs SET status = ?, finished_at = ?, updated_at = ? \
         WHERE job_id = ? AND status = 'running'";

    pub const SWEEP_STUCK: &str = "UPDATE jobs SET status = 'failed', finished_at = ?, updated_at = ? \
         WHERE status = 'running' AND started_at < ? RETURNING job_id";

    pub const RECOVER_ORPHANS: &str = "UPDATE jobs SET status = 'queued', started_at = NULL, updated_at = ? \
         WHERE status = 'running' RETURNING job_id";
}

#[cfg(feature = "postgres")]
mod sql {
    pub const INSERT: &str = "INSERT INTO jobs (job_id, payload_ref, status, created_at, \
         updated_at) VALUES ($1, $2, $3, $4, $5)";

    pub const READ: &str = "SELECT job_id, payload_ref, status, created_at, updated_at, \
         started_at, finished_at FROM jobs WHERE job_id = $1";

    pub const LIST_BY_STATUS: &str = "SELECT job_id, payload_ref, status, created_at, \
         updated_at, started_at, finished_at FROM jobs WHERE status = $1 \
         ORDER BY created_at, job_id";

    pub const COUNT_BY_STATUS: &str = "SELECT COUNT(*) FROM jobs WHERE status = $1";

    pub const ENQUEUE: &str = "UPDATE jobs SET status = 'queued', updated_at = $1 \
         WHERE job_id = $2 AND status = 'pending'";

    // SKIP LOCKED keeps concurrent claimants from blocking on each other;
    // the row lock and the transition to running commit atomically.
    pub const CLAIM_NEXT: &str = "UPDATE jobs SET status = 'running', started_at = $1, updated_at = $2 \
         WHERE job_id = (SELECT job_id FROM jobs WHERE status = 'queued' \
         ORDER BY created_at, job_id LIMIT 1 FOR UPDATE SKIP LOCKED) \
         RETURNING job_id, payload_ref, status, created_at, updated_at, started_at, finished_at";

    pub const MARK_TERMINAL: &str = "UPDATE jobs SET status = $1, finished_at = $2, updated_at = $3 \
         WHERE job_id = $4 AND status = 'running'";

    pub const SWEEP_STUCK: &str = "UPDATE jobs SET status = 'failed', finished_at = $1, updated_at = $2 \
         WHERE status = 'running' AND started_at < $3 RETURNING job_id";

    pub const RECOVER_ORPHANS: &str = "UPDATE jobs SET status = 'queued', started_at = NULL, updated_at = $1 \
         WHERE status = 'running' RETURNING job_id";
}

/// Raw row shape as stored; converted to [`Job`] after decoding.
#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    job_id: Uuid,
    payload_ref: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl TryFrom<JobRow> for Job {
    type Error = JobQueueError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status = JobStatus::parse(&row.status)
            .ok_or_else(|| JobQueueError::UnknownStatus(row.status.clone()))?;
        Ok(Job {
            job_id: row.job_id,
            payload_ref: row.payload_ref,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
            started_at: row.started_at,
            finished_at: row.finished_at,
        })
    }
}

/// Handle over the `jobs` table. Cheap to clone; wraps the shared pool.
#[derive(Debug, Clone)]
pub struct JobStore {
    pool: DbPool,
}

impl JobStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Create a job in `pending`. The job is not visible to workers until
    /// [`enqueue`](Self::enqueue) is called.
    pub async fn insert(&self, payload_ref: &str) -> Result<Job, JobQueueError> {
        self.insert_with_status(payload_ref, JobStatus::Pending).await
    }

    /// Combined insert-and-enqueue: creates the job directly in `queued`.
    pub async fn submit(&self, payload_ref: &str) -> Result<Job, JobQueueError> {
        self.insert_with_status(payload_ref, JobStatus::Queued).await
    }

    async fn insert_with_status(
        &self,
        payload_ref: &str,
        status: JobStatus,
    ) -> Result<Job, JobQueueError> {
        let now = Utc::now();
        let job = Job {
            job_id: Uuid::new_v4(),
            payload_ref: payload_ref.to_owned(),
            status,
            created_at: now,
            updated_at: now,
            started_at: None,
            finished_at: None,
        };

        sqlx::query(sql::INSERT)
            .bind(job.job_id)
            .bind(&job.payload_ref)
            .bind(job.status.as_str())
            .bind(job.created_at)
            .bind(job.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(job)
    }

    /// Transition `pending` -> `queued`, making the job visible to the claim
    /// query. Fails with [`JobQueueError::InvalidTransition`] for any other
    /// current state.
    pub async fn enqueue(&self, job_id: Uuid) -> Result<(), JobQueueError> {
        let result = sqlx::query(sql::ENQUEUE)
            .bind(Utc::now())
            .bind(job_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            // Distinguish a missing row from a job that already left pending.
            let current = self.read(job_id).await?;
            return Err(JobQueueError::InvalidTransition {
                job_id,
                from: current.status,
                to: JobStatus::Queued,
            });
        }
        Ok(())
    }

    /// Point lookup of a single job.
    pub async fn read(&self, job_id: Uuid) -> Result<Job, JobQueueError> {
        let row = sqlx::query_as::<_, JobRow>(sql::READ)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(JobQueueError::NotFound(job_id))?;
        row.try_into()
    }

    /// All jobs currently in `status`, oldest first. Used by monitoring and
    /// recovery scans.
    pub async fn list_by_status(&self, status: JobStatus) -> Result<Vec<Job>, JobQueueError> {
        let rows = sqlx::query_as::<_, JobRow>(sql::LIST_BY_STATUS)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Job::try_from).collect()
    }

    pub async fn count_by_status(&self, status: JobStatus) -> Result<i64, JobQueueError> {
        let count: i64 = sqlx::query_scalar(sql::COUNT_BY_STATUS)
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Atomically claim the oldest `queued` job: take it, mark it `running`
    /// and stamp `started_at` in one statement. Returns `None` when the
    /// queue is empty.
    ///
    /// This is the load-bearing correctness property of the subsystem: two
    /// workers calling this concurrently can never both receive the same job.
    pub async fn claim_next(&self) -> Result<Option<Job>, JobQueueError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, JobRow>(sql::CLAIM_NEXT)
            .bind(now)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Job::try_from).transpose()
    }

    /// Transition `running` -> `completed`. Returns false if the row was no
    /// longer `running` (e.g. the stuck-job sweep won the race), in which
    /// case nothing changes.
    pub async fn mark_completed(&self, job_id: Uuid) -> Result<bool, JobQueueError> {
        self.mark_terminal(job_id, JobStatus::Completed).await
    }

    /// Transition `running` -> `failed`. Same no-op-on-lost-race semantics
    /// as [`mark_completed`](Self::mark_completed).
    pub async fn mark_failed(&self, job_id: Uuid) -> Result<bool, JobQueueError> {
        self.mark_terminal(job_id, JobStatus::Failed).await
    }

    async fn mark_terminal(&self, job_id: Uuid, status: JobStatus) -> Result<bool, JobQueueError> {
        debug_assert!(status.is_terminal());
        let now = Utc::now();
        let result = sqlx::query(sql::MARK_TERMINAL)
            .bind(status.as_str())
            .bind(now)
            .bind(now)
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Fail every `running` job whose `started_at` is older than `timeout`.
    /// Returns the ids of the jobs that were failed.
    pub async fn sweep_stuck(&self, timeout: Duration) -> Result<Vec<Uuid>, JobQueueError> {
        let now = Utc::now();
        let cutoff = now - timeout;
        let ids: Vec<Uuid> = sqlx::query_scalar(sql::SWEEP_STUCK)
            .bind(now)
            .bind(now)
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    /// Reset every `running` job back to `queued` with `started_at` cleared.
    ///
    /// Only valid before a worker starts claiming: at that point no job can
    /// legitimately be `running`, so each such row belongs to a process that
    /// died mid-execution. Idempotent; a second run finds nothing.
    pub async fn recover_orphans(&self) -> Result<Vec<Uuid>, JobQueueError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(sql::RECOVER_ORPHANS)
            .bind(Utc::now())
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}
