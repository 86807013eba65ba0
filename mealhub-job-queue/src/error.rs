//! Error types for the job queue.

use thiserror::Error;
use uuid::Uuid;

use crate::types::JobStatus;

/// Errors that may occur while interacting with the job queue.
#[derive(Debug, Error)]
pub enum JobQueueError {
    #[error("job not found: {0}")]
    NotFound(Uuid),

    #[error("job {job_id} cannot move from {from} to {to}")]
    InvalidTransition {
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("unknown status '{0}' in jobs table")]
    UnknownStatus(String),

    #[error("job execution failed: {0}")]
    ExecutionFailed(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
