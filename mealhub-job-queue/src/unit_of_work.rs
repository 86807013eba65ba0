//! The pluggable business-logic callback invoked per claimed job.

use async_trait::async_trait;

use crate::error::JobQueueError;

/// Trait for the opaque unit of work a job represents (route generation and
/// friends). The worker invokes it once per claimed job.
///
/// Returning `Ok(())` marks the job completed; any error marks it failed.
/// A failed job is never retried automatically by this subsystem, so true
/// idempotence only matters if an external retry layer is added on top.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Short human-readable name, used in worker logs.
    fn name(&self) -> &str;

    /// Execute the work for one job.
    ///
    /// `payload_ref` is the job's opaque input reference, passed through
    /// uninterpreted from submission.
    async fn execute(&self, payload_ref: &str) -> Result<(), JobQueueError>;
}

/// A unit of work that completes immediately.
///
/// Useful for tests and for wiring the worker before the real business
/// logic is attached.
#[derive(Debug, Default, Clone)]
pub struct NoOpUnitOfWork;

#[async_trait]
impl UnitOfWork for NoOpUnitOfWork {
    fn name(&self) -> &str {
        "noop"
    }

    async fn execute(&self, _payload_ref: &str) -> Result<(), JobQueueError> {
        Ok(())
    }
}
