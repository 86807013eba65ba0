//! Job execution errors.

use thiserror::Error;

/// Errors that may occur inside concrete job implementations.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("route planning failed: {0}")]
    PlanningFailed(String),
}
