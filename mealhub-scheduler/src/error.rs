use thiserror::Error;
use tokio_cron_scheduler::JobSchedulerError;

/// Errors that may occur while registering or running scheduled tasks.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("cron field {field} value {value} is outside {min}..={max}")]
    InvalidField {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("scheduler error: {0}")]
    Cron(#[from] JobSchedulerError),
}
