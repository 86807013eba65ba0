//! Concrete job implementations for the MealHub backend.
//!
//! This crate provides the units of work executed by the
//! [`JobWorker`](mealhub_job_queue::JobWorker) and the recurring maintenance
//! registrations for the [`CronScheduler`](mealhub_scheduler::CronScheduler).
//!
//! # Job types
//!
//! - `route_generation` - generate delivery routes for a route group
//!   (queued work, claimed through the jobs table)
//! - `daily_driver_history` - nightly rollup of driver assignments
//!   (scheduled, callable injected by the service layer)
//! - `geocoding_refresh` - re-geocode stale locations (scheduled, injected)
//! - `queue_report` - periodic queue-depth log over the jobs table

mod error;
pub mod maintenance;
mod route_generation;

pub use error::JobError;
pub use maintenance::{init_jobs, register_queue_report, report_queue_depth};
pub use route_generation::{MockRoutePlanner, RouteGenerationJob, RoutePlanner};

/// Job id constants for scheduler registrations.
pub mod job_ids {
    pub const DAILY_DRIVER_HISTORY: &str = "daily_driver_history";
    pub const GEOCODING_REFRESH: &str = "geocoding_refresh";
    pub const QUEUE_REPORT: &str = "queue_report";
}
