//! Cron-style scheduler for the MealHub backend.
//!
//! Recurring maintenance work (geocoding refresh, daily history rollups)
//! runs on wall-clock triggers, entirely outside the job queue's state
//! machine: no queue row is involved and a failing scheduled task never
//! touches the jobs table.
//!
//! # Example
//!
//! ```rust,no_run
//! use mealhub_scheduler::{CronSchedule, CronScheduler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scheduler = CronScheduler::new().await?;
//!     scheduler
//!         .add_cron_job("daily_driver_history", CronSchedule::daily_at(23, 59), || async {
//!             tracing::info!("rolling up driver history");
//!             Ok(())
//!         })
//!         .await?;
//!     scheduler.start().await?;
//!     Ok(())
//! }
//! ```

mod error;
mod schedule;
mod scheduler;

pub use error::SchedulerError;
pub use schedule::{CronField, CronSchedule};
pub use scheduler::{CronScheduler, ScheduledTaskInfo};
