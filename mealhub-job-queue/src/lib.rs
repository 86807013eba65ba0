//! Database-backed job queue for the MealHub backend.
//!
//! The relational `jobs` table is the queue: durable, crash-safe, and shared
//! by however many worker processes point at it. There is no broker and no
//! in-memory queue state.
//!
//! # Architecture
//!
//! - [`JobStore`] - All reads and state transitions over the `jobs` table,
//!   including the atomic claim query
//! - [`JobWorker`] - The poll/claim/execute/finalize loop, with orphan
//!   recovery at startup and a periodic stuck-job sweep
//! - [`UnitOfWork`] - Trait for the business logic invoked per job
//! - [`Job`] / [`JobStatus`] - The row model and its lifecycle state machine
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use mealhub_db_connection::{create_pool, DbConnectionConfig};
//! use mealhub_job_queue::{JobStore, JobWorker, NoOpUnitOfWork, WorkerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DbConnectionConfig::new("sqlite:mealhub.db")).await?;
//!     let store = JobStore::new(pool);
//!
//!     // Submission side: insert + enqueue, keep the id for status polling.
//!     let job = store.submit("route-group-42").await?;
//!     println!("submitted {}", job.job_id);
//!
//!     // Worker side: runs until the token is cancelled.
//!     let worker = JobWorker::new(store, Arc::new(NoOpUnitOfWork), WorkerConfig::default());
//!     let shutdown = worker.cancellation_token();
//!     tokio::spawn(async move {
//!         tokio::time::sleep(std::time::Duration::from_secs(60)).await;
//!         shutdown.cancel();
//!     });
//!     worker.run().await?;
//!     Ok(())
//! }
//! ```

mod error;
mod store;
mod types;
mod unit_of_work;
mod worker;

pub use error::JobQueueError;
pub use store::JobStore;
pub use types::{Job, JobStatus};
pub use unit_of_work::{NoOpUnitOfWork, UnitOfWork};
pub use worker::{JobWorker, WorkerConfig, DEFAULT_JOB_TIMEOUT_MINUTES, DEFAULT_POLL_INTERVAL_SECS};

// Re-export async_trait for convenience when implementing UnitOfWork
pub use async_trait::async_trait;
