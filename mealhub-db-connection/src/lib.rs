//! Connection pool construction for the MealHub backend.
//!
//! The database backend is selected at compile time through cargo features:
//! `sqlite` (default, used by tests and small deployments) or `postgres`
//! (production; required for true `FOR UPDATE SKIP LOCKED` claim semantics
//! in the job queue).

pub mod config;
pub mod error;
pub mod pool;

pub use config::DbConnectionConfig;
pub use error::DbConnectionError;
pub use pool::{create_pool, DbPool};
