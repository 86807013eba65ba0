//! Route generation as a unit of work.
//!
//! The queue treats the payload as opaque; here it is interpreted as a
//! route-group reference and handed to a [`RoutePlanner`]. The planner is
//! the actual optimization algorithm and lives behind a trait so the worker
//! never depends on its internals.

use async_trait::async_trait;
use mealhub_job_queue::{JobQueueError, UnitOfWork};
use tracing::info;

use crate::error::JobError;

/// The opaque route-optimization collaborator.
#[async_trait]
pub trait RoutePlanner: Send + Sync {
    /// Generate routes for one route group. Errors are terminal for the
    /// job that requested them.
    async fn plan_routes(&self, route_group_ref: &str) -> Result<(), JobError>;
}

/// A planner that pretends to work: it logs and succeeds.
///
/// Stands in for the real algorithm during development and in tests, like
/// the original system's mock routing algorithm.
#[derive(Debug, Default, Clone)]
pub struct MockRoutePlanner;

#[async_trait]
impl RoutePlanner for MockRoutePlanner {
    async fn plan_routes(&self, route_group_ref: &str) -> Result<(), JobError> {
        info!(route_group_ref, "mock planner generated routes");
        Ok(())
    }
}

/// Unit of work that runs route generation for a claimed job.
pub struct RouteGenerationJob<P> {
    planner: P,
}

impl<P: RoutePlanner> RouteGenerationJob<P> {
    pub fn new(planner: P) -> Self {
        Self { planner }
    }
}

#[async_trait]
impl<P: RoutePlanner> UnitOfWork for RouteGenerationJob<P> {
    fn name(&self) -> &str {
        "route_generation"
    }

    async fn execute(&self, payload_ref: &str) -> Result<(), JobQueueError> {
        let route_group_ref = payload_ref.trim();
        if route_group_ref.is_empty() {
            return Err(JobQueueError::ExecutionFailed(
                JobError::InvalidPayload("empty route group reference".into()).to_string(),
            ));
        }

        self.planner
            .plan_routes(route_group_ref)
            .await
            .map_err(|e| JobQueueError::ExecutionFailed(e.to_string()))
    }
}
