//! Wires the worker process together: pool, migrations, store, scheduler,
//! worker loop, graceful shutdown.

use std::sync::Arc;

use anyhow::Context;
use mealhub_config::AppConfig;
use mealhub_db_connection::{create_pool, DbConnectionConfig};
use mealhub_job_queue::{JobStore, JobWorker, WorkerConfig};
use mealhub_jobs::{maintenance, MockRoutePlanner, RouteGenerationJob};
use mealhub_scheduler::{CronSchedule, CronScheduler};
use tracing::info;

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let mut db_config = DbConnectionConfig::new(config.database.url.clone());
    if let Some(v) = config.database.max_connections {
        db_config.max_connections = v;
    }
    if let Some(v) = config.database.min_connections {
        db_config.min_connections = v;
    }
    let pool = create_pool(&db_config)
        .await
        .context("create database pool")?;

    mealhub_migrations::migrator()
        .run(&pool)
        .await
        .context("run migrations")?;

    let store = JobStore::new(pool);

    // Maintenance runs on its own triggers, independent of the worker loop.
    // The daily callables are stand-ins until the service layer that owns
    // assignment and geocoding data provides the real ones.
    let scheduler = CronScheduler::new().await?;
    maintenance::init_jobs(
        &scheduler,
        || async {
            info!("driver history rollup fired; no assignment data wired yet");
            Ok(())
        },
        || async {
            info!("geocoding refresh fired; no location data wired yet");
            Ok(())
        },
    )
    .await?;
    maintenance::register_queue_report(&scheduler, store.clone(), CronSchedule::hourly()).await?;
    scheduler.start().await?;

    let worker_config = WorkerConfig {
        poll_interval: config.worker.poll_interval(),
        job_timeout: config.worker.job_timeout(),
        enable_orphan_recovery: config.worker.orphan_recovery,
    };
    let worker = JobWorker::new(
        store,
        Arc::new(RouteGenerationJob::new(MockRoutePlanner)),
        worker_config,
    );
    let shutdown = worker.cancellation_token();

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            signal_token.cancel();
        }
    });

    worker.run().await?;
    scheduler.shutdown().await?;
    info!("mealhub worker exited cleanly");
    Ok(())
}
