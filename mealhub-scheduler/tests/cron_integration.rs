use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mealhub_scheduler::{CronField, CronSchedule, CronScheduler};

/// Schedule that fires every second; only tests loosen the seconds field.
fn every_second() -> CronSchedule {
    CronSchedule {
        second: CronField::Every,
        ..CronSchedule::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn registered_job_fires_repeatedly() {
    let scheduler = CronScheduler::new().await.expect("scheduler");
    let fired = Arc::new(AtomicUsize::new(0));

    let counter = fired.clone();
    scheduler
        .add_cron_job("tick", every_second(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .expect("add job");

    scheduler.start().await.expect("start");
    tokio::time::sleep(Duration::from_millis(3200)).await;
    scheduler.shutdown().await.expect("shutdown");

    assert!(
        fired.load(Ordering::SeqCst) >= 2,
        "expected at least two firings, got {}",
        fired.load(Ordering::SeqCst)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_job_keeps_firing() {
    let scheduler = CronScheduler::new().await.expect("scheduler");
    let attempts = Arc::new(AtomicUsize::new(0));

    let counter = attempts.clone();
    scheduler
        .add_cron_job("always-fails", every_second(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                anyhow::bail!("maintenance exploded")
            }
        })
        .await
        .expect("add job");

    scheduler.start().await.expect("start");
    tokio::time::sleep(Duration::from_millis(3200)).await;
    scheduler.shutdown().await.expect("shutdown");

    // An error return neither deregisters the job nor stops the scheduler.
    assert!(attempts.load(Ordering::SeqCst) >= 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_job_does_not_delay_other_jobs() {
    let scheduler = CronScheduler::new().await.expect("scheduler");
    let quick_fires = Arc::new(AtomicUsize::new(0));

    scheduler
        .add_cron_job("slow", every_second(), || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await
        .expect("add slow job");

    let counter = quick_fires.clone();
    scheduler
        .add_cron_job("quick", every_second(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .expect("add quick job");

    scheduler.start().await.expect("start");
    tokio::time::sleep(Duration::from_millis(3200)).await;
    scheduler.shutdown().await.expect("shutdown");

    assert!(quick_fires.load(Ordering::SeqCst) >= 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_registration_replaces_and_remove_deregisters() {
    let scheduler = CronScheduler::new().await.expect("scheduler");
    scheduler.start().await.expect("start");

    scheduler
        .add_cron_job("rollup", CronSchedule::daily_at(23, 59), || async { Ok(()) })
        .await
        .expect("add");
    scheduler
        .add_cron_job("rollup", CronSchedule::daily_at(22, 0), || async { Ok(()) })
        .await
        .expect("replace");

    let jobs = scheduler.list_jobs().await;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].job_id, "rollup");

    assert!(scheduler.remove_job("rollup").await.expect("remove"));
    assert!(!scheduler.remove_job("rollup").await.expect("remove again"));
    assert!(scheduler.list_jobs().await.is_empty());

    scheduler.shutdown().await.expect("shutdown");
}

#[tokio::test(flavor = "multi_thread")]
async fn blocking_job_runs_off_the_timer_thread() {
    let scheduler = CronScheduler::new().await.expect("scheduler");
    let fired = Arc::new(AtomicUsize::new(0));

    let counter = fired.clone();
    scheduler
        .add_blocking_cron_job("sync-task", every_second(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await
        .expect("add blocking job");

    scheduler.start().await.expect("start");
    tokio::time::sleep(Duration::from_millis(2500)).await;
    scheduler.shutdown().await.expect("shutdown");

    assert!(fired.load(Ordering::SeqCst) >= 1);
}
