use std::time::Duration;

use chrono::Utc;
use mealhub_db_connection::{create_pool, DbConnectionConfig};
use mealhub_job_queue::{JobQueueError, JobStatus, JobStore};
use uuid::Uuid;

/// In-memory store on a single connection; every statement sees the same DB.
async fn memory_store() -> JobStore {
    let mut config = DbConnectionConfig::new("sqlite::memory:");
    config.max_connections = 1;
    config.min_connections = 1;
    let pool = create_pool(&config).await.expect("create pool");
    mealhub_migrations::migrator()
        .run(&pool)
        .await
        .expect("run migrations");
    JobStore::new(pool)
}

#[tokio::test]
async fn insert_then_enqueue_walks_the_state_machine() {
    let store = memory_store().await;

    let job = store.insert("route-group-7").await.expect("insert");
    assert_eq!(job.status, JobStatus::Pending);
    assert!(job.started_at.is_none());
    assert!(job.finished_at.is_none());

    store.enqueue(job.job_id).await.expect("enqueue");
    let queued = store.read(job.job_id).await.expect("read");
    assert_eq!(queued.status, JobStatus::Queued);
    assert!(queued.started_at.is_none());
    assert_eq!(queued.payload_ref, "route-group-7");
}

#[tokio::test]
async fn submit_creates_directly_queued() {
    let store = memory_store().await;
    let job = store.submit("route-group-42").await.expect("submit");
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(store.count_by_status(JobStatus::Queued).await.unwrap(), 1);
}

#[tokio::test]
async fn enqueue_rejects_missing_and_non_pending_jobs() {
    let store = memory_store().await;

    let missing = store.enqueue(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(missing, JobQueueError::NotFound(_)));

    let job = store.submit("rg").await.expect("submit");
    let err = store.enqueue(job.job_id).await.unwrap_err();
    match err {
        JobQueueError::InvalidTransition { from, to, .. } => {
            assert_eq!(from, JobStatus::Queued);
            assert_eq!(to, JobStatus::Queued);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn read_missing_job_is_not_found() {
    let store = memory_store().await;
    let err = store.read(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, JobQueueError::NotFound(_)));
}

#[tokio::test]
async fn claim_is_fifo_by_creation_time() {
    let store = memory_store().await;

    let first = store.submit("first").await.expect("submit");
    let second = store.submit("second").await.expect("submit");
    let third = store.submit("third").await.expect("submit");

    for expected in [first.job_id, second.job_id, third.job_id] {
        let claimed = store.claim_next().await.expect("claim").expect("job");
        assert_eq!(claimed.job_id, expected);
        assert_eq!(claimed.status, JobStatus::Running);
        assert!(claimed.started_at.is_some());
    }
    assert!(store.claim_next().await.expect("claim").is_none());
}

#[tokio::test]
async fn claim_skips_pending_jobs() {
    let store = memory_store().await;
    store.insert("still-pending").await.expect("insert");
    assert!(store.claim_next().await.expect("claim").is_none());
}

#[tokio::test]
async fn concurrent_claimers_never_share_a_job() {
    // File-backed DB so multiple pool connections really share one store.
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("claims.db");
    let mut config = DbConnectionConfig::new(format!("sqlite://{}", db_path.display()));
    config.max_connections = 4;
    let pool = create_pool(&config).await.expect("create pool");
    mealhub_migrations::migrator()
        .run(&pool)
        .await
        .expect("run migrations");
    let store = JobStore::new(pool);

    let mut expected = Vec::new();
    for i in 0..12 {
        expected.push(store.submit(&format!("rg-{i}")).await.expect("submit").job_id);
    }

    let mut handles = Vec::new();
    for _ in 0..4 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let mut claimed = Vec::new();
            while let Some(job) = store.claim_next().await.expect("claim") {
                claimed.push(job.job_id);
            }
            claimed
        }));
    }

    let mut all_claimed = Vec::new();
    for handle in handles {
        all_claimed.extend(handle.await.expect("join"));
    }

    all_claimed.sort();
    let mut deduped = all_claimed.clone();
    deduped.dedup();
    assert_eq!(all_claimed.len(), expected.len(), "every job claimed once");
    assert_eq!(deduped.len(), expected.len(), "no job claimed twice");

    expected.sort();
    assert_eq!(all_claimed, expected);
}

#[tokio::test]
async fn sweep_fails_only_jobs_past_the_timeout() {
    let store = memory_store().await;

    let stuck = store.submit("stuck").await.expect("submit");
    let fresh = store.submit("fresh").await.expect("submit");
    store.claim_next().await.expect("claim").expect("stuck running");
    store.claim_next().await.expect("claim").expect("fresh running");

    // Backdate the first job well past the timeout.
    let old = Utc::now() - Duration::from_secs(2 * 60 * 60);
    sqlx::query("UPDATE jobs SET started_at = ? WHERE job_id = ?")
        .bind(old)
        .bind(stuck.job_id)
        .execute(store.pool())
        .await
        .expect("backdate");

    let swept = store
        .sweep_stuck(Duration::from_secs(30 * 60))
        .await
        .expect("sweep");
    assert_eq!(swept, vec![stuck.job_id]);

    let failed = store.read(stuck.job_id).await.expect("read");
    assert_eq!(failed.status, JobStatus::Failed);
    assert!(failed.finished_at.is_some());

    let untouched = store.read(fresh.job_id).await.expect("read");
    assert_eq!(untouched.status, JobStatus::Running);
    assert!(untouched.finished_at.is_none());
}

#[tokio::test]
async fn orphan_recovery_requeues_and_is_idempotent() {
    let store = memory_store().await;

    let a = store.submit("a").await.expect("submit");
    let b = store.submit("b").await.expect("submit");
    store.claim_next().await.expect("claim").expect("a running");
    store.claim_next().await.expect("claim").expect("b running");

    let mut recovered = store.recover_orphans().await.expect("recover");
    recovered.sort();
    let mut expected = vec![a.job_id, b.job_id];
    expected.sort();
    assert_eq!(recovered, expected);

    for id in [a.job_id, b.job_id] {
        let job = store.read(id).await.expect("read");
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.started_at.is_none());
    }

    // Second run with no intervening claims changes nothing.
    assert!(store.recover_orphans().await.expect("recover").is_empty());
    assert_eq!(store.count_by_status(JobStatus::Queued).await.unwrap(), 2);
}

#[tokio::test]
async fn terminal_jobs_are_never_resurrected() {
    let store = memory_store().await;

    let job = store.submit("done").await.expect("submit");
    store.claim_next().await.expect("claim").expect("running");
    assert!(store.mark_completed(job.job_id).await.expect("complete"));

    // None of the recovery paths touch a terminal row.
    assert!(store
        .sweep_stuck(Duration::from_secs(0))
        .await
        .expect("sweep")
        .is_empty());
    assert!(store.recover_orphans().await.expect("recover").is_empty());
    assert!(store.claim_next().await.expect("claim").is_none());
    assert!(!store.mark_failed(job.job_id).await.expect("mark"));

    let final_state = store.read(job.job_id).await.expect("read");
    assert_eq!(final_state.status, JobStatus::Completed);
}

#[tokio::test]
async fn completion_after_sweep_is_a_noop() {
    let store = memory_store().await;

    let job = store.submit("slow").await.expect("submit");
    store.claim_next().await.expect("claim").expect("running");

    let old = Utc::now() - Duration::from_secs(60 * 60);
    sqlx::query("UPDATE jobs SET started_at = ? WHERE job_id = ?")
        .bind(old)
        .bind(job.job_id)
        .execute(store.pool())
        .await
        .expect("backdate");
    store
        .sweep_stuck(Duration::from_secs(30 * 60))
        .await
        .expect("sweep");

    // The worker finishing late loses the race and must not overwrite.
    assert!(!store.mark_completed(job.job_id).await.expect("mark"));
    let final_state = store.read(job.job_id).await.expect("read");
    assert_eq!(final_state.status, JobStatus::Failed);
}

#[tokio::test]
async fn list_by_status_orders_oldest_first() {
    let store = memory_store().await;
    let first = store.submit("one").await.expect("submit");
    let second = store.submit("two").await.expect("submit");

    let queued = store.list_by_status(JobStatus::Queued).await.expect("list");
    assert_eq!(
        queued.iter().map(|j| j.job_id).collect::<Vec<_>>(),
        vec![first.job_id, second.job_id]
    );
    assert!(store
        .list_by_status(JobStatus::Running)
        .await
        .expect("list")
        .is_empty());
}
