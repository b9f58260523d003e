//! Test: Worker count bounds concurrent execution

use crate::helpers::*;
use jobrunner::core::JobState;
use jobrunner::execution::{AdmissionPolicy, JobPool};
use std::time::Duration;

async fn run_batch(workers: usize, jobs: usize) -> usize {
    let runner = RecordingRunner::with_delay(Duration::from_millis(50));
    let pool = JobPool::start(&settings(workers, 16, AdmissionPolicy::Block), runner.clone());

    let names: Vec<String> = (0..jobs).map(|i| format!("job-{}", i)).collect();
    for name in &names {
        pool.submit(make_job(name, &["true", "true"])).await.unwrap();
    }
    for name in &names {
        assert_eq!(wait_terminal(&pool, name).await, JobState::Completed);
    }

    assert_eq!(runner.calls().len(), jobs * 2);
    assert_eq!(runner.active(), 0);
    pool.stop().await;
    runner.peak_concurrency()
}

#[tokio::test]
async fn test_never_exceeds_worker_count() {
    let peak = run_batch(3, 9).await;
    assert!(peak <= 3, "peak concurrency {} exceeds 3 workers", peak);
    assert_eq!(peak, 3);
}

#[tokio::test]
async fn test_single_worker_runs_serially() {
    assert_eq!(run_batch(1, 4).await, 1);
}

#[tokio::test]
async fn test_single_worker_preserves_fifo() {
    let runner = RecordingRunner::new();
    let pool = JobPool::start(&settings(1, 8, AdmissionPolicy::Block), runner.clone());

    let names = ["a", "b", "c", "d"];
    for name in names {
        pool.submit(make_job(name, &["true"])).await.unwrap();
    }
    for name in names {
        wait_terminal(&pool, name).await;
    }

    assert_eq!(runner.job_order(), names);
    pool.stop().await;
}
