//! Test: Observed state sequences follow Pending -> Running -> terminal

use crate::helpers::*;
use jobrunner::core::JobState;
use jobrunner::execution::{AdmissionPolicy, JobPool};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Records every distinct state of one job until told to stop
fn watch(pool: Arc<JobPool>, name: &'static str, done: CancellationToken) -> JoinHandle<Vec<JobState>> {
    tokio::spawn(async move {
        let mut seen: Vec<JobState> = Vec::new();
        loop {
            if let Some(state) = pool.get_state(name).await {
                if seen.last() != Some(&state) {
                    seen.push(state);
                }
            }
            if done.is_cancelled() {
                return seen;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
}

fn rank(state: JobState) -> u8 {
    match state {
        JobState::Pending => 0,
        JobState::Running => 1,
        _ => 2,
    }
}

/// Samples may skip a state, but never go backwards or leave a terminal state
fn assert_lifecycle(seen: &[JobState], terminal: JobState) {
    assert!(!seen.is_empty(), "no state observed");
    for pair in seen.windows(2) {
        assert!(
            rank(pair[0]) < rank(pair[1]),
            "state went from {:?} to {:?} in {:?}",
            pair[0],
            pair[1],
            seen
        );
    }
    assert_eq!(seen.last(), Some(&terminal), "sequence {:?}", seen);
}

#[tokio::test]
async fn test_completed_job_lifecycle() {
    let runner = RecordingRunner::with_delay(Duration::from_millis(20));
    let pool = Arc::new(JobPool::start(
        &settings(1, 4, AdmissionPolicy::Block),
        runner.clone(),
    ));
    let done = CancellationToken::new();
    let watcher = watch(pool.clone(), "build", done.clone());

    pool.submit(make_job("build", &["true", "true", "true"]))
        .await
        .unwrap();
    assert_eq!(wait_terminal(&pool, "build").await, JobState::Completed);

    // Terminal state survives a cancel request and shutdown
    assert!(!pool.cancel("build").await);
    pool.stop().await;
    tokio::time::sleep(Duration::from_millis(30)).await;
    done.cancel();

    let seen = watcher.await.unwrap();
    assert_lifecycle(&seen, JobState::Completed);
    assert!(seen.contains(&JobState::Running), "sequence {:?}", seen);
    assert_eq!(pool.get_state("build").await, Some(JobState::Completed));
}

#[tokio::test]
async fn test_cancelled_job_lifecycle() {
    let runner = RecordingRunner::new();
    let pool = Arc::new(JobPool::start(
        &settings(1, 4, AdmissionPolicy::Block),
        runner.clone(),
    ));
    let done = CancellationToken::new();
    let watcher = watch(pool.clone(), "deploy", done.clone());

    pool.submit(make_job("deploy", &["true", "block", "true"]))
        .await
        .unwrap();
    wait_for_calls(&runner, 2).await;
    assert!(pool.cancel("deploy").await);
    assert_eq!(wait_terminal(&pool, "deploy").await, JobState::Cancelled);

    // Releasing the gate and stopping must not revive the job
    runner.open_gate();
    assert!(!pool.cancel("deploy").await);
    pool.stop().await;
    tokio::time::sleep(Duration::from_millis(30)).await;
    done.cancel();

    let seen = watcher.await.unwrap();
    assert_lifecycle(&seen, JobState::Cancelled);
    assert!(seen.contains(&JobState::Running), "sequence {:?}", seen);
    assert_eq!(runner.commands_for("deploy"), vec!["true", "block"]);
}
