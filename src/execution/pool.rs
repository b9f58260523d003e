//! Worker pool - the job runner's entry point

use crate::{
    core::{Job, JobRecord, JobState, JobStateRegistry, PoolSettings},
    execution::{AdmissionError, AdmissionPolicy, AdmissionQueue, CancellationRegistry, PipelineExecutor},
    runner::CommandRunner,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// A fixed set of workers draining one admission queue
///
/// Construct one per process and share it (e.g., behind an `Arc`) with the
/// code that submits and inspects jobs. Each worker runs one job at a time,
/// so at most `worker_count` jobs execute concurrently.
pub struct JobPool {
    queue: Arc<AdmissionQueue>,
    states: Arc<JobStateRegistry>,
    cancels: Arc<CancellationRegistry>,
    shutdown: CancellationToken,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
}

impl JobPool {
    /// Create the pool and spawn its workers on the current tokio runtime
    pub fn start<R>(settings: &PoolSettings, runner: R) -> Self
    where
        R: CommandRunner + 'static,
    {
        let worker_count = settings.worker_count.max(1);
        let queue = Arc::new(AdmissionQueue::new(settings.queue_capacity, settings.strategy));
        let states = Arc::new(JobStateRegistry::new());
        let cancels = Arc::new(CancellationRegistry::new());
        let shutdown = CancellationToken::new();
        let executor = Arc::new(PipelineExecutor::new(runner, states.clone()));

        let workers = (0..worker_count)
            .map(|id| {
                tokio::spawn(worker_loop(
                    id,
                    queue.clone(),
                    cancels.clone(),
                    executor.clone(),
                    shutdown.clone(),
                ))
            })
            .collect();

        info!(
            workers = worker_count,
            capacity = settings.queue_capacity,
            strategy = ?settings.strategy,
            "Job pool started"
        );

        Self {
            queue,
            states,
            cancels,
            shutdown,
            workers: Mutex::new(workers),
            worker_count,
        }
    }

    /// Admit a job for execution
    ///
    /// The job is recorded `Pending` before the queue is consulted. If the
    /// queue refuses it the record becomes `Rejected`. Under
    /// `AdmissionPolicy::Block` this waits for a free slot.
    pub async fn submit(&self, job: Job) -> Result<(), AdmissionError> {
        if !self.states.try_admit(&job).await {
            warn!(job = %job.name, "A job with this name is still live");
            return Err(AdmissionError::DuplicateName(job.name));
        }

        let name = job.name.clone();
        if let Err(e) = self.queue.push(job).await {
            self.states
                .set_outcome(&name, JobState::Rejected, Some(e.to_string()))
                .await;
            return Err(e);
        }
        Ok(())
    }

    /// Current state of the job `name`, `None` if it was never submitted
    pub async fn get_state(&self, name: &str) -> Option<JobState> {
        self.states.get_state(name).await
    }

    /// Full record of the job `name`
    pub async fn record(&self, name: &str) -> Option<JobRecord> {
        self.states.record(name).await
    }

    /// Request cancellation of a running job
    ///
    /// Returns false if the job is not currently executing. A job still
    /// waiting in the queue is not affected.
    pub async fn cancel(&self, name: &str) -> bool {
        self.cancels.cancel(name).await
    }

    /// Shared state registry, for callers that list jobs
    pub fn states(&self) -> Arc<JobStateRegistry> {
        self.states.clone()
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn policy(&self) -> AdmissionPolicy {
        self.queue.policy()
    }

    /// Number of executing jobs that can still be cancelled
    pub async fn running(&self) -> usize {
        self.cancels.len().await
    }

    /// Number of jobs waiting for a worker
    pub async fn queued(&self) -> usize {
        self.queue.len().await
    }

    pub async fn queue_capacity(&self) -> usize {
        self.queue.capacity().await
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Stop the pool
    ///
    /// Signals shutdown, which cancels every running job, and waits for all
    /// workers to exit. Jobs still queued are never started: they are marked
    /// `Cancelled` and their names returned. Later submissions are rejected.
    pub async fn stop(&self) -> Vec<String> {
        info!("Stopping job pool");
        self.shutdown.cancel();

        let workers = std::mem::take(&mut *self.workers.lock().await);
        for handle in workers {
            if let Err(e) = handle.await {
                error!(error = %e, "Worker task ended abnormally");
            }
        }

        let abandoned = self.queue.close().await;
        let mut names = Vec::with_capacity(abandoned.len());
        for job in abandoned {
            self.states
                .set_outcome(
                    &job.name,
                    JobState::Cancelled,
                    Some("Pool shut down before the job started".to_string()),
                )
                .await;
            names.push(job.name);
        }

        if !names.is_empty() {
            warn!(count = names.len(), "Queued jobs cancelled at shutdown");
        }
        info!("Job pool stopped");
        names
    }
}

impl Drop for JobPool {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn worker_loop<R: CommandRunner>(
    id: usize,
    queue: Arc<AdmissionQueue>,
    cancels: Arc<CancellationRegistry>,
    executor: Arc<PipelineExecutor<R>>,
    shutdown: CancellationToken,
) {
    info!(worker = id, "Worker started");

    loop {
        let job = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            job = queue.pop() => match job {
                Some(job) => job,
                None => break,
            },
        };

        let token = shutdown.child_token();
        let ticket = cancels.register(&job.name, token.clone()).await;
        info!(worker = id, job = %job.name, job_id = %job.id, "Running job");

        executor.execute(&job, &token).await;

        cancels.unregister(&job.name, ticket).await;
    }

    info!(worker = id, "Worker stopped");
}
