//! Bounded admission queue with pluggable overflow policies

use crate::core::Job;
use crate::execution::AdmissionError;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::pin::pin;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, info};

/// Policy applied when a job arrives at a full queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionPolicy {
    /// Wait until a worker frees a slot
    #[default]
    Block,

    /// Refuse the job immediately
    Drop,

    /// Double the capacity and keep the job
    Expand,
}

struct QueueState {
    jobs: VecDeque<Job>,
    capacity: usize,
    closed: bool,
}

/// FIFO buffer between submitters and workers
///
/// The buffer, its capacity and the closed flag sit behind one lock, so an
/// expand is a single critical section: no job is lost, duplicated or
/// reordered, and a concurrent `pop` simply waits for the lock.
pub struct AdmissionQueue {
    state: Mutex<QueueState>,
    policy: AdmissionPolicy,
    not_empty: Notify,
    not_full: Notify,
}

impl AdmissionQueue {
    pub fn new(capacity: usize, policy: AdmissionPolicy) -> Self {
        Self {
            state: Mutex::new(QueueState {
                jobs: VecDeque::new(),
                capacity: capacity.max(1),
                closed: false,
            }),
            policy,
            not_empty: Notify::new(),
            not_full: Notify::new(),
        }
    }

    pub fn policy(&self) -> AdmissionPolicy {
        self.policy
    }

    /// Current capacity (grows under `Expand`, never shrinks)
    pub async fn capacity(&self) -> usize {
        self.state.lock().await.capacity
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.jobs.len()
    }

    /// Enqueue `job` according to the queue's policy
    ///
    /// Under `Block` this suspends until a slot frees up or the queue is
    /// closed.
    pub async fn push(&self, job: Job) -> Result<(), AdmissionError> {
        loop {
            let mut notified = pin!(self.not_full.notified());
            notified.as_mut().enable();

            {
                let mut state = self.state.lock().await;
                if state.closed {
                    return Err(AdmissionError::Closed);
                }

                if state.jobs.len() < state.capacity {
                    info!(job = %job.name, "Job added to the queue");
                    state.jobs.push_back(job);
                    drop(state);
                    self.not_empty.notify_one();
                    return Ok(());
                }

                match self.policy {
                    AdmissionPolicy::Block => {
                        debug!(job = %job.name, "Queue is full, waiting for a free slot");
                    }
                    AdmissionPolicy::Drop => {
                        info!(job = %job.name, capacity = state.capacity, "Queue is full, job dropped");
                        return Err(AdmissionError::QueueFull {
                            capacity: state.capacity,
                        });
                    }
                    AdmissionPolicy::Expand => {
                        let capacity = state.capacity.saturating_mul(2);
                        state.capacity = capacity;
                        info!(job = %job.name, capacity, "Queue expanded");
                        state.jobs.push_back(job);
                        drop(state);
                        self.not_empty.notify_one();
                        return Ok(());
                    }
                }
            }

            notified.await;
        }
    }

    /// Dequeue the oldest job, waiting until one is available
    ///
    /// Returns `None` once the queue is closed. Cancel-safe: a job is only
    /// removed in the same poll that returns it.
    pub async fn pop(&self) -> Option<Job> {
        loop {
            let mut notified = pin!(self.not_empty.notified());
            notified.as_mut().enable();

            {
                let mut state = self.state.lock().await;
                if state.closed {
                    return None;
                }
                if let Some(job) = state.jobs.pop_front() {
                    drop(state);
                    self.not_full.notify_one();
                    return Some(job);
                }
            }

            notified.await;
        }
    }

    /// Close the queue and hand back everything still buffered
    ///
    /// Blocked submitters get `AdmissionError::Closed`, waiting consumers get
    /// `None`.
    pub async fn close(&self) -> Vec<Job> {
        let abandoned: Vec<Job> = {
            let mut state = self.state.lock().await;
            state.closed = true;
            state.jobs.drain(..).collect()
        };
        self.not_full.notify_waiters();
        self.not_empty.notify_waiters();
        abandoned
    }
}
