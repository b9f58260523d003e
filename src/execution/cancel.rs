//! Cancellation handles for running jobs

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Concurrency-safe mapping from job name to the token of its execution
///
/// A handle exists only while a worker is executing the job. Both `cancel`
/// and `unregister` take the entry out of the map under the lock, so at most
/// one of them ever observes it.
#[derive(Debug, Default)]
pub struct CancellationRegistry {
    handles: Mutex<HashMap<String, Handle>>,
    next_ticket: AtomicU64,
}

#[derive(Debug)]
struct Handle {
    ticket: u64,
    token: CancellationToken,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handle for a job that is about to execute
    ///
    /// The returned ticket identifies this registration for `unregister`.
    pub async fn register(&self, name: &str, token: CancellationToken) -> u64 {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        self.handles
            .lock()
            .await
            .insert(name.to_string(), Handle { ticket, token });
        ticket
    }

    /// Cancel the running job `name`
    ///
    /// Returns false if no handle is registered (job not started yet, or
    /// already finished).
    pub async fn cancel(&self, name: &str) -> bool {
        let taken = self.handles.lock().await.remove(name);
        match taken {
            Some(handle) => {
                info!(job = %name, "Cancelling job");
                handle.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Drop the handle for `name` once its execution has ended
    ///
    /// Only the registration identified by `ticket` is removed, so a worker
    /// finishing late cannot drop the handle of a rerun under the same name.
    /// Returns false if a cancellation already took it.
    pub async fn unregister(&self, name: &str, ticket: u64) -> bool {
        let mut handles = self.handles.lock().await;
        match handles.get(name) {
            Some(handle) if handle.ticket == ticket => {
                handles.remove(name);
                true
            }
            _ => false,
        }
    }

    /// Number of jobs with an active handle
    pub async fn len(&self) -> usize {
        self.handles.lock().await.len()
    }
}
