//! Job state registry shared between workers and callers

use crate::core::job::{Job, JobRecord, JobState};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Concurrency-safe mapping from job name to its current state
///
/// Writes are last-writer-wins. The registry does not police transitions;
/// the worker pool is the only writer after admission.
#[derive(Debug, Default)]
pub struct JobStateRegistry {
    records: RwLock<HashMap<String, JobRecord>>,
}

impl JobStateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `job` as pending unless a live job already holds its name
    ///
    /// Check and insert happen under one write lock. Returns false when the
    /// name is taken by a pending or running job.
    pub async fn try_admit(&self, job: &Job) -> bool {
        let mut records = self.records.write().await;
        if let Some(existing) = records.get(&job.name) {
            if existing.state.is_live() {
                return false;
            }
        }
        records.insert(job.name.clone(), JobRecord::pending(&job.id));
        true
    }

    /// Overwrite the state for `name`
    pub async fn set_state(&self, name: &str, state: JobState) {
        self.write(name, state, None).await;
    }

    /// Overwrite the state for `name` and attach a diagnostic
    pub async fn set_outcome(&self, name: &str, state: JobState, detail: Option<String>) {
        self.write(name, state, detail).await;
    }

    async fn write(&self, name: &str, state: JobState, detail: Option<String>) {
        let mut records = self.records.write().await;
        let record = records
            .entry(name.to_string())
            .or_insert_with(|| JobRecord::pending(String::new()));
        record.state = state;
        record.updated_at = Utc::now();
        if detail.is_some() {
            record.detail = detail;
        }
    }

    /// Current state for `name`, `None` if it was never submitted
    pub async fn get_state(&self, name: &str) -> Option<JobState> {
        self.records.read().await.get(name).map(|r| r.state)
    }

    /// Full record for `name`
    pub async fn record(&self, name: &str) -> Option<JobRecord> {
        self.records.read().await.get(name).cloned()
    }

    /// All records, oldest submission first
    pub async fn snapshot(&self) -> Vec<(String, JobRecord)> {
        let records = self.records.read().await;
        let mut all: Vec<_> = records
            .iter()
            .map(|(name, record)| (name.clone(), record.clone()))
            .collect();
        all.sort_by_key(|(_, record)| record.submitted_at);
        all
    }

    /// Number of jobs currently in `state`
    pub async fn count(&self, state: JobState) -> usize {
        self.records
            .read()
            .await
            .values()
            .filter(|r| r.state == state)
            .count()
    }
}
