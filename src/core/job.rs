//! Job and job lifecycle models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A submitted unit of work
///
/// `name` is the lookup key for job state and cancellation. `id` is the
/// caller's own identifier and is only carried along for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Opaque external identifier
    pub id: String,

    /// Registry key, unique among live jobs
    pub name: String,

    /// Raw pipeline definition (YAML)
    pub pipeline: String,
}

impl Job {
    pub fn new(id: impl Into<String>, name: impl Into<String>, pipeline: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            pipeline: pipeline.into(),
        }
    }

    /// Create a job with a freshly generated id
    pub fn with_generated_id(name: impl Into<String>, pipeline: impl Into<String>) -> Self {
        Self::new(Uuid::new_v4().to_string(), name, pipeline)
    }
}

/// Lifecycle state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Admitted, waiting in the queue
    Pending,
    /// A worker is executing its steps
    Running,
    /// Parse error or a step exited unsuccessfully
    Failed,
    /// Cancelled by request or by pool shutdown
    Cancelled,
    /// Every step succeeded
    Completed,
    /// Refused by admission, never scheduled
    Rejected,
}

impl JobState {
    /// Check if the state is final
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Failed | JobState::Cancelled | JobState::Completed | JobState::Rejected
        )
    }

    /// Check if a job in this state still occupies its name
    pub fn is_live(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
            JobState::Completed => "completed",
            JobState::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Registry entry for one job name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// External id of the job currently holding the name
    pub job_id: String,

    /// Current lifecycle state
    pub state: JobState,

    /// When the job was admitted
    pub submitted_at: DateTime<Utc>,

    /// When the state last changed
    pub updated_at: DateTime<Utc>,

    /// Diagnostic text for failures (parse error, failing step output)
    pub detail: Option<String>,
}

impl JobRecord {
    pub fn pending(job_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            job_id: job_id.into(),
            state: JobState::Pending,
            submitted_at: now,
            updated_at: now,
            detail: None,
        }
    }
}
