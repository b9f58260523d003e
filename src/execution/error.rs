use thiserror::Error;

/// Reasons a job submission is refused
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("Job queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("Job pool is shut down")]
    Closed,

    #[error("A job named '{0}' is already pending or running")]
    DuplicateName(String),
}
