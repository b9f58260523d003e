//! jobrunner - A CI-style job pool running YAML pipelines as shell steps

pub mod cli;
pub mod core;
pub mod execution;
pub mod runner;

// Re-export commonly used types
pub use crate::core::{Job, JobRecord, JobState, PipelineConfig, PoolSettings, StepConfig};
pub use crate::execution::{AdmissionError, AdmissionPolicy, JobPool};
pub use crate::runner::{CommandRunner, ShellRunner, StepExecutionError, StepOutput};
