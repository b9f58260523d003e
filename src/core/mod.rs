//! Core domain models
//!
//! Pipeline definitions, jobs and their lifecycle, the shared job state
//! registry, and pool settings.

pub mod config;
pub mod job;
pub mod settings;
pub mod state;

pub use config::{PipelineConfig, PipelineParseError, StepConfig};
pub use job::{Job, JobRecord, JobState};
pub use settings::PoolSettings;
pub use state::JobStateRegistry;
