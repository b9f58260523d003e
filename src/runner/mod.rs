//! Step runners - how a single pipeline step is executed

pub mod output;
pub mod shell;

use crate::core::{Job, StepConfig};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use output::{StepExecutionError, StepOutput};
pub use shell::ShellRunner;

/// Trait for step execution - allows for different implementations
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run one step of `job` to completion, or until `cancel` fires
    async fn run(
        &self,
        job: &Job,
        step: &StepConfig,
        cancel: &CancellationToken,
    ) -> Result<StepOutput, StepExecutionError>;
}

#[async_trait]
impl<T: CommandRunner + ?Sized> CommandRunner for std::sync::Arc<T> {
    async fn run(
        &self,
        job: &Job,
        step: &StepConfig,
        cancel: &CancellationToken,
    ) -> Result<StepOutput, StepExecutionError> {
        (**self).run(job, step, cancel).await
    }
}
