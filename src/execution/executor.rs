//! Pipeline executor - runs the steps of one job in order

use crate::{
    core::{Job, JobState, JobStateRegistry, PipelineConfig},
    runner::CommandRunner,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Executes a job's pipeline and records its lifecycle in the state registry
pub struct PipelineExecutor<R> {
    runner: R,
    states: Arc<JobStateRegistry>,
}

impl<R: CommandRunner> PipelineExecutor<R> {
    pub fn new(runner: R, states: Arc<JobStateRegistry>) -> Self {
        Self { runner, states }
    }

    /// Run `job` to a terminal state and return that state
    ///
    /// Cancellation is checked at the top of every step. A step already
    /// running when `cancel` fires is killed by the runner and the job ends
    /// `Cancelled`. The first failing step ends the job `Failed` and the
    /// remaining steps are skipped.
    pub async fn execute(&self, job: &Job, cancel: &CancellationToken) -> JobState {
        let pipeline = match PipelineConfig::from_yaml(&job.pipeline) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                error!(job = %job.name, error = %e, "Failed to parse pipeline");
                return self.finish(job, JobState::Failed, Some(e.to_string())).await;
            }
        };

        info!(
            job = %job.name,
            pipeline = %pipeline.name,
            steps = pipeline.steps.len(),
            "Starting pipeline"
        );

        for step in &pipeline.steps {
            if cancel.is_cancelled() {
                info!(job = %job.name, step = %step.name, "Cancelled before step");
                return self.finish(job, JobState::Cancelled, None).await;
            }

            self.states.set_state(&job.name, JobState::Running).await;
            info!(job = %job.name, step = %step.name, command = %step.command, "Executing step");

            match self.runner.run(job, step, cancel).await {
                Ok(output) => {
                    debug!(
                        job = %job.name,
                        step = %step.name,
                        output = %output.content.trim_end(),
                        "Step finished"
                    );
                }
                Err(e) if e.is_cancelled() => {
                    info!(job = %job.name, step = %step.name, "Cancelled during step");
                    return self
                        .finish(job, JobState::Cancelled, Some(e.to_string()))
                        .await;
                }
                Err(e) => {
                    error!(
                        job = %job.name,
                        step = %step.name,
                        error = %e,
                        output = e.output().unwrap_or_default(),
                        "Step failed"
                    );
                    return self.finish(job, JobState::Failed, Some(e.diagnostic())).await;
                }
            }
        }

        self.finish(job, JobState::Completed, None).await
    }

    async fn finish(&self, job: &Job, state: JobState, detail: Option<String>) -> JobState {
        self.states.set_outcome(&job.name, state, detail).await;
        info!(job = %job.name, state = %state, "Job finished");
        state
    }
}
