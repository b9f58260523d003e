//! Shell subprocess runner - one process per step

use crate::core::{Job, PoolSettings, StepConfig};
use crate::runner::{CommandRunner, StepExecutionError, StepOutput};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Runs each step as `<shell> -c <command>`
#[derive(Debug, Clone)]
pub struct ShellRunner {
    /// Interpreter executable (e.g., "bash", "/bin/sh")
    shell: String,

    /// Working directory for spawned processes
    workspace: Option<PathBuf>,
}

impl ShellRunner {
    /// Create a runner for the given interpreter
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            workspace: None,
        }
    }

    pub fn from_settings(settings: &PoolSettings) -> Self {
        Self {
            shell: settings.shell.clone(),
            workspace: settings.workspace.clone(),
        }
    }

    pub fn with_workspace(mut self, workspace: impl Into<PathBuf>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    /// Spawn the step and wait for it, killing it if `cancel` fires
    ///
    /// Stdout and stderr are captured and joined into one output string.
    async fn run(
        &self,
        job: &Job,
        step: &StepConfig,
        cancel: &CancellationToken,
    ) -> Result<StepOutput, StepExecutionError> {
        debug!(job = %job.name, step = %step.name, shell = %self.shell, "Spawning step process");

        let mut command = Command::new(&self.shell);
        command
            .arg("-c")
            .arg(&step.command)
            .env("JOB_ID", &job.id)
            .env("JOB_NAME", &job.name)
            .env("STEP_NAME", &step.name)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.workspace {
            command.current_dir(dir);
        }

        let child = command.spawn().map_err(|source| StepExecutionError::Io {
            step: step.name.clone(),
            source,
        })?;

        // Dropping the wait future drops the child, which kills it.
        let output = tokio::select! {
            result = child.wait_with_output() => result.map_err(|source| StepExecutionError::Io {
                step: step.name.clone(),
                source,
            })?,
            _ = cancel.cancelled() => {
                warn!(job = %job.name, step = %step.name, "Step process killed by cancellation");
                return Err(StepExecutionError::Cancelled {
                    step: step.name.clone(),
                });
            }
        };

        let mut content = String::from_utf8_lossy(&output.stdout).into_owned();
        content.push_str(&String::from_utf8_lossy(&output.stderr));
        let exit_code = output.status.code().unwrap_or(-1);

        if !output.status.success() {
            return Err(StepExecutionError::Exited {
                step: step.name.clone(),
                exit_code,
                output: content,
            });
        }

        debug!(job = %job.name, step = %step.name, "Step returned {} bytes of output", content.len());
        Ok(StepOutput { content, exit_code })
    }
}
