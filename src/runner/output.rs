//! Step output and error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for running a single step
#[derive(Debug, Error)]
pub enum StepExecutionError {
    #[error("Failed to run step '{step}': {source}")]
    Io {
        step: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Step '{step}' exited with code {exit_code}")]
    Exited {
        step: String,
        exit_code: i32,
        output: String,
    },

    #[error("Step '{step}' was cancelled")]
    Cancelled { step: String },
}

impl StepExecutionError {
    /// Captured output of the failing process, if it ran to exit
    pub fn output(&self) -> Option<&str> {
        match self {
            StepExecutionError::Exited { output, .. } => Some(output),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, StepExecutionError::Cancelled { .. })
    }

    /// Error text followed by captured output, for the job record
    pub fn diagnostic(&self) -> String {
        match self.output() {
            Some(output) if !output.trim().is_empty() => {
                format!("{}\n{}", self, output.trim_end())
            }
            _ => self.to_string(),
        }
    }
}

/// Output of a step that exited successfully
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutput {
    /// Combined stdout and stderr
    pub content: String,

    /// Process exit code
    pub exit_code: i32,
}

impl StepOutput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            exit_code: 0,
        }
    }
}
