//! Pipeline definition parsing from YAML

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error produced when a pipeline definition cannot be decoded
#[derive(Debug, Error)]
pub enum PipelineParseError {
    #[error("Invalid pipeline YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Step '{0}' has an empty command")]
    EmptyCommand(String),

    #[error("Failed to read pipeline file: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level pipeline definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name (informational only)
    pub name: String,

    /// Steps in execution order
    pub steps: Vec<StepConfig>,
}

/// A single named shell step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepConfig {
    /// Human-readable step name
    pub name: String,

    /// Shell command run for this step
    pub command: String,
}

impl PipelineConfig {
    /// Load a pipeline definition from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PipelineParseError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a pipeline definition from raw YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self, PipelineParseError> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the parsed definition
    pub fn validate(&self) -> Result<(), PipelineParseError> {
        for step in &self.steps {
            if step.command.trim().is_empty() {
                return Err(PipelineParseError::EmptyCommand(step.name.clone()));
            }
        }
        Ok(())
    }

    /// Names of all steps, in execution order
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }
}
