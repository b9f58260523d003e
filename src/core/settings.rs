//! Pool settings loaded from YAML

use crate::execution::AdmissionPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Job pool configuration
///
/// Keys that belong to the surrounding web service (database, JWT, ...) may
/// live in the same file and are ignored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSettings {
    /// Number of worker loops
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Initial admission queue capacity
    #[serde(default = "default_queue_capacity", alias = "task_pool_size")]
    pub queue_capacity: usize,

    /// What to do when the queue is full
    #[serde(default)]
    pub strategy: AdmissionPolicy,

    /// Interpreter used as `<shell> -c <command>`
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Working directory for step processes
    #[serde(default)]
    pub workspace: Option<PathBuf>,
}

fn default_worker_count() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    16
}

fn default_shell() -> String {
    "bash".to_string()
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            queue_capacity: default_queue_capacity(),
            strategy: AdmissionPolicy::default(),
            shell: default_shell(),
            workspace: None,
        }
    }
}

impl PoolSettings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse settings from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let settings: PoolSettings =
            serde_yaml::from_str(yaml).context("Failed to parse pool settings")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            anyhow::bail!("worker_count must be at least 1");
        }
        if self.queue_capacity == 0 {
            anyhow::bail!("queue_capacity must be at least 1");
        }
        if self.shell.trim().is_empty() {
            anyhow::bail!("shell must not be empty");
        }
        if let Some(workspace) = &self.workspace {
            if !workspace.is_dir() {
                anyhow::bail!("workspace {} is not a directory", workspace.display());
            }
        }
        Ok(())
    }
}
