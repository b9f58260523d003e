//! CLI command definitions

use crate::core::PoolSettings;
use crate::execution::AdmissionPolicy;
use clap::Args;
use std::path::PathBuf;

/// Submit pipelines and wait for them to finish
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Pipeline YAML files, one job per file
    #[arg(short, long = "file", required = true)]
    pub files: Vec<PathBuf>,

    /// Pool settings file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of workers
    #[arg(long)]
    pub workers: Option<usize>,

    /// Initial queue capacity
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Admission policy when the queue is full
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Shell used to run step commands
    #[arg(long)]
    pub shell: Option<String>,

    /// Working directory for step commands
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

impl RunCommand {
    /// Apply command-line overrides on top of file settings
    pub fn apply_overrides(&self, settings: &mut PoolSettings) {
        if let Some(workers) = self.workers {
            settings.worker_count = workers;
        }
        if let Some(capacity) = self.capacity {
            settings.queue_capacity = capacity;
        }
        if let Some(strategy) = self.strategy {
            settings.strategy = strategy.into();
        }
        if let Some(shell) = &self.shell {
            settings.shell = shell.clone();
        }
        if let Some(workspace) = &self.workspace {
            settings.workspace = Some(workspace.clone());
        }
    }
}

/// Validate a pipeline definition
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Admission policy argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StrategyArg {
    Block,
    Drop,
    Expand,
}

impl From<StrategyArg> for AdmissionPolicy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Block => AdmissionPolicy::Block,
            StrategyArg::Drop => AdmissionPolicy::Drop,
            StrategyArg::Expand => AdmissionPolicy::Expand,
        }
    }
}
