//! Test utility functions for jobrunner
#![allow(dead_code)]

use async_trait::async_trait;
use jobrunner::core::{Job, JobState, PoolSettings, StepConfig};
use jobrunner::execution::{AdmissionPolicy, JobPool};
use jobrunner::runner::{CommandRunner, StepExecutionError, StepOutput};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Polling interval for state waits
pub const POLL: Duration = Duration::from_millis(10);

/// Upper bound on any state wait
pub const WAIT_LIMIT: Duration = Duration::from_secs(5);

/// Mock runner that records every step it runs
///
/// Commands are interpreted, never spawned:
/// - `false` fails with exit code 1
/// - `block` waits until the gate opens or the step is cancelled
/// - anything else succeeds, after the configured delay
pub struct RecordingRunner {
    calls: Mutex<Vec<(String, String)>>,
    active: AtomicUsize,
    peak: AtomicUsize,
    delay: Option<Duration>,
    gate: CancellationToken,
}

impl RecordingRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::build(None))
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self::build(Some(delay)))
    }

    fn build(delay: Option<Duration>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            delay,
            gate: CancellationToken::new(),
        }
    }

    /// Let every `block` step, current and future, finish
    pub fn open_gate(&self) {
        self.gate.cancel();
    }

    /// `(job name, step command)` pairs in start order
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Commands run for one job, in order
    pub fn commands_for(&self, job: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(name, _)| name == job)
            .map(|(_, command)| command)
            .collect()
    }

    /// Job names in the order their first step started
    pub fn job_order(&self) -> Vec<String> {
        let mut order: Vec<String> = Vec::new();
        for (name, _) in self.calls() {
            if !order.contains(&name) {
                order.push(name);
            }
        }
        order
    }

    /// Most steps ever running at the same time
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(
        &self,
        job: &Job,
        step: &StepConfig,
        cancel: &CancellationToken,
    ) -> Result<StepOutput, StepExecutionError> {
        self.calls
            .lock()
            .unwrap()
            .push((job.name.clone(), step.command.clone()));
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let result = self.interpret(step, cancel).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl RecordingRunner {
    async fn interpret(
        &self,
        step: &StepConfig,
        cancel: &CancellationToken,
    ) -> Result<StepOutput, StepExecutionError> {
        let cancelled = || StepExecutionError::Cancelled {
            step: step.name.clone(),
        };

        if step.command == "block" {
            return tokio::select! {
                _ = self.gate.cancelled() => Ok(StepOutput::new("released")),
                _ = cancel.cancelled() => Err(cancelled()),
            };
        }

        if let Some(delay) = self.delay {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => return Err(cancelled()),
            }
        }

        if step.command == "false" {
            return Err(StepExecutionError::Exited {
                step: step.name.clone(),
                exit_code: 1,
                output: format!("{} failed", step.name),
            });
        }
        Ok(StepOutput::new(format!("{} ok", step.name)))
    }
}

/// Pipeline YAML with one step per command, named s1, s2, ...
pub fn pipeline_yaml(commands: &[&str]) -> String {
    if commands.is_empty() {
        return "name: empty\nsteps: []\n".to_string();
    }
    let mut yaml = String::from("name: test\nsteps:\n");
    for (index, command) in commands.iter().enumerate() {
        yaml.push_str(&format!(
            "  - name: s{}\n    command: \"{}\"\n",
            index + 1,
            command
        ));
    }
    yaml
}

pub fn make_job(name: &str, commands: &[&str]) -> Job {
    Job::new(format!("id-{}", name), name, pipeline_yaml(commands))
}

pub fn settings(workers: usize, capacity: usize, strategy: AdmissionPolicy) -> PoolSettings {
    PoolSettings {
        worker_count: workers,
        queue_capacity: capacity,
        strategy,
        ..PoolSettings::default()
    }
}

/// Wait until `name` reaches `state`
pub async fn wait_for_state(pool: &JobPool, name: &str, state: JobState) {
    let deadline = tokio::time::Instant::now() + WAIT_LIMIT;
    loop {
        let current = pool.get_state(name).await;
        if current == Some(state) {
            return;
        }
        if tokio::time::Instant::now() > deadline {
            panic!("job {} stuck at {:?}, expected {:?}", name, current, state);
        }
        tokio::time::sleep(POLL).await;
    }
}

/// Wait until `name` is terminal and return its state
pub async fn wait_terminal(pool: &JobPool, name: &str) -> JobState {
    let deadline = tokio::time::Instant::now() + WAIT_LIMIT;
    loop {
        let current = pool.get_state(name).await;
        if let Some(state) = current.filter(JobState::is_terminal) {
            return state;
        }
        if tokio::time::Instant::now() > deadline {
            panic!("job {} never finished, last state {:?}", name, current);
        }
        tokio::time::sleep(POLL).await;
    }
}

/// Wait until the runner has started `count` steps
pub async fn wait_for_calls(runner: &RecordingRunner, count: usize) {
    let deadline = tokio::time::Instant::now() + WAIT_LIMIT;
    while runner.calls().len() < count {
        if tokio::time::Instant::now() > deadline {
            panic!("only {} of {} steps started", runner.calls().len(), count);
        }
        tokio::time::sleep(POLL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_yaml_parses() {
        let yaml = pipeline_yaml(&["true", "echo hi"]);
        let config = jobrunner::core::PipelineConfig::from_yaml(&yaml).unwrap();
        assert_eq!(config.step_names(), vec!["s1", "s2"]);
        assert_eq!(config.steps[1].command, "echo hi");
    }

    #[test]
    fn test_empty_pipeline_yaml_parses() {
        let config = jobrunner::core::PipelineConfig::from_yaml(&pipeline_yaml(&[])).unwrap();
        assert!(config.steps.is_empty());
    }
}
