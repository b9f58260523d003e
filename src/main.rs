use anyhow::{Context, Result};
use jobrunner::cli::commands::{RunCommand, ValidateCommand};
use jobrunner::cli::output::*;
use jobrunner::cli::{Cli, Command};
use jobrunner::core::{Job, JobState, PipelineConfig, PoolSettings};
use jobrunner::execution::JobPool;
use jobrunner::runner::ShellRunner;
use std::path::Path;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// How often the run command polls job states
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let all_completed = match &cli.command {
        Command::Run(cmd) => run_jobs(cmd).await?,
        Command::Validate(cmd) => validate_pipeline(cmd)?,
    };

    if !all_completed {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_jobs(cmd: &RunCommand) -> Result<bool> {
    let mut settings = match &cmd.config {
        Some(path) => PoolSettings::from_file(path)?,
        None => PoolSettings::default(),
    };
    cmd.apply_overrides(&mut settings);
    settings.validate().context("Invalid pool settings")?;

    let mut jobs = Vec::with_capacity(cmd.files.len());
    for file in &cmd.files {
        let pipeline = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read pipeline {}", file.display()))?;
        jobs.push(Job::with_generated_id(job_name(file), pipeline));
    }

    let total = jobs.len();
    let pool = JobPool::start(&settings, ShellRunner::from_settings(&settings));

    if !cmd.json {
        println!(
            "{} Starting {} job(s) on {} worker(s), {:?} admission",
            ROCKET,
            style(total).cyan(),
            style(pool.worker_count()).cyan(),
            pool.policy()
        );
    }

    let mut names = Vec::with_capacity(jobs.len());
    for job in jobs {
        let name = job.name.clone();
        match pool.submit(job).await {
            Ok(()) => names.push(name),
            Err(e) => {
                warn!(job = %name, error = %e, "Job not admitted");
                // A rejected job still has a record; a duplicate name does not
                if pool.record(&name).await.is_some_and(|r| r.state == JobState::Rejected) {
                    names.push(name);
                } else if !cmd.json {
                    println!("{} {}: {}", WARN, style(&name).bold(), style(e).yellow());
                }
            }
        }
    }

    let interrupted = wait_for_jobs(&pool, &names, cmd.json).await;
    if interrupted {
        warn!("Interrupted, stopping job pool");
    }
    let abandoned = pool.stop().await;
    if !abandoned.is_empty() && !cmd.json {
        println!(
            "{} {} queued job(s) never started",
            WARN,
            style(abandoned.len()).yellow()
        );
    }

    // Every admitted or rejected job holds a record; duplicates never got one
    let records = pool.states().snapshot().await;
    let all_completed = records.len() == total
        && records
            .iter()
            .all(|(_, record)| record.state == JobState::Completed);

    if cmd.json {
        let reports: Vec<JobReport<'_>> = records
            .iter()
            .map(|(name, record)| JobReport { name, record })
            .collect();
        let data = serde_json::json!({ "jobs": reports });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        println!();
        for (name, record) in &records {
            println!("{}", format_record(name, record));
        }
        if all_completed {
            println!("\n{} All jobs completed {}", CHECK, style("successfully").green());
        } else {
            let states = pool.states();
            println!(
                "\n{} Some jobs did not complete: {} failed, {} cancelled, {} rejected",
                CROSS,
                style(states.count(JobState::Failed).await).red(),
                style(states.count(JobState::Cancelled).await).yellow(),
                style(states.count(JobState::Rejected).await).magenta()
            );
        }
    }

    Ok(all_completed)
}

/// Poll until every named job is terminal or Ctrl-C arrives
///
/// Returns true if interrupted.
async fn wait_for_jobs(pool: &JobPool, names: &[String], quiet: bool) -> bool {
    let progress = (!quiet).then(|| create_progress_bar(names.len()));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let interrupted = loop {
        let mut finished = 0;
        for name in names {
            if pool.get_state(name).await.is_some_and(|s| s.is_terminal()) {
                finished += 1;
            }
        }

        if let Some(progress) = &progress {
            progress.set_position(finished as u64);
            progress.set_message(format!(
                "{} running, {} queued",
                pool.running().await,
                pool.queued().await
            ));
        }
        if finished == names.len() {
            break false;
        }

        tokio::select! {
            _ = &mut ctrl_c => break true,
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
        }
    };

    if let Some(progress) = progress {
        progress.finish_and_clear();
    }
    interrupted
}

/// Job name derived from the pipeline file name
fn job_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<bool> {
    if !cmd.json {
        println!("{} Validating pipeline...", INFO);
    }

    match PipelineConfig::from_file(&cmd.file) {
        Ok(config) => {
            if cmd.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("{} Pipeline definition is valid!", CHECK);
                println!("{}", format_pipeline(&config));
            }
            Ok(true)
        }
        Err(e) => {
            if cmd.json {
                let data = validation_error_json(&cmd.file, &e);
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                println!("{} Validation failed:", CROSS);
                println!("  {}", style(e).red());
            }
            Ok(false)
        }
    }
}
