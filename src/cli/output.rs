//! CLI output formatting

use crate::core::{JobRecord, JobState, PipelineConfig, PipelineParseError};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Lines of failure output shown per job
pub const DETAIL_LINES: usize = 10;

/// Create a progress bar
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    progress.set_style(style);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format a job state for display
pub fn format_state(state: JobState) -> String {
    match state {
        JobState::Pending => style("PENDING").dim().to_string(),
        JobState::Running => style("RUNNING").yellow().to_string(),
        JobState::Completed => style("COMPLETED").green().to_string(),
        JobState::Failed => style("FAILED").red().to_string(),
        JobState::Cancelled => style("CANCELLED").yellow().to_string(),
        JobState::Rejected => style("REJECTED").magenta().to_string(),
    }
}

fn state_icon(state: JobState) -> Emoji<'static, 'static> {
    match state {
        JobState::Completed => CHECK,
        JobState::Failed => CROSS,
        JobState::Pending | JobState::Running => SPINNER,
        JobState::Cancelled | JobState::Rejected => WARN,
    }
}

/// One line per job, followed by its failure detail if any
pub fn format_record(name: &str, record: &JobRecord) -> String {
    let elapsed = record
        .updated_at
        .signed_duration_since(record.submitted_at)
        .to_std()
        .unwrap_or_default();

    let mut line = format!(
        "{} {} ({}) - {} - {}",
        state_icon(record.state),
        style(name).bold(),
        style(short_id(&record.job_id)).dim(),
        format_state(record.state),
        style(format_duration(elapsed)).dim()
    );

    if let Some(detail) = &record.detail {
        for detail_line in format_output(detail, DETAIL_LINES).lines() {
            line.push_str("\n    ");
            line.push_str(detail_line);
        }
    }
    line
}

/// Summary of a parsed pipeline for `validate`
pub fn format_pipeline(config: &PipelineConfig) -> String {
    let mut out = format!(
        "  Name: {}\n  Steps: {}",
        style(&config.name).bold(),
        style(config.steps.len()).cyan()
    );
    for (index, step) in config.steps.iter().enumerate() {
        out.push_str(&format!(
            "\n    {}. {} {}",
            index + 1,
            style(&step.name).cyan(),
            style(&step.command).dim()
        ));
    }
    out
}

/// JSON view of a job, flattening its record
#[derive(Debug, Serialize)]
pub struct JobReport<'a> {
    pub name: &'a str,
    #[serde(flatten)]
    pub record: &'a JobRecord,
}

/// JSON body printed by `validate --json` when the definition is rejected
pub fn validation_error_json(file: &Path, error: &PipelineParseError) -> serde_json::Value {
    serde_json::json!({
        "valid": false,
        "file": file.display().to_string(),
        "error": error.to_string(),
    })
}

/// Format step output with truncation
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.to_string()
    } else {
        let truncated = lines[..max_lines].join("\n");
        format!(
            "{}\n{}... ({} more lines)",
            truncated,
            style("[truncated]").dim(),
            lines.len() - max_lines
        )
    }
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}.{:01}s", secs, duration.subsec_millis() / 100)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}
