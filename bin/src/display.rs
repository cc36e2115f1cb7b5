//! Display helpers for the candlefetch CLI.

use anyhow::{Context, Result};
use candlefetch_jobs::JobRecord;
use chrono::{DateTime, Utc};
use indicatif::ProgressStyle;

/// Progress bar style for a foreground fetch.
pub(crate) fn progress_style() -> Result<ProgressStyle> {
    Ok(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] {prefix} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
        .context("Invalid progress template")?
        .progress_chars("=>-"))
}

/// Timestamp as shown in job details.
pub(crate) fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// One-line summary used in job selection prompts. Starts with the job ID.
pub(crate) fn job_label(job: &JobRecord) -> String {
    format!(
        "{} | {} | {}% | {} {}",
        job.job_id, job.status, job.progress, job.symbol, job.period_id
    )
}
