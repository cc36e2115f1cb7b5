//! Job log commands (list, show, delete).

use crate::display::{format_time, job_label};
use anyhow::{Context, Result, bail};
use candlefetch_jobs::{JobId, JobStatus, JobStore};
use candlefetch_server::ServerConfig;
use inquire::Select;

fn open_store(config: &ServerConfig) -> Result<JobStore> {
    let path = config.store_path();
    JobStore::open(&path).with_context(|| format!("Failed to open job log {}", path.display()))
}

fn parse_id(job_id: &str) -> Result<JobId> {
    job_id.trim().parse().context("Invalid job ID format")
}

/// List recorded jobs, newest first.
pub(crate) fn list_jobs(config: &ServerConfig, status: Option<JobStatus>) -> Result<()> {
    let store = open_store(config)?;
    let jobs: Vec<_> = store
        .list_recent()
        .into_iter()
        .filter(|job| status.is_none_or(|s| job.status == s))
        .collect();

    if jobs.is_empty() {
        println!("No jobs found.");
        return Ok(());
    }

    println!(
        "{:<36} {:<10} {:>8} {:<28} {:<8} {:<16}",
        "JOB ID", "STATUS", "PROGRESS", "SYMBOL", "PERIOD", "CREATED"
    );
    println!("{}", "-".repeat(112));

    for job in &jobs {
        println!(
            "{:<36} {:<10} {:>7}% {:<28} {:<8} {:<16}",
            job.job_id,
            job.status.as_str(),
            job.progress,
            job.symbol,
            job.period_id,
            job.created_at.format("%Y-%m-%d %H:%M"),
        );
    }

    println!("\nTotal: {} jobs", jobs.len());
    Ok(())
}

/// Print every field of one job.
pub(crate) fn show_job(config: &ServerConfig, job_id: &str) -> Result<()> {
    let store = open_store(config)?;
    let id = parse_id(job_id)?;
    let job = store.get(&id).context("Job not found")?;

    println!("Job: {}", job.job_id);
    println!("Symbol: {}", job.symbol);
    println!("Period: {}", job.period_id);
    println!(
        "Window: {} -> {}",
        job.start_date.as_deref().unwrap_or("open"),
        job.end_date.as_deref().unwrap_or("open"),
    );
    if let Some(limit) = job.limit {
        println!("Limit: {limit}");
    }
    println!("Status: {}", job.status);
    println!("Progress: {}%", job.progress);
    println!("Message: {}", job.message);
    println!("Created: {}", format_time(job.created_at));
    if let Some(started) = job.started_at {
        println!("Started: {}", format_time(started));
    }
    if let Some(completed) = job.completed_at {
        println!("Completed: {}", format_time(completed));
    }
    println!("Candles: {}", job.candle_count);
    println!(
        "File: {}",
        job.file_path
            .as_ref()
            .map_or_else(|| "N/A".into(), |p| p.display().to_string())
    );
    if let Some(err) = &job.error {
        println!("Error: {err}");
    }

    Ok(())
}

/// Prompt the user to pick one of the recorded jobs.
fn prompt_job_selection(store: &JobStore, action_name: &str) -> Result<JobId> {
    let jobs = store.list_recent();
    if jobs.is_empty() {
        bail!("No jobs found to {action_name}.");
    }

    let options: Vec<String> = jobs.iter().map(job_label).collect();
    let selection = Select::new(&format!("Select a job to {action_name}:"), options)
        .prompt()
        .context("Job selection cancelled")?;

    // The job ID is the first part before " | "
    let job_id = selection
        .split(" | ")
        .next()
        .context("Failed to parse job selection")?;
    parse_id(job_id)
}

/// Delete a job record and its CSV file.
pub(crate) async fn delete_job(config: &ServerConfig, job_id: Option<&str>) -> Result<()> {
    let store = open_store(config)?;
    let id = match job_id {
        Some(id) => parse_id(id)?,
        None => prompt_job_selection(&store, "delete")?,
    };

    let job = store.delete(&id).context("Job not found")?;
    if let Some(path) = &job.file_path {
        match tokio::fs::remove_file(path).await {
            Ok(()) => println!("Removed {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to remove {}", path.display()));
            }
        }
    }

    println!("Job {id} deleted.");
    Ok(())
}
