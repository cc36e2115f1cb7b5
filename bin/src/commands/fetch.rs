//! Fetch command implementation.
//!
//! Submits one job in-process and follows it on the event bus until it
//! finishes.

use crate::display::progress_style;
use anyhow::{Context, Result, bail};
use candlefetch_jobs::{JobEvent, JobId, JobRecord, JobRequest, JobStatus, JobStore};
use candlefetch_server::{AppState, ServerConfig};
use indicatif::ProgressBar;
use tokio::sync::broadcast::{self, error::RecvError};

/// Download candles for one symbol and report where they were written.
pub(crate) async fn fetch(config: &ServerConfig, request: JobRequest, quiet: bool) -> Result<()> {
    let state = AppState::build(config).context("Failed to initialize downloader")?;

    // Subscribe first so the first transition is not missed.
    let mut events = state.bus().subscribe();
    let job = state
        .runner()
        .submit(request)
        .context("Invalid download request")?;

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(100);
        pb.set_style(progress_style()?);
        pb.set_prefix(format!("{} {}", job.symbol, job.period_id));
        pb.set_message(job.message.clone());
        pb
    };

    let finished = follow(state.store(), &mut events, job.job_id, &progress).await?;

    report(&progress, &finished, quiet)
}

/// Tracks one job on the bus until it finishes, mirroring progress onto
/// `progress`.
async fn follow(
    store: &JobStore,
    events: &mut broadcast::Receiver<JobEvent>,
    job_id: JobId,
    progress: &ProgressBar,
) -> Result<JobRecord> {
    loop {
        match events.recv().await {
            Ok(event) if event.job.job_id == job_id => {
                progress.set_position(u64::from(event.job.progress));
                progress.set_message(event.job.message.clone());
                if event.job.is_finished() {
                    return Ok(event.job);
                }
            }
            Ok(_) => {}
            Err(RecvError::Lagged(_)) => {
                // Skipped events are only progress; the store has the latest.
                if let Some(current) = store.get(&job_id)
                    && current.is_finished()
                {
                    return Ok(current);
                }
            }
            Err(RecvError::Closed) => bail!("Job event stream closed unexpectedly"),
        }
    }
}

fn report(progress: &ProgressBar, job: &JobRecord, quiet: bool) -> Result<()> {
    if job.status == JobStatus::Failed {
        progress.abandon_with_message(job.message.clone());
        bail!(
            "Download failed: {}",
            job.error.as_deref().unwrap_or("unknown error")
        );
    }

    progress.finish_with_message(job.message.clone());
    if !quiet {
        if let Some(path) = &job.file_path {
            println!("Output written to: {}", path.display());
        }
        println!("Job ID: {}", job.job_id);
    }
    Ok(())
}
