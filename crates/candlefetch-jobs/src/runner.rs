//! Job execution.

use candlefetch_format::write_candles;
use candlefetch_provider::{CandleProvider, ProviderError};
use candlefetch_types::Candle;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{ExecutionError, JobError, JobId, JobRecord, JobRequest, JobStore, NotificationSink};

/// Accepts download requests and drives each one on its own tokio task.
///
/// The runner is cheap to clone; clones share the same store, provider and
/// sink.
#[derive(Debug, Clone)]
pub struct JobRunner {
    store: Arc<JobStore>,
    provider: Arc<dyn CandleProvider>,
    sink: Arc<dyn NotificationSink>,
    data_dir: PathBuf,
}

impl JobRunner {
    /// Creates a runner writing CSV output into `data_dir`.
    #[must_use]
    pub fn new(
        store: Arc<JobStore>,
        provider: Arc<dyn CandleProvider>,
        sink: Arc<dyn NotificationSink>,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            provider,
            sink,
            data_dir: data_dir.into(),
        }
    }

    /// Returns the job store.
    #[must_use]
    pub const fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Returns the provider jobs are fetched from.
    #[must_use]
    pub const fn provider(&self) -> &Arc<dyn CandleProvider> {
        &self.provider
    }

    /// Returns the folder CSV output is written to.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Records a pending job and starts it in the background.
    ///
    /// Returns the pending record as stored. Progress and the final outcome
    /// are only observable through the store or the notification sink.
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is blank or the limit is zero.
    /// Nothing is stored in that case.
    pub fn submit(&self, request: JobRequest) -> Result<JobRecord, JobError> {
        let job = JobRecord::new(request.validated()?);
        self.store.add_or_update(job.clone());
        info!(job_id = %job.job_id, symbol = %job.symbol, period = %job.period_id, "job submitted");

        let runner = self.clone();
        let job_id = job.job_id;
        tokio::spawn(async move { runner.run(job_id).await });

        Ok(job)
    }

    /// Deletes a job and, best-effort, its output file.
    ///
    /// Returns the removed record, or `None` if no job has this id. A task
    /// still running for the job stops at its next checkpoint.
    pub async fn delete(&self, job_id: &JobId) -> Option<JobRecord> {
        let job = self.store.delete(job_id)?;
        if let Some(path) = &job.file_path {
            remove_output(path).await;
        }
        info!(%job_id, "job deleted");
        Some(job)
    }

    async fn run(self, job_id: JobId) {
        let Some(mut job) = self.store.get(&job_id) else {
            debug!(%job_id, "job vanished before start");
            return;
        };

        match self.drive(&mut job).await {
            Ok(true) => info!(%job_id, candles = job.candle_count, "job completed"),
            Ok(false) => debug!(%job_id, "job deleted while running"),
            Err(e) => {
                warn!(%job_id, error = %e, "job failed");
                match job.mark_failed(e.to_string()) {
                    Ok(()) => {
                        self.commit(&job);
                    }
                    Err(state) => warn!(%job_id, error = %state, "could not record failure"),
                }
            }
        }
    }

    /// Runs the pipeline. `Ok(false)` means the job was deleted mid-run.
    async fn drive(&self, job: &mut JobRecord) -> Result<bool, ExecutionError> {
        job.mark_started(self.provider.platform_name())?;
        if !self.commit(job) {
            return Ok(false);
        }
        if !self.advance(job, 25, "Making API request...")? {
            return Ok(false);
        }

        let raw = self.provider.fetch_candles(&job.candle_request()).await?;
        job.candle_count = raw.len();
        if !self.advance(job, 50, "Processing data...")? {
            return Ok(false);
        }

        let candles = self.provider.normalize(raw)?;
        if candles.is_empty() {
            return Err(ProviderError::NoData.into());
        }
        if !self.advance(job, 75, "Saving to CSV...")? {
            return Ok(false);
        }

        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| ExecutionError::DataDir {
                path: self.data_dir.clone(),
                source: e,
            })?;
        let path = self.data_dir.join(job.output_file_name(Utc::now()));
        save_candles(&path, &candles).await?;

        job.mark_completed(path.clone(), candles.len())?;
        if !self.commit(job) {
            remove_output(&path).await;
            return Ok(false);
        }
        Ok(true)
    }

    fn advance(&self, job: &mut JobRecord, progress: u8, message: &str) -> Result<bool, JobError> {
        job.checkpoint(progress, message)?;
        Ok(self.commit(job))
    }

    /// Persists then publishes. Returns false, publishing nothing, if the
    /// job has been deleted.
    fn commit(&self, job: &JobRecord) -> bool {
        if !self.store.update_existing(job.clone()) {
            return false;
        }
        self.sink.publish(job);
        true
    }
}

/// Writes the CSV, removing whatever was written if the write fails.
async fn save_candles(path: &Path, candles: &[Candle]) -> Result<(), ExecutionError> {
    if let Err(e) = write_candles(path, candles).await {
        remove_output(path).await;
        return Err(e.into());
    }
    Ok(())
}

async fn remove_output(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed output file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove output file"),
    }
}
