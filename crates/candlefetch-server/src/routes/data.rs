//! CSV download and chart routes.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use candlefetch_format::{ChartMeta, build_chart, read_candles};
use candlefetch_jobs::{JobRecord, JobStatus};
use serde_json::{Value, json};
use std::io::ErrorKind;
use std::path::PathBuf;

use super::find_job;
use crate::{ApiError, AppState};

/// Returns the output path of a completed job.
fn completed_file(job: &JobRecord, not_ready: &'static str) -> Result<PathBuf, ApiError> {
    match (&job.status, &job.file_path) {
        (JobStatus::Completed, Some(path)) => Ok(path.clone()),
        _ => Err(ApiError::NotReady(not_ready)),
    }
}

pub(super) async fn download_file(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Response, ApiError> {
    let job = find_job(&state, &job_id)?;
    let path = completed_file(&job, "File not ready for download")?;

    let body = match tokio::fs::read(&path).await {
        Ok(body) => body,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ApiError::FileNotFound("File not found"));
        }
        Err(e) => return Err(ApiError::Internal(e.to_string())),
    };
    let name = path
        .file_name()
        .map_or_else(|| format!("{}.csv", job.job_id), |n| n.to_string_lossy().into_owned());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{name}\""),
            ),
        ],
        body,
    )
        .into_response())
}

pub(super) async fn view_chart(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let job = find_job(&state, &job_id)?;
    let path = completed_file(&job, "Data not ready for viewing")?;
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Err(ApiError::FileNotFound("Data file not found"));
    }

    let candles = read_candles(&path).await?;
    let meta = ChartMeta {
        symbol: job.symbol,
        period_id: job.period_id,
        limit: job.limit,
    };
    let chart = build_chart(&meta, &candles);
    Ok(Json(json!({
        "success": true,
        "plot_data": chart.plot_data,
        "job_info": chart.job_info,
    })))
}
