//! Job submission and bookkeeping routes.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use candlefetch_jobs::{JobId, JobRecord, JobRequest};
use serde::Serialize;

use super::find_job;
use crate::{ApiError, AppState};

#[derive(Serialize)]
pub(super) struct JobCreated {
    success: bool,
    job_id: JobId,
    message: &'static str,
}

#[derive(Serialize)]
pub(super) struct JobList {
    success: bool,
    jobs: Vec<JobRecord>,
}

#[derive(Serialize)]
pub(super) struct JobDetail {
    success: bool,
    job: JobRecord,
}

#[derive(Serialize)]
pub(super) struct JobDeleted {
    success: bool,
    message: &'static str,
}

/// `POST /api/jobs`. An empty body counts as an empty request, so the
/// missing-field check reports it. A body that is not a valid request
/// object is rejected with the decoder's message.
pub(super) async fn create_job(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<JobCreated>, ApiError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        JobRequest::default()
    } else {
        Json::<JobRequest>::from_bytes(&body)
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?
            .0
    };
    let job = state.runner().submit(request)?;
    Ok(Json(JobCreated {
        success: true,
        job_id: job.job_id,
        message: "Download job started",
    }))
}

pub(super) async fn list_jobs(State(state): State<AppState>) -> Json<JobList> {
    Json(JobList {
        success: true,
        jobs: state.store().list_recent(),
    })
}

pub(super) async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobDetail>, ApiError> {
    let job = find_job(&state, &job_id)?;
    Ok(Json(JobDetail { success: true, job }))
}

pub(super) async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobDeleted>, ApiError> {
    let id: JobId = job_id.parse().map_err(|_| ApiError::JobNotFound)?;
    state
        .runner()
        .delete(&id)
        .await
        .ok_or(ApiError::JobNotFound)?;
    Ok(Json(JobDeleted {
        success: true,
        message: "Job deleted successfully",
    }))
}
