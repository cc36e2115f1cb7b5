//! Route table.

mod data;
mod jobs;
mod meta;
mod ws;

use axum::routing::get;
use axum::{Json, Router};
use candlefetch_jobs::{JobId, JobRecord};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{ApiError, AppState};

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    // Any origin; the API is meant for a local browser front end.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        // Jobs
        .route("/api/jobs", get(jobs::list_jobs).post(jobs::create_job))
        .route(
            "/api/jobs/:job_id",
            get(jobs::get_job).delete(jobs::delete_job),
        )
        // Data
        .route("/api/download/:job_id", get(data::download_file))
        .route("/api/view/:job_id", get(data::view_chart))
        // Provider metadata
        .route("/api/exchanges", get(meta::exchanges))
        .route("/api/symbols", get(meta::symbols))
        .route("/api/resolutions", get(meta::resolutions))
        // Push notifications
        .route("/ws", get(ws::job_updates))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Looks up a job by its path segment. Ids that are not UUIDs are simply
/// unknown.
fn find_job(state: &AppState, raw_id: &str) -> Result<JobRecord, ApiError> {
    raw_id
        .parse::<JobId>()
        .ok()
        .and_then(|id| state.store().get(&id))
        .ok_or(ApiError::JobNotFound)
}
