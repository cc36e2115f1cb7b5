//! Provider metadata routes.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
pub(super) struct SymbolQuery {
    #[serde(default)]
    search: String,
    #[serde(default)]
    exchange: String,
}

pub(super) async fn exchanges(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let exchanges = state.provider().list_exchanges().await?;
    Ok(Json(json!({ "success": true, "exchanges": exchanges })))
}

pub(super) async fn symbols(
    State(state): State<AppState>,
    Query(query): Query<SymbolQuery>,
) -> Result<Json<Value>, ApiError> {
    let symbols = state
        .provider()
        .list_symbols(&query.search, &query.exchange)
        .await?;
    Ok(Json(json!({ "success": true, "symbols": symbols })))
}

pub(super) async fn resolutions(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let resolutions = state.provider().list_resolutions().await?;
    Ok(Json(json!({ "success": true, "resolutions": resolutions })))
}
