use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn list_sources(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let sources = state.store.list_sources().await?;
    Ok(Json(json!({ "sources": sources })))
}

pub async fn delete_source(
    State(state): State<Arc<AppState>>,
    Path(source_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = state.store.delete_source(&source_id).await?;
    if removed == 0 {
        return Err(ApiError::NotFound(format!(
            "no stored chunks for source `{source_id}`"
        )));
    }

    tracing::info!(source = %source_id, removed, "deleted source");
    Ok(Json(json!({ "source": source_id, "removed": removed })))
}
