use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "studyrag-backend"
    }))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let points = state.store.count().await.unwrap_or(0);
    Ok(Json(json!({
        "status": "ok",
        "collection": state.config.qdrant.collection,
        "points": points,
        "embedding_model": state.config.embedding.model_name,
        "embedding_dimension": state.config.embedding.embedding_dimension,
        "chunk_size": state.config.chunking.chunk_size,
        "chunk_overlap": state.config.chunking.chunk_overlap,
    })))
}
