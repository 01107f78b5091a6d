use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::rag::IngestStats;
use crate::state::AppState;

/// Either raw text (hosted deployments) or a local PDF path (development).
/// `text` wins when both are present.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub text: Option<String>,
    pub pdf_path: Option<String>,
    pub source_id: Option<String>,
}

pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<IngestStats>, ApiError> {
    if let Some(text) = req.text {
        let source_id = req
            .source_id
            .unwrap_or_else(|| "uploaded_text".to_string());
        let stats = state.engine.ingest(&text, &source_id).await?;
        return Ok(Json(stats));
    }

    if let Some(path) = req.pdf_path {
        let source_id = req.source_id.unwrap_or_else(|| path.clone());
        let stats = state.engine.ingest_pdf(&path, &source_id).await?;
        return Ok(Json(stats));
    }

    Err(ApiError::BadRequest(
        "either `text` or `pdf_path` is required".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_accepts_text_without_source_id() {
        let req: IngestRequest = serde_json::from_str(r#"{"text": "hello"}"#).unwrap();
        assert_eq!(req.text.as_deref(), Some("hello"));
        assert!(req.pdf_path.is_none());
        assert!(req.source_id.is_none());
    }

    #[test]
    fn request_accepts_pdf_path_with_source_id() {
        let req: IngestRequest =
            serde_json::from_str(r#"{"pdf_path": "notes.pdf", "source_id": "notes"}"#).unwrap();
        assert_eq!(req.pdf_path.as_deref(), Some("notes.pdf"));
        assert_eq!(req.source_id.as_deref(), Some("notes"));
    }
}
