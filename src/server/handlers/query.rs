use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::rag::QueryResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    5
}

pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResult>, ApiError> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest(
            "`question` must not be empty".to_string(),
        ));
    }
    if req.top_k == 0 {
        return Err(ApiError::BadRequest(
            "`top_k` must be at least 1".to_string(),
        ));
    }

    let result = state.engine.query(question, req.top_k).await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_k_defaults_to_five() {
        let req: QueryRequest = serde_json::from_str(r#"{"question": "what?"}"#).unwrap();
        assert_eq!(req.top_k, 5);
    }

    #[test]
    fn top_k_can_be_overridden() {
        let req: QueryRequest =
            serde_json::from_str(r#"{"question": "what?", "top_k": 3}"#).unwrap();
        assert_eq!(req.top_k, 3);
    }
}
