//! PDF text extraction for the ingestion pipeline.

use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("failed to extract text from {path}: {reason}")]
    Pdf { path: String, reason: String },
    #[error("no extractable text in {0}")]
    Empty(String),
}

/// Extract the full text of a local PDF file.
///
/// pdf-extract is CPU-bound, so the work runs on the blocking pool.
pub async fn extract_pdf_text(path: &str) -> Result<String, ExtractError> {
    if !Path::new(path).is_file() {
        return Err(ExtractError::NotFound(path.to_string()));
    }

    let owned = path.to_string();
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned))
        .await
        .map_err(|e| ExtractError::Pdf {
            path: path.to_string(),
            reason: format!("extraction task failed: {e}"),
        })?
        .map_err(|e| ExtractError::Pdf {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

    if text.split_whitespace().next().is_none() {
        return Err(ExtractError::Empty(path.to_string()));
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.pdf");
        let err = extract_pdf_text(path.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, ExtractError::NotFound(_)));
    }

    #[tokio::test]
    async fn directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_pdf_text(dir.path().to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::NotFound(_)));
    }
}
