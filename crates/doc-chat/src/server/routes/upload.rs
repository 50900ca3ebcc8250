//! Document upload endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::path::Path;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::StatusResponse;

/// Multipart field carrying the document
const FILE_FIELD: &str = "file";

/// POST /upload - Replace the indexed document
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<StatusResponse>> {
    // Removed with the directory once the handler returns
    let spool = TempDir::new()?;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            tracing::debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }

        let filename = field
            .file_name()
            .and_then(|name| Path::new(name).file_name())
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("upload.pdf")
            .to_string();

        let path = spool.path().join(&filename);
        let mut file = tokio::fs::File::create(&path).await?;
        let mut size = 0usize;
        while let Some(bytes) = field
            .chunk()
            .await
            .map_err(|e| Error::BadRequest(format!("Failed to read file: {}", e)))?
        {
            size += bytes.len();
            file.write_all(&bytes).await?;
        }
        file.flush().await?;
        drop(file);

        tracing::info!("Received '{}' ({} bytes)", filename, size);
        state.ingest_file(&filename, &path).await?;

        return Ok(Json(StatusResponse::success("document indexed successfully")));
    }

    Err(Error::BadRequest(format!(
        "multipart field '{}' is required",
        FILE_FIELD
    )))
}
