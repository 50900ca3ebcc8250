//! Current document endpoint

use axum::{extract::State, http::StatusCode, Json};

use crate::server::state::AppState;
use crate::types::DocumentSummary;

/// GET /api/document - Summary of the indexed document, 404 when none
pub async fn current_document(
    State(state): State<AppState>,
) -> std::result::Result<Json<DocumentSummary>, StatusCode> {
    state
        .current_index()
        .map(|index| Json(DocumentSummary::from(index.document())))
        .ok_or(StatusCode::NOT_FOUND)
}
