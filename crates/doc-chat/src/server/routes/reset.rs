//! Reset endpoint

use axum::{extract::State, Json};

use crate::server::state::AppState;
use crate::types::StatusResponse;

/// POST /clear - Drop the document and all chat history
pub async fn clear(State(state): State<AppState>) -> Json<StatusResponse> {
    state.reset().await;
    Json(StatusResponse::success(
        "Vector database and chat history have been cleared.",
    ))
}
