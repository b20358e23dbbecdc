//! Queue document API handlers.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use cadence_core::{export_items, sync_document, SyncReport};

use super::handlers::{document_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub path: String,
    pub exported: usize,
}

/// Write every item to the configured queue document
pub async fn export_queue(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ExportResponse>, ApiError> {
    let path = &state.config().document.path;
    let exported = export_items(state.items(), path).map_err(document_error)?;
    Ok(Json(ExportResponse {
        path: path.display().to_string(),
        exported,
    }))
}

/// Apply hand edits from the configured queue document
pub async fn sync_queue(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SyncReport>, ApiError> {
    sync_document(state.items(), &state.config().document.path)
        .map(Json)
        .map_err(document_error)
}
