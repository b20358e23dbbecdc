//! Publish API handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use cadence_core::SweepReport;

use super::handlers::{coordinator_error, ApiError, AsOfParams};
use crate::state::AppState;

/// Run one publish sweep over entries due at `?at=` (default: now)
pub async fn run_sweep(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AsOfParams>,
) -> Result<Json<SweepReport>, ApiError> {
    state
        .publish()
        .sweep(params.now())
        .await
        .map(Json)
        .map_err(coordinator_error)
}
