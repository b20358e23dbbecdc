use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use cadence_core::{
    CoordinatorError, DocumentError, ItemError, LifecycleError, SanitizedConfig, ScheduleError,
};

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Error body shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Optional evaluation time for scheduler runs and publish sweeps.
#[derive(Debug, Default, Deserialize)]
pub struct AsOfParams {
    /// RFC 3339 instant; defaults to the current time.
    pub at: Option<DateTime<Utc>>,
}

impl AsOfParams {
    pub fn now(&self) -> DateTime<Utc> {
        self.at.unwrap_or_else(Utc::now)
    }
}

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Map an item store error onto an HTTP status.
pub fn item_error(e: ItemError) -> ApiError {
    let status = match &e {
        ItemError::NotFound(_) => StatusCode::NOT_FOUND,
        ItemError::InvalidItem(_) => StatusCode::BAD_REQUEST,
        ItemError::Conflict {
            source: LifecycleError::EmptyContent,
            ..
        } => StatusCode::BAD_REQUEST,
        ItemError::DuplicateIdentity(_) | ItemError::Conflict { .. } | ItemError::Contention(_) => {
            StatusCode::CONFLICT
        }
        ItemError::Storage(_) => {
            error!("Item store failure: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    api_error(status, e.to_string())
}

pub fn schedule_error(e: ScheduleError) -> ApiError {
    let status = match &e {
        ScheduleError::NotFound(_) => StatusCode::NOT_FOUND,
        ScheduleError::AlreadyScheduled(_) | ScheduleError::SlotTaken { .. } => {
            StatusCode::CONFLICT
        }
        ScheduleError::Storage(_) => {
            error!("Schedule store failure: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    api_error(status, e.to_string())
}

pub fn document_error(e: DocumentError) -> ApiError {
    let e = match e {
        DocumentError::Store(inner) => return item_error(inner),
        other => other,
    };
    let status = match &e {
        DocumentError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
            StatusCode::NOT_FOUND
        }
        DocumentError::Parse { .. } => StatusCode::BAD_REQUEST,
        DocumentError::Io { .. } | DocumentError::Serialize(_) | DocumentError::Store(_) => {
            error!("Queue document failure: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    api_error(status, e.to_string())
}

pub fn coordinator_error(e: CoordinatorError) -> ApiError {
    error!("Coordinator failure: {}", e);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
