//! Item API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use cadence_core::{generate_batch, ContentItem, GenerateReport, ItemFilter, ItemState, NewItem};

use super::handlers::{api_error, coordinator_error, item_error, ApiError};
use crate::state::AppState;

/// Maximum allowed limit for item queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for item queries
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating an item
#[derive(Debug, Deserialize)]
pub struct CreateItemBody {
    /// Optional caller-chosen id; a UUID is assigned otherwise
    pub id: Option<String>,
    pub content: String,
    pub category: String,
    pub kind: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

/// Request body for editing an item
#[derive(Debug, Deserialize)]
pub struct EditItemBody {
    pub content: String,
}

/// Request body for a generation batch
#[derive(Debug, Default, Deserialize)]
pub struct GenerateBody {
    /// Number of posts to request; defaults to 1
    pub count: Option<usize>,
}

/// Query parameters for listing items
#[derive(Debug, Deserialize)]
pub struct ListItemsParams {
    /// Filter by state
    pub state: Option<String>,
    /// Maximum number of items to return
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Response for listing items
#[derive(Debug, Serialize)]
pub struct ListItemsResponse {
    pub items: Vec<ContentItem>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for a publish confirmation
#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub item_id: String,
    pub confirmed: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Append a new item in state `generated`
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateItemBody>,
) -> Result<(StatusCode, Json<ContentItem>), ApiError> {
    let mut request =
        NewItem::new(body.content, body.category, body.kind).with_hashtags(body.hashtags);
    if let Some(id) = body.id {
        request = request.with_id(id);
    }

    let item = state
        .review()
        .create_item(request, "api")
        .map_err(item_error)?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Ask the configured generator for new items
pub async fn generate_items(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateBody>,
) -> Result<Json<GenerateReport>, ApiError> {
    let generator = state.generator().ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            "content generation is not enabled (generator.backend = \"disabled\")",
        )
    })?;

    let count = body.count.unwrap_or(1);
    let max_batch = state.config().generator.max_batch;
    if count == 0 || count > max_batch {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("count must be between 1 and {}", max_batch),
        ));
    }

    generate_batch(generator, state.review(), count)
        .await
        .map(Json)
        .map_err(coordinator_error)
}

/// Get an item by ID
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ContentItem>, ApiError> {
    state.items().get(&id).map(Json).map_err(item_error)
}

/// List items with optional state filter, in insertion order
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListItemsParams>,
) -> Result<Json<ListItemsResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = ItemFilter::new();
    if let Some(ref raw) = params.state {
        let item_state: ItemState = raw
            .parse()
            .map_err(|e: String| api_error(StatusCode::BAD_REQUEST, e))?;
        filter = filter.with_state(item_state);
    }

    let total = state.items().count(&filter).map_err(item_error)?;
    let items = state
        .items()
        .list(&filter.with_limit(limit).with_offset(offset))
        .map_err(item_error)?;

    Ok(Json(ListItemsResponse {
        items,
        total,
        limit,
        offset,
    }))
}

/// Replace an item's content
pub async fn edit_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<EditItemBody>,
) -> Result<Json<ContentItem>, ApiError> {
    state
        .review()
        .edit_item(&id, body.content)
        .map(Json)
        .map_err(item_error)
}

pub async fn approve_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ContentItem>, ApiError> {
    state.review().approve_item(&id).map(Json).map_err(item_error)
}

pub async fn unapprove_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ContentItem>, ApiError> {
    state
        .review()
        .unapprove_item(&id)
        .map(Json)
        .map_err(item_error)
}

pub async fn recover_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ContentItem>, ApiError> {
    state
        .review()
        .recover_item(&id)
        .map(Json)
        .map_err(item_error)
}

/// Confirm one publish attempt for an item (manual confirmation mode only)
pub async fn confirm_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ConfirmResponse>, ApiError> {
    let gate = state.manual_gate().ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            "publish confirmation is not enabled (publisher.confirmation = \"auto\")",
        )
    })?;

    let item = state.items().get(&id).map_err(item_error)?;
    if !matches!(item.state, ItemState::Approved | ItemState::Scheduled) {
        return Err(api_error(
            StatusCode::CONFLICT,
            format!("cannot confirm item in state {}", item.state),
        ));
    }

    gate.confirm(&item.id);
    Ok(Json(ConfirmResponse {
        item_id: item.id,
        confirmed: true,
    }))
}
