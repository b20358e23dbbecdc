//! Schedule API handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;

use cadence_core::{ScheduleReport, TimeSlot};

use super::handlers::{schedule_error, ApiError, AsOfParams};
use crate::state::AppState;

/// A schedule entry with its due time resolved
#[derive(Debug, Serialize)]
pub struct ScheduleEntryResponse {
    pub item_id: String,
    pub day: u32,
    pub time_slot: TimeSlot,
    pub delivered: bool,
    pub due_at: DateTime<Utc>,
}

/// Response for the schedule listing
#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    /// Date of schedule day 1, once the scheduler has run
    pub anchor: Option<NaiveDate>,
    pub entries: Vec<ScheduleEntryResponse>,
}

/// List all schedule entries
pub async fn list_schedule(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ScheduleResponse>, ApiError> {
    let anchor = state.schedule().anchor().map_err(schedule_error)?;
    let entries = state.schedule().list_all().map_err(schedule_error)?;

    // Entries are only written once the anchor is fixed.
    let entries = match anchor {
        Some(anchor) => entries
            .into_iter()
            .map(|entry| ScheduleEntryResponse {
                due_at: entry.due_at(anchor),
                item_id: entry.item_id,
                day: entry.day,
                time_slot: entry.time_slot,
                delivered: entry.delivered,
            })
            .collect(),
        None => Vec::new(),
    };

    Ok(Json(ScheduleResponse { anchor, entries }))
}

/// Assign slots to every approved, unscheduled item
///
/// Only slots not yet elapsed at `?at=` (default: now) are handed out.
pub async fn run_scheduler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AsOfParams>,
) -> Result<Json<ScheduleReport>, ApiError> {
    state
        .scheduler()
        .run(params.now())
        .map(Json)
        .map_err(schedule_error)
}
