//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Item store (creations, transitions, update retries)
//! - Scheduler (slot assignments)
//! - Publishing (attempts, publisher latency, generation)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Item Store Metrics
// =============================================================================

/// Items appended to the queue.
pub static ITEMS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("cadence_items_created_total", "Total items appended to the queue").unwrap()
});

/// Committed state transitions.
pub static ITEM_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cadence_item_transitions_total",
            "Total committed item state transitions",
        ),
        &["from", "to"],
    )
    .unwrap()
});

/// Versioned writes that lost the race and were re-applied.
pub static UPDATE_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cadence_item_update_retries_total",
        "Atomic updates retried after a concurrent modification",
    )
    .unwrap()
});

// =============================================================================
// Scheduler Metrics
// =============================================================================

/// Slots assigned by scheduler runs.
pub static SLOTS_ASSIGNED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("cadence_slots_assigned_total", "Total schedule slots assigned").unwrap()
});

// =============================================================================
// Publishing Metrics
// =============================================================================

/// Publish attempts by result.
pub static PUBLISH_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cadence_publish_attempts_total", "Total publish attempts"),
        &["result"], // "success", "failure", "timeout"
    )
    .unwrap()
});

/// Publisher call duration in seconds.
pub static PUBLISH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cadence_publish_duration_seconds",
            "Duration of publisher calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["backend"],
    )
    .unwrap()
});

/// Generator calls by result.
pub static GENERATION_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cadence_generation_attempts_total",
            "Total content generation attempts",
        ),
        &["result"], // "success", "failure"
    )
    .unwrap()
});

/// All core metrics, for registration with the server registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(ITEMS_CREATED.clone()),
        Box::new(ITEM_TRANSITIONS.clone()),
        Box::new(UPDATE_RETRIES.clone()),
        Box::new(SLOTS_ASSIGNED.clone()),
        Box::new(PUBLISH_ATTEMPTS.clone()),
        Box::new(PUBLISH_DURATION.clone()),
        Box::new(GENERATION_ATTEMPTS.clone()),
    ]
}
