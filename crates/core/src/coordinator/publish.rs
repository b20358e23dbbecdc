//! Publishing of due schedule entries.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::gate::{GateDecision, PublishGate};
use super::types::{CoordinatorError, PublishedItem, SweepReport};
use crate::audit::{AuditEvent, AuditHandle};
use crate::item::{
    ContentItem, ItemFailure, ItemState, ItemStore, PublishResult, Transition,
};
use crate::metrics;
use crate::publish::{PublishError, PublishRequest, Publisher};
use crate::schedule::{ScheduleEntry, ScheduleError, ScheduleStore};

/// Publishes scheduled items once their slot is due and records the outcome.
///
/// The publisher runs with no store lock held. Each item is attempted at most
/// once per sweep; a failed attempt leaves the item `failed` until a reviewer
/// recovers it.
pub struct PublishCoordinator {
    items: Arc<dyn ItemStore>,
    entries: Arc<dyn ScheduleStore>,
    publisher: Arc<dyn Publisher>,
    gate: Arc<dyn PublishGate>,
    timeout: Duration,
    max_per_sweep: Option<usize>,
    audit: Option<AuditHandle>,
}

impl PublishCoordinator {
    pub fn new(
        items: Arc<dyn ItemStore>,
        entries: Arc<dyn ScheduleStore>,
        publisher: Arc<dyn Publisher>,
        gate: Arc<dyn PublishGate>,
    ) -> Self {
        Self {
            items,
            entries,
            publisher,
            gate,
            timeout: Duration::from_secs(30),
            max_per_sweep: None,
            audit: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_per_sweep(mut self, max_per_sweep: Option<usize>) -> Self {
        self.max_per_sweep = max_per_sweep;
        self
    }

    pub fn with_audit(mut self, audit: Option<AuditHandle>) -> Self {
        self.audit = audit;
        self
    }

    /// Undelivered entries whose slot is due at `now`.
    pub fn due_entries(&self, now: DateTime<Utc>) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        let Some(anchor) = self.entries.anchor()? else {
            return Ok(Vec::new());
        };
        Ok(self
            .entries
            .list_undelivered()?
            .into_iter()
            .filter(|entry| entry.is_due(anchor, now))
            .collect())
    }

    /// Publish every due, scheduled item.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, CoordinatorError> {
        let mut report = SweepReport::default();

        for entry in self.due_entries(now)? {
            if let Some(max) = self.max_per_sweep {
                if report.attempted() >= max {
                    debug!("Publish cap of {} reached for this sweep", max);
                    break;
                }
            }

            let item = match self.items.get(&entry.item_id) {
                Ok(item) => item,
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    report.errors.push(ItemFailure::new(&entry.item_id, e));
                    continue;
                }
            };

            match item.state {
                ItemState::Scheduled => {}
                ItemState::Posted => {
                    // Published earlier but the entry was never flagged.
                    self.mark_delivered(&item.id, &mut report)?;
                    continue;
                }
                _ => continue,
            }

            if item.scheduled_slot != Some(entry.slot()) {
                warn!(
                    "Item {} slot does not match its schedule entry, skipping",
                    item.id
                );
                report.errors.push(ItemFailure::new(
                    &item.id,
                    "item slot does not match schedule entry",
                ));
                continue;
            }

            if self.gate.decide(&item) == GateDecision::Hold {
                debug!("Item {} held by publish gate", item.id);
                report.held.push(item.id.clone());
                continue;
            }

            self.publish_one(&item, &mut report).await?;
        }

        if !report.is_empty() {
            info!(
                "Publish sweep: {} published, {} failed, {} held",
                report.published.len(),
                report.failed.len(),
                report.held.len()
            );
            if let Some(ref audit) = self.audit {
                audit.try_emit(AuditEvent::SweepCompleted {
                    published: report.published.len(),
                    failed: report.failed.len(),
                    held: report.held.len(),
                });
            }
        }

        Ok(report)
    }

    async fn publish_one(
        &self,
        item: &ContentItem,
        report: &mut SweepReport,
    ) -> Result<(), CoordinatorError> {
        let request = PublishRequest {
            item_id: item.id.clone(),
            content: item.content.clone(),
        };

        let started = Instant::now();
        let outcome = match tokio::time::timeout(self.timeout, self.publisher.publish(&request)).await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(PublishError::Timeout(self.timeout.as_secs())),
        };
        let elapsed = started.elapsed();

        let result_label = match &outcome {
            Ok(_) => "success",
            Err(PublishError::Timeout(_)) => "timeout",
            Err(_) => "failure",
        };
        metrics::PUBLISH_ATTEMPTS
            .with_label_values(&[result_label])
            .inc();
        metrics::PUBLISH_DURATION
            .with_label_values(&[self.publisher.name()])
            .observe(elapsed.as_secs_f64());

        let result = match &outcome {
            Ok(receipt) => PublishResult::Success {
                external_ref: receipt.external_ref.clone(),
            },
            Err(e) => {
                warn!("Publishing item {} failed: {}", item.id, e);
                PublishResult::Failure {
                    reason: e.to_string(),
                }
            }
        };

        if let Some(ref audit) = self.audit {
            audit.try_emit(AuditEvent::PublishAttempted {
                item_id: item.id.clone(),
                success: result.is_success(),
                external_ref: outcome.as_ref().ok().map(|r| r.external_ref.clone()),
                error: outcome.as_ref().err().map(|e| e.to_string()),
                duration_ms: elapsed.as_millis() as u64,
            });
        }

        match self
            .items
            .apply(&item.id, &Transition::RecordPublish(result.clone()))
        {
            Ok(_) => {}
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                warn!("Could not record publish outcome for item {}: {}", item.id, e);
                report.errors.push(ItemFailure::new(
                    &item.id,
                    format!("publish outcome not recorded: {}", e),
                ));
                return Ok(());
            }
        }

        match result {
            PublishResult::Success { external_ref } => {
                self.mark_delivered(&item.id, report)?;
                report.published.push(PublishedItem {
                    item_id: item.id.clone(),
                    external_ref,
                });
            }
            PublishResult::Failure { reason } => {
                report.failed.push(ItemFailure::new(&item.id, reason));
            }
        }

        Ok(())
    }

    fn mark_delivered(&self, item_id: &str, report: &mut SweepReport) -> Result<(), CoordinatorError> {
        match self.entries.mark_delivered(item_id) {
            Ok(()) => Ok(()),
            Err(e @ ScheduleError::Storage(_)) => Err(e.into()),
            Err(e) => {
                report.errors.push(ItemFailure::new(item_id, e));
                Ok(())
            }
        }
    }
}

