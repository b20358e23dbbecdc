//! Mock publisher for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::publish::{PublishError, PublishReceipt, PublishRequest, Publisher};

/// Mock implementation of the Publisher trait.
///
/// Provides controllable behavior for testing:
/// - Scripted outcomes, consumed in order (success once the script runs out)
/// - Recorded requests for assertions
/// - Simulated latency
///
/// # Example
///
/// ```rust,ignore
/// use cadence_core::testing::MockPublisher;
///
/// let publisher = MockPublisher::new();
/// publisher.fail_next("rate limited").await;
///
/// // ... run a sweep ...
///
/// assert_eq!(publisher.call_count().await, 1);
/// ```
#[derive(Debug)]
pub struct MockPublisher {
    outcomes: Arc<RwLock<VecDeque<Result<PublishReceipt, PublishError>>>>,
    calls: Arc<RwLock<Vec<PublishRequest>>>,
    delay: Arc<RwLock<Option<Duration>>>,
    next_ref: AtomicUsize,
}

impl Default for MockPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPublisher {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(RwLock::new(VecDeque::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            delay: Arc::new(RwLock::new(None)),
            next_ref: AtomicUsize::new(1),
        }
    }

    /// Queue the outcome of a future call.
    pub async fn push_outcome(&self, outcome: Result<PublishReceipt, PublishError>) {
        self.outcomes.write().await.push_back(outcome);
    }

    /// Make the next call fail with a rejection.
    pub async fn fail_next(&self, reason: impl Into<String>) {
        self.push_outcome(Err(PublishError::Rejected(reason.into())))
            .await;
    }

    /// Sleep this long inside every call.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// All requests received so far.
    pub async fn calls(&self) -> Vec<PublishRequest> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, PublishError> {
        self.calls.write().await.push(request.clone());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.outcomes.write().await.pop_front() {
            Some(outcome) => outcome,
            None => Ok(PublishReceipt {
                external_ref: format!("mock-{}", self.next_ref.fetch_add(1, Ordering::SeqCst)),
            }),
        }
    }
}
