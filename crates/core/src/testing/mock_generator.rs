//! Mock content generator for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::coordinator::{ContentGenerator, GenerateError, GeneratedContent};

/// Mock implementation of the ContentGenerator trait.
///
/// Returns scripted outcomes first, then numbered placeholder posts.
#[derive(Debug)]
pub struct MockGenerator {
    outcomes: Arc<RwLock<VecDeque<Result<GeneratedContent, GenerateError>>>>,
    produced: AtomicUsize,
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(RwLock::new(VecDeque::new())),
            produced: AtomicUsize::new(0),
        }
    }

    pub async fn push_outcome(&self, outcome: Result<GeneratedContent, GenerateError>) {
        self.outcomes.write().await.push_back(outcome);
    }

    /// Number of `produce_item` calls so far.
    pub fn produced(&self) -> usize {
        self.produced.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn produce_item(&self) -> Result<GeneratedContent, GenerateError> {
        let n = self.produced.fetch_add(1, Ordering::SeqCst) + 1;
        match self.outcomes.write().await.pop_front() {
            Some(outcome) => outcome,
            None => Ok(super::fixtures::generated_content(&format!(
                "Generated post #{}",
                n
            ))),
        }
    }
}
