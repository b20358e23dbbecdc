//! Coordinators that move items through the lifecycle.
//!
//! - **Review**: reviewer decisions on single items (approve, edit, unapprove, recover)
//! - **Publish**: sweeps due schedule entries through the publisher
//! - **Generate**: fills the queue from a content generator

mod gate;
mod generate;
mod publish;
mod review;
mod runner;
mod types;

pub use gate::{AutoConfirm, GateDecision, ManualGate, PublishGate};
pub use generate::{
    generate_batch, ContentGenerator, GenerateError, GenerateReport, GeneratedContent,
};
pub use publish::PublishCoordinator;
pub use review::ReviewCoordinator;
pub use runner::PublishLoop;
pub use types::{CoordinatorError, PublishedItem, SweepReport};
