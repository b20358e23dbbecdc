//! Audit trail for queue activity.
//!
//! Components emit [`AuditEvent`]s through a cloneable [`AuditHandle`]; a
//! background [`AuditWriter`] persists them to an [`AuditStore`].

mod events;
mod handle;
mod sqlite;
mod store;
mod writer;

pub use events::*;
pub use handle::*;
pub use sqlite::*;
pub use store::*;
pub use writer::*;
