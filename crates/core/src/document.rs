//! Human-readable queue document.
//!
//! The item collection can be exported as a pretty-printed JSON array,
//! edited by hand, and synced back. Syncing only ever goes through the item
//! store, so a hand edit obeys the same lifecycle rules as any other writer.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{info, warn};

use crate::item::{ContentItem, ItemError, ItemFailure, ItemState, ItemStore, NewItem, Transition};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid queue document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize items: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error(transparent)]
    Store(#[from] ItemError),
}

/// Outcome of applying a hand-edited document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// Ids of records added to the store.
    pub appended: Vec<String>,
    /// Ids whose content change was applied as an edit.
    pub edited: Vec<String>,
    pub unchanged: usize,
    /// Records that could not be reconciled; the store keeps its version.
    pub conflicts: Vec<ItemFailure>,
}

/// Write every item, in insertion order, to `path`.
///
/// The file is replaced atomically; readers see the old or the new document,
/// never a partial one. Returns the number of items written.
pub fn export_items(store: &dyn ItemStore, path: &Path) -> Result<usize, DocumentError> {
    let items = store.list_all()?.into_vec();
    let json = serde_json::to_string_pretty(&items).map_err(DocumentError::Serialize)?;

    let io_err = |source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(json.as_bytes()).map_err(io_err)?;
    tmp.write_all(b"\n").map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    info!("Exported {} items to {}", items.len(), path.display());
    Ok(items.len())
}

/// Read a queue document.
pub fn read_items(path: &Path) -> Result<Vec<ContentItem>, DocumentError> {
    let raw = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| DocumentError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply a hand-edited document to the store.
///
/// - unknown ids in state `generated` are appended
/// - content changes on `generated`/`edited` items become edits
/// - identical records are left alone
/// - anything else is reported as a conflict
pub fn sync_document(store: &dyn ItemStore, path: &Path) -> Result<SyncReport, DocumentError> {
    let records = read_items(path)?;
    let mut report = SyncReport::default();

    for record in records {
        match store.get(&record.id) {
            Ok(current) => sync_existing(store, &current, record, &mut report)?,
            Err(ItemError::NotFound(_)) => sync_new(store, record, &mut report)?,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => report.conflicts.push(ItemFailure::new(&record.id, e)),
        }
    }

    if !report.conflicts.is_empty() {
        warn!(
            "Queue document sync left {} conflicts",
            report.conflicts.len()
        );
    }
    info!(
        "Queue document synced: {} appended, {} edited, {} unchanged",
        report.appended.len(),
        report.edited.len(),
        report.unchanged
    );

    Ok(report)
}

fn sync_new(
    store: &dyn ItemStore,
    record: ContentItem,
    report: &mut SyncReport,
) -> Result<(), DocumentError> {
    if record.state != ItemState::Generated {
        report.conflicts.push(ItemFailure::new(
            &record.id,
            format!("new items must be in state generated, found {}", record.state),
        ));
        return Ok(());
    }

    let request = NewItem::new(record.content, record.category, record.kind)
        .with_id(record.id.clone())
        .with_hashtags(record.hashtags);

    match store.append(request) {
        Ok(item) => report.appended.push(item.id),
        Err(e) if e.is_fatal() => return Err(e.into()),
        Err(e) => report.conflicts.push(ItemFailure::new(&record.id, e)),
    }
    Ok(())
}

fn sync_existing(
    store: &dyn ItemStore,
    current: &ContentItem,
    record: ContentItem,
    report: &mut SyncReport,
) -> Result<(), DocumentError> {
    if *current == record {
        report.unchanged += 1;
        return Ok(());
    }

    // Only the content (and the edit bookkeeping that follows it) may differ.
    let mut normalized = record.clone();
    normalized.content = current.content.clone();
    normalized.state = current.state;
    normalized.edited_at = current.edited_at;

    if normalized != *current || record.content == current.content {
        report.conflicts.push(ItemFailure::new(
            &record.id,
            "record differs from the store in fields other than content",
        ));
        return Ok(());
    }

    match store.apply(
        &record.id,
        &Transition::Edit {
            content: record.content,
        },
    ) {
        Ok(item) => report.edited.push(item.id),
        Err(e) if e.is_fatal() => return Err(e.into()),
        Err(e) => report.conflicts.push(ItemFailure::new(&record.id, e)),
    }
    Ok(())
}
