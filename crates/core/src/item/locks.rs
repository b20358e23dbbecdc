//! Identity-keyed lock registry.
//!
//! Serializes read-modify-write cycles on the same item inside one process
//! while leaving other ids free. Cross-process exclusion is handled by the
//! store's versioned writes.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex};

use super::store::ItemError;

#[derive(Default)]
pub(crate) struct IdLocks {
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

impl IdLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Block until no other thread holds `id`, then take it.
    pub(crate) fn acquire(&self, id: &str) -> Result<IdGuard<'_>, ItemError> {
        let mut held = self.held.lock().map_err(|_| poisoned())?;
        while held.contains(id) {
            held = self.released.wait(held).map_err(|_| poisoned())?;
        }
        held.insert(id.to_string());
        Ok(IdGuard {
            locks: self,
            id: id.to_string(),
        })
    }

    #[cfg(test)]
    fn is_held(&self, id: &str) -> bool {
        self.held.lock().map(|held| held.contains(id)).unwrap_or(false)
    }
}

/// Releases the id when dropped.
pub(crate) struct IdGuard<'a> {
    locks: &'a IdLocks,
    id: String,
}

impl Drop for IdGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut held) = self.locks.held.lock() {
            held.remove(&self.id);
        }
        self.locks.released.notify_all();
    }
}

fn poisoned() -> ItemError {
    ItemError::Storage("item lock registry poisoned".to_string())
}
