//! Per-key serialization of snapshot read-modify-write.
//!
//! A tracking operation loads the stored snapshot, diffs it and saves the
//! replacement. Holding the key's guard across that sequence keeps two
//! concurrent operations on the same entity from both diffing against the
//! same old snapshot. Different keys never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::OwnedMutexGuard;

use crate::key::EntityKey;

type KeyCell = Arc<tokio::sync::Mutex<()>>;

/// Registry of one async mutex per entity key.
#[derive(Default)]
pub struct KeyLocks {
    cells: Mutex<HashMap<EntityKey, KeyCell>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn cells(&self) -> MutexGuard<'_, HashMap<EntityKey, KeyCell>> {
        self.cells
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: &EntityKey) -> KeyGuard<'_> {
        let cell = Arc::clone(self.cells().entry(key.clone()).or_default());
        let guard = Arc::clone(&cell).lock_owned().await;
        KeyGuard {
            locks: self,
            key: key.clone(),
            cell,
            guard: Some(guard),
        }
    }

    /// Number of keys with a live cell (held or awaited).
    pub fn len(&self) -> usize {
        self.cells().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive access to one key; released on drop.
pub struct KeyGuard<'a> {
    locks: &'a KeyLocks,
    key: EntityKey,
    cell: KeyCell,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyGuard<'_> {
    pub fn key(&self) -> &EntityKey {
        &self.key
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut cells = self.locks.cells();
        // Registry + this guard are the only holders: nobody is waiting.
        if let Some(cell) = cells.get(&self.key)
            && Arc::ptr_eq(cell, &self.cell)
            && Arc::strong_count(&self.cell) == 2
        {
            cells.remove(&self.key);
        }
    }
}
