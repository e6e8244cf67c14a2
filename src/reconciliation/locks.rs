//! Per-account lock arena
//!
//! Serializes reconciliation per account without a global lock: each
//! account gets its own async mutex, and entries whose lock is no longer
//! held anywhere are pruned on the next acquisition.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub(crate) struct LockArena {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl LockArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the lock for `key`, creating it on first use.
    ///
    /// Idle entries (referenced only by the arena) are garbage-collected
    /// here, so the map stays proportional to in-flight reconciliations.
    pub fn lock_for(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    #[cfg(test)]
    pub fn active(&self) -> usize {
        self.locks.lock().unwrap().len()
    }
}
