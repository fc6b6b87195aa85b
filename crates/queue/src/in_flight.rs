//! Per-key in-flight guard.
//!
//! The archive worker must never run two cycles for the same company
//! concurrently: both would compute overlapping overflow sets and race
//! the purge transaction. The registry grants at most one guard per key;
//! a busy key makes the job fail retryably so the queue redelivers it.
//!
//! Scope is the current process: a single worker process consumes the
//! archive queue. Running several worker processes would need this lock
//! moved into Redis.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Tracks which keys currently have work in flight.
#[derive(Clone, Default)]
pub struct InFlightRegistry {
    keys: Arc<Mutex<HashSet<String>>>,
}

impl InFlightRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to acquire the key. Returns `None` while another guard for
    /// the same key is alive.
    #[must_use]
    pub fn try_acquire(&self, key: &str) -> Option<InFlightGuard> {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        if keys.insert(key.to_string()) {
            Some(InFlightGuard {
                registry: self.clone(),
                key: key.to_string(),
            })
        } else {
            None
        }
    }

    /// Number of keys currently in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, key: &str) {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// RAII guard; dropping it releases the key.
pub struct InFlightGuard {
    registry: InFlightRegistry,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.release(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_key_is_exclusive() {
        let registry = InFlightRegistry::new();

        let guard = registry.try_acquire("c1");
        assert!(guard.is_some());
        assert!(registry.try_acquire("c1").is_none());

        drop(guard);
        assert!(registry.try_acquire("c1").is_some());
    }

    #[test]
    fn test_distinct_keys_are_independent() {
        let registry = InFlightRegistry::new();

        let _a = registry.try_acquire("c1");
        let _b = registry.try_acquire("c2");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_drop_releases_even_on_scope_exit() {
        let registry = InFlightRegistry::new();
        {
            let _guard = registry.try_acquire("c1");
            assert_eq!(registry.len(), 1);
        }
        assert!(registry.is_empty());
    }
}
