//! Operational counters
//!
//! - Counters only, monotonic
//! - Reset only on process start
//! - Atomic increments, no locking

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    tables_validated: AtomicU64,
    tables_rejected: AtomicU64,
    relationships_validated: AtomicU64,
    relationships_rejected: AtomicU64,
    locks_acquired: AtomicU64,
    lock_conflicts: AtomicU64,
    locks_released: AtomicU64,
    locks_renewed: AtomicU64,
    locks_expired: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of a table validation
    pub fn record_table_validation(&self, valid: bool) {
        let counter = if valid {
            &self.tables_validated
        } else {
            &self.tables_rejected
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Records the outcome of a relationship validation
    pub fn record_relationship_validation(&self, valid: bool) {
        let counter = if valid {
            &self.relationships_validated
        } else {
            &self.relationships_rejected
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_locks_acquired(&self) {
        self.locks_acquired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_lock_conflicts(&self) {
        self.lock_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_locks_released(&self) {
        self.locks_released.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_locks_renewed(&self) {
        self.locks_renewed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_locks_expired(&self, count: u64) {
        self.locks_expired.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tables_validated: self.tables_validated.load(Ordering::Relaxed),
            tables_rejected: self.tables_rejected.load(Ordering::Relaxed),
            relationships_validated: self.relationships_validated.load(Ordering::Relaxed),
            relationships_rejected: self.relationships_rejected.load(Ordering::Relaxed),
            locks_acquired: self.locks_acquired.load(Ordering::Relaxed),
            lock_conflicts: self.lock_conflicts.load(Ordering::Relaxed),
            locks_released: self.locks_released.load(Ordering::Relaxed),
            locks_renewed: self.locks_renewed.load(Ordering::Relaxed),
            locks_expired: self.locks_expired.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of every counter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub tables_validated: u64,
    pub tables_rejected: u64,
    pub relationships_validated: u64,
    pub relationships_rejected: u64,
    pub locks_acquired: u64,
    pub lock_conflicts: u64,
    pub locks_released: u64,
    pub locks_renewed: u64,
    pub locks_expired: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_is_zero() {
        assert_eq!(MetricsRegistry::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_validation_outcomes_split() {
        let registry = MetricsRegistry::new();
        registry.record_table_validation(true);
        registry.record_table_validation(false);
        registry.record_table_validation(false);
        registry.record_relationship_validation(true);

        let snap = registry.snapshot();
        assert_eq!(snap.tables_validated, 1);
        assert_eq!(snap.tables_rejected, 2);
        assert_eq!(snap.relationships_validated, 1);
        assert_eq!(snap.relationships_rejected, 0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let registry = MetricsRegistry::new();
        registry.increment_lock_conflicts();
        registry.add_locks_expired(3);
        let json = serde_json::to_value(registry.snapshot()).unwrap();
        assert_eq!(json["lock_conflicts"], 1);
        assert_eq!(json["locks_expired"], 3);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(MetricsRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reg = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..100 {
                        reg.increment_locks_acquired();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(registry.snapshot().locks_acquired, 800);
    }
}
