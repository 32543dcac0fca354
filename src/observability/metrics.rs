//! Metrics registry for the query engine
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only when the registry is recreated
//! - Thread-safe but lock-free

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Operational counters of one engine instance
///
/// All counters use Relaxed ordering; readers only need eventual values.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Documents that parsed into a query
    queries_parsed: AtomicU64,
    /// Queries that compiled to SQL
    queries_compiled: AtomicU64,
    /// Queries that executed and materialized
    queries_executed: AtomicU64,
    /// Queries refused at parse or compile time
    queries_rejected: AtomicU64,
    /// Queries that failed in the store
    queries_failed: AtomicU64,
    /// Entities returned across all executions
    rows_returned: AtomicU64,
    /// Batch queries against the field table
    field_batches: AtomicU64,
    /// Batch note type lookups
    lookup_batches: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Pipeline stages

    pub fn increment_queries_parsed(&self) {
        self.queries_parsed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_compiled(&self) {
        self.queries_compiled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_failed(&self) {
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
    }

    // Materialization

    pub fn add_rows_returned(&self, rows: u64) {
        self.rows_returned.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn increment_field_batches(&self) {
        self.field_batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_lookup_batches(&self) {
        self.lookup_batches.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_parsed: self.queries_parsed.load(Ordering::Relaxed),
            queries_compiled: self.queries_compiled.load(Ordering::Relaxed),
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
            queries_failed: self.queries_failed.load(Ordering::Relaxed),
            rows_returned: self.rows_returned.load(Ordering::Relaxed),
            field_batches: self.field_batches.load(Ordering::Relaxed),
            lookup_batches: self.lookup_batches.load(Ordering::Relaxed),
        }
    }

    /// Current counters as JSON
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or(serde_json::Value::Null)
    }
}

/// A point-in-time copy of all counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub queries_parsed: u64,
    pub queries_compiled: u64,
    pub queries_executed: u64,
    pub queries_rejected: u64,
    pub queries_failed: u64,
    pub rows_returned: u64,
    pub field_batches: u64,
    pub lookup_batches: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        assert_eq!(MetricsRegistry::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_increment_counters() {
        let registry = MetricsRegistry::new();
        registry.increment_queries_parsed();
        registry.increment_queries_parsed();
        registry.increment_queries_compiled();
        registry.increment_queries_rejected();
        registry.increment_field_batches();
        registry.add_rows_returned(500);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.queries_parsed, 2);
        assert_eq!(snapshot.queries_compiled, 1);
        assert_eq!(snapshot.queries_executed, 0);
        assert_eq!(snapshot.queries_rejected, 1);
        assert_eq!(snapshot.field_batches, 1);
        assert_eq!(snapshot.rows_returned, 500);
    }

    #[test]
    fn test_to_json() {
        let registry = MetricsRegistry::new();
        registry.increment_lookup_batches();
        let json = registry.to_json();
        assert_eq!(json["lookup_batches"], 1);
        assert_eq!(json["queries_failed"], 0);
    }

    #[test]
    fn test_shared_across_threads() {
        let registry = std::sync::Arc::new(MetricsRegistry::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let r = registry.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        r.increment_queries_executed();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(registry.snapshot().queries_executed, 400);
    }
}
