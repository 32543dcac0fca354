//! Observability for the query engine
//!
//! - Structured logging through `tracing`
//! - Atomic counters
//! - Typed lifecycle events
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No background threads
//!
//! The library only emits events. Installing a subscriber is the
//! caller's job; the `sel` binary does it from `SEL_LOG`.
//!
//! ```ignore
//! use sel_engine::observability::{Event, MetricsRegistry, ObservationScope};
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_queries_executed();
//!
//! let scope = ObservationScope::new("CATALOG_LOAD");
//! // ... do work ...
//! scope.complete();
//! ```

mod events;
mod metrics;
mod scope;

pub use events::Event;
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::ObservationScope;
