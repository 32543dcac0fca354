//! ObservationScope for begin/complete logging around a unit of work
//!
//! - Logs `{name}_BEGIN` on creation
//! - Logs `{name}_COMPLETE` or `{name}_FAILED` when closed explicitly
//! - Logs `{name}_INCOMPLETE` on drop if never closed

use std::cell::Cell;
use std::time::Instant;

use tracing::{debug, info, warn};

/// A scope that logs its own lifecycle
///
/// ```ignore
/// let scope = ObservationScope::new("CATALOG_LOAD");
/// // ... do work ...
/// scope.complete_with(&[("names", "12")]);
/// ```
pub struct ObservationScope<'a> {
    name: &'a str,
    started: Instant,
    completed: Cell<bool>,
}

impl<'a> ObservationScope<'a> {
    pub fn new(name: &'a str) -> Self {
        debug!("{}_BEGIN", name);
        Self {
            name,
            started: Instant::now(),
            completed: Cell::new(false),
        }
    }

    pub fn complete(self) {
        self.complete_with(&[]);
    }

    /// Logs `{name}_COMPLETE` with elapsed time and extra key/value pairs
    pub fn complete_with(self, fields: &[(&str, &str)]) {
        self.completed.set(true);
        info!(
            elapsed_ms = self.elapsed_ms(),
            fields = ?fields,
            "{}_COMPLETE",
            self.name
        );
    }

    /// Logs `{name}_FAILED` with a reason
    pub fn fail(self, reason: &str) {
        self.completed.set(true);
        warn!(
            elapsed_ms = self.elapsed_ms(),
            reason,
            "{}_FAILED",
            self.name
        );
    }

    pub fn is_completed(&self) -> bool {
        self.completed.get()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

impl Drop for ObservationScope<'_> {
    fn drop(&mut self) {
        if !self.completed.get() {
            warn!(
                reason = "scope dropped without completion",
                "{}_INCOMPLETE",
                self.name
            );
        }
    }
}
