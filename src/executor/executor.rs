//! Query executor
//!
//! Runs a compiled query against a backend and materializes the rows.
//!
//! Execution flow (strict order):
//! 1. Bind parameters positionally and run the compiled statement
//! 2. Map each row into the target's entity struct (properties only)
//! 3. Batch-load field values for all returned ids
//! 4. Batch-load note type names where the entity carries one
//! 5. Return entities in statement order

use crate::compiler::CompiledQuery;
use crate::observability::MetricsRegistry;
use crate::schema::EntityType;

use super::backend::{QueryBackend, SqlCursor};
use super::errors::ExecutorResult;
use super::materializer::Materializer;
use super::result::SelResult;
use super::rows::{map_history_entry, map_note, map_session, map_suggestion};

/// Executes compiled queries against a backend
pub struct SelExecutor<'b, B: QueryBackend + ?Sized> {
    backend: &'b B,
    metrics: Option<&'b MetricsRegistry>,
}

impl<'b, B: QueryBackend + ?Sized> SelExecutor<'b, B> {
    pub fn new(backend: &'b B) -> Self {
        Self {
            backend,
            metrics: None,
        }
    }

    /// Counts batch queries and returned rows into `metrics`
    pub fn with_metrics(mut self, metrics: &'b MetricsRegistry) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Executes a compiled query.
    ///
    /// A query matching nothing yields an empty result of the target type.
    pub fn execute(&self, compiled: &CompiledQuery) -> ExecutorResult<SelResult> {
        let materializer = Materializer::new(self.backend).with_metrics(self.metrics);

        let result = match compiled.target {
            EntityType::Note => SelResult::Notes(materializer.notes(self.fetch(compiled, map_note)?)?),
            EntityType::Suggestion => SelResult::Suggestions(
                materializer.suggestions(self.fetch(compiled, map_suggestion)?)?,
            ),
            EntityType::Session => SelResult::Sessions(self.fetch(compiled, map_session)?),
            EntityType::HistoryEntry => SelResult::HistoryEntries(
                materializer.history_entries(self.fetch(compiled, map_history_entry)?)?,
            ),
        };

        if let Some(metrics) = self.metrics {
            metrics.add_rows_returned(result.len() as u64);
        }
        Ok(result)
    }

    fn fetch<T>(
        &self,
        compiled: &CompiledQuery,
        map: fn(&dyn SqlCursor) -> ExecutorResult<T>,
    ) -> ExecutorResult<Vec<T>> {
        let mut rows = Vec::new();
        self.backend
            .for_each_row(&compiled.sql, &compiled.params, &mut |row| {
                rows.push(map(row)?);
                Ok(())
            })?;
        Ok(rows)
    }
}
