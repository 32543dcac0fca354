//! Batch loading of field values into materialized entities
//!
//! One `field_value` query per entity type per top-level query, however
//! many rows matched. Ids travel as a single JSON array parameter unpacked
//! with `json_each`, so the statement text never depends on row count.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::compiler::SqlParam;
use crate::observability::{Event, MetricsRegistry};
use crate::schema::EntityType;

use super::backend::QueryBackend;
use super::errors::{ExecutorError, ExecutorResult};
use super::result::{FieldMap, FieldValue, HistoryEntry, Note, Suggestion};

/// Ids as a JSON array literal for `json_each(?)`
fn id_array(ids: &[i64]) -> SqlParam {
    SqlParam::Text(serde_json::Value::from(ids.to_vec()).to_string())
}

/// Merges field rows and note lookups into entity rows
pub struct Materializer<'b, B: QueryBackend + ?Sized> {
    backend: &'b B,
    metrics: Option<&'b MetricsRegistry>,
}

impl<'b, B: QueryBackend + ?Sized> Materializer<'b, B> {
    pub fn new(backend: &'b B) -> Self {
        Self {
            backend,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Option<&'b MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Loads the field rows of `ids`, grouped by owner id then context key.
    ///
    /// Issues no query when `ids` is empty or the entity owns no fields.
    /// Rows tagged with a context the entity does not declare are skipped.
    pub fn load_fields(
        &self,
        entity: EntityType,
        ids: &[i64],
    ) -> ExecutorResult<HashMap<i64, FieldMap>> {
        let schema = entity.schema();
        let fk = match schema.field_fk {
            Some(fk) if schema.has_fields() && !ids.is_empty() => fk,
            _ => return Ok(HashMap::new()),
        };

        let mut sql = format!(
            "SELECT {fk}, context, field_name, field_value, field_order FROM field_value \
             WHERE {fk} IN (SELECT value FROM json_each(?))"
        );
        let mut params = vec![id_array(ids)];
        if let [only] = schema.field_contexts {
            sql.push_str(" AND context = ?");
            params.push(SqlParam::from(only.tag));
        }
        sql.push_str(&format!(" ORDER BY {fk}, field_order"));

        let mut grouped: HashMap<i64, FieldMap> = HashMap::new();
        let mut loaded = 0usize;
        let mut skipped: BTreeSet<String> = BTreeSet::new();

        self.backend.for_each_row(&sql, &params, &mut |row| {
            let owner = row
                .integer(0)?
                .ok_or_else(|| ExecutorError::row_decode("field row without owner"))?;
            let tag = row.text(1)?.unwrap_or_default();
            let Some(context) = schema.field_context_by_tag(&tag) else {
                skipped.insert(tag);
                return Ok(());
            };
            let name = row.text(2)?.unwrap_or_default();
            let value = row.text(3)?.unwrap_or_default();
            let order = row.integer(4)?.unwrap_or(0);

            grouped
                .entry(owner)
                .or_default()
                .entry(context.key.to_string())
                .or_default()
                .insert(name, FieldValue::new(value, order));
            loaded += 1;
            Ok(())
        })?;

        if let Some(metrics) = self.metrics {
            metrics.increment_field_batches();
        }
        if !skipped.is_empty() {
            debug!(entity = %entity, tags = ?skipped, "ignored undeclared field contexts");
        }
        debug!(
            entity = %entity,
            owners = ids.len(),
            rows = loaded,
            "{}",
            Event::FieldsBatchLoaded
        );
        Ok(grouped)
    }

    /// Note type names for a set of note ids, in one lookup
    pub fn load_model_names(
        &self,
        note_ids: impl IntoIterator<Item = i64>,
    ) -> ExecutorResult<HashMap<i64, String>> {
        let ids: Vec<i64> = note_ids
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT id, model_name FROM {} WHERE id IN (SELECT value FROM json_each(?))",
            EntityType::Note.schema().table
        );
        let mut names = HashMap::with_capacity(ids.len());
        self.backend.for_each_row(&sql, &[id_array(&ids)], &mut |row| {
            if let (Some(id), Some(name)) = (row.integer(0)?, row.text(1)?) {
                names.insert(id, name);
            }
            Ok(())
        })?;

        if let Some(metrics) = self.metrics {
            metrics.increment_lookup_batches();
        }
        Ok(names)
    }

    pub fn notes(&self, mut notes: Vec<Note>) -> ExecutorResult<Vec<Note>> {
        let ids: Vec<i64> = notes.iter().map(|n| n.id).collect();
        let mut fields = self.load_fields(EntityType::Note, &ids)?;
        for note in &mut notes {
            if let Some(group) = fields.remove(&note.id) {
                note.fields = group;
            }
        }
        Ok(notes)
    }

    pub fn suggestions(&self, mut suggestions: Vec<Suggestion>) -> ExecutorResult<Vec<Suggestion>> {
        let ids: Vec<i64> = suggestions.iter().map(|s| s.id).collect();
        let mut fields = self.load_fields(EntityType::Suggestion, &ids)?;
        let models = self.load_model_names(suggestions.iter().map(|s| s.note_id))?;
        for suggestion in &mut suggestions {
            if let Some(group) = fields.remove(&suggestion.id) {
                suggestion.fields = group;
            }
            suggestion.model_name = models.get(&suggestion.note_id).cloned();
        }
        Ok(suggestions)
    }

    pub fn history_entries(&self, mut entries: Vec<HistoryEntry>) -> ExecutorResult<Vec<HistoryEntry>> {
        let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
        let mut fields = self.load_fields(EntityType::HistoryEntry, &ids)?;
        let models = self.load_model_names(entries.iter().map(|e| e.note_id))?;
        for entry in &mut entries {
            if let Some(group) = fields.remove(&entry.id) {
                entry.fields = group;
            }
            entry.model_name = models.get(&entry.note_id).cloned();
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use rusqlite::Connection;
    use std::cell::RefCell;

    /// Records every statement before delegating to SQLite
    struct Recording<'a> {
        inner: &'a Connection,
        statements: RefCell<Vec<String>>,
    }

    impl QueryBackend for Recording<'_> {
        fn for_each_row(
            &self,
            sql: &str,
            params: &[SqlParam],
            visit: &mut dyn FnMut(&dyn super::super::backend::SqlCursor) -> ExecutorResult<()>,
        ) -> ExecutorResult<()> {
            self.statements.borrow_mut().push(sql.to_string());
            self.inner.for_each_row(sql, params, visit)
        }
    }

    fn seeded() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .connection()
            .execute_batch(
                "INSERT INTO cached_note (id, deck_id, deck_name, model_name, tags, mod, created_at, updated_at)
                     VALUES (1, 1, 'Japanese', 'Basic', '', 0, 0, 0),
                            (2, 1, 'Japanese', 'Cloze', '', 0, 0, 0);
                 INSERT INTO session (id, deck_id, deck_name, state, created_at, updated_at)
                     VALUES (1, 1, 'Japanese', 'done', 0, 0);
                 INSERT INTO suggestion (id, note_id, session_id, reasoning, status, created_at)
                     VALUES (10, 1, 1, 'typo', 'pending', 0),
                            (11, 2, 1, 'style', 'pending', 0);
                 INSERT INTO field_value (note_id, context, field_name, field_value, field_order)
                     VALUES (1, 'fields', 'Front', '猫', 0),
                            (1, 'fields', 'Back', 'cat', 1);
                 INSERT INTO field_value (suggestion_id, context, field_name, field_value, field_order)
                     VALUES (10, 'original', 'Back', 'cta', 1),
                            (10, 'changes', 'Back', 'cat', 1),
                            (10, 'legacy', 'Back', 'x', 1),
                            (11, 'edited', 'Text', '{{c1::a}}', 0);",
            )
            .unwrap();
        store
    }

    #[test]
    fn test_fields_grouped_by_owner_and_context() {
        let store = seeded();
        let m = Materializer::new(store.connection());
        let fields = m.load_fields(EntityType::Suggestion, &[10, 11]).unwrap();

        assert_eq!(fields[&10]["original"]["Back"].value, "cta");
        assert_eq!(fields[&10]["changes"]["Back"].value, "cat");
        assert!(!fields[&10].contains_key("legacy"));
        assert_eq!(fields[&11]["edited"]["Text"].order, 0);
    }

    #[test]
    fn test_one_statement_per_batch() {
        let store = seeded();
        let backend = Recording {
            inner: store.connection(),
            statements: RefCell::new(Vec::new()),
        };
        let metrics = MetricsRegistry::new();
        let m = Materializer::new(&backend).with_metrics(Some(&metrics));
        let rows = vec![
            crate::executor::rows::map_suggestion(&FixedSuggestion(10)).unwrap(),
            crate::executor::rows::map_suggestion(&FixedSuggestion(11)).unwrap(),
        ];
        let out = m.suggestions(rows).unwrap();

        assert_eq!(backend.statements.borrow().len(), 2);
        assert_eq!(out[0].model_name.as_deref(), Some("Basic"));
        assert_eq!(out[1].model_name.as_deref(), Some("Cloze"));
        assert_eq!(out[0].field("changes", "Back"), Some("cat"));
        assert_eq!(metrics.snapshot().field_batches, 1);
        assert_eq!(metrics.snapshot().lookup_batches, 1);
    }

    #[test]
    fn test_empty_ids_issue_no_query() {
        let store = seeded();
        let backend = Recording {
            inner: store.connection(),
            statements: RefCell::new(Vec::new()),
        };
        let m = Materializer::new(&backend);
        assert!(m.notes(Vec::new()).unwrap().is_empty());
        assert!(m.load_fields(EntityType::Session, &[1]).unwrap().is_empty());
        assert!(backend.statements.borrow().is_empty());
    }

    #[test]
    fn test_note_batch_filters_single_context() {
        let store = seeded();
        let backend = Recording {
            inner: store.connection(),
            statements: RefCell::new(Vec::new()),
        };
        let fields = Materializer::new(&backend)
            .load_fields(EntityType::Note, &[1, 2])
            .unwrap();
        assert!(backend.statements.borrow()[0].contains("AND context = ?"));
        assert_eq!(fields[&1]["fields"].len(), 2);
        assert!(!fields.contains_key(&2));
    }

    /// Suggestion row whose note id is derived from its id
    struct FixedSuggestion(i64);

    impl super::super::backend::SqlCursor for FixedSuggestion {
        fn integer(&self, index: usize) -> ExecutorResult<Option<i64>> {
            Ok(match index {
                0 => Some(self.0),
                1 => Some(self.0 - 9),
                2 => Some(1),
                5 => Some(0),
                _ => None,
            })
        }

        fn text(&self, index: usize) -> ExecutorResult<Option<String>> {
            Ok(match index {
                3 => Some(String::new()),
                4 => Some("pending".into()),
                _ => None,
            })
        }
    }
}
