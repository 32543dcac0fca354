//! Field values are loaded in batches, never per row
//!
//! A statement-recording backend wraps a real SQLite connection so the
//! number and shape of issued statements can be asserted.

mod common;

use common::{catalog, insert_note, insert_session, seed, RecordingBackend};
use rusqlite::params;
use sel_engine::ast::Scopes;
use sel_engine::executor::SelResult;
use sel_engine::store::SqliteStore;
use sel_engine::SelEngine;
use serde_json::json;

const SUGGESTIONS: i64 = 500;

fn store_with_many_suggestions() -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap();
    let conn = store.connection();
    insert_note(conn, 1, "Japanese", "Basic", "", &[("Front", "猫"), ("Back", "cat")]);
    insert_session(conn, 1, "Japanese", "done");

    conn.execute_batch("BEGIN").unwrap();
    {
        let mut suggestion = conn
            .prepare(
                "INSERT INTO suggestion (id, note_id, session_id, reasoning, status, created_at)
                 VALUES (?1, 1, 1, '', 'pending', ?1)",
            )
            .unwrap();
        let mut field = conn
            .prepare(
                "INSERT INTO field_value (suggestion_id, context, field_name, field_value, field_order)
                 VALUES (?1, ?2, 'Back', ?3, 1)",
            )
            .unwrap();
        for id in 1..=SUGGESTIONS {
            suggestion.execute(params![id]).unwrap();
            field.execute(params![id, "original", "cat"]).unwrap();
            field.execute(params![id, "changes", format!("cat #{}", id)]).unwrap();
        }
    }
    conn.execute_batch("COMMIT").unwrap();
    store
}

// =============================================================================
// Statement counts
// =============================================================================

#[test]
fn test_500_suggestions_issue_one_field_query() {
    let store = store_with_many_suggestions();
    let backend = RecordingBackend::new(store.connection());
    let engine = SelEngine::new(&backend, catalog());

    let doc = json!({"target": "Suggestion", "alias": "s", "where": true, "orderBy": {"prop": "id"}});
    let result = engine.execute_json(&doc.to_string(), &Scopes::new()).unwrap();

    let SelResult::Suggestions(list) = result else {
        panic!("expected suggestions");
    };
    assert_eq!(list.len(), SUGGESTIONS as usize);
    assert_eq!(list[0].field("changes", "Back"), Some("cat #1"));
    assert_eq!(list[499].field("changes", "Back"), Some("cat #500"));
    assert!(list.iter().all(|s| s.field("original", "Back") == Some("cat")));
    assert!(list.iter().all(|s| s.model_name.as_deref() == Some("Basic")));

    let statements = backend.statements();
    let field_queries = statements
        .iter()
        .filter(|sql| sql.contains("FROM field_value WHERE suggestion_id IN"))
        .count();
    assert_eq!(field_queries, 1);
    // main query, field batch, note type lookup
    assert_eq!(statements.len(), 3);

    let metrics = engine.metrics().snapshot();
    assert_eq!(metrics.field_batches, 1);
    assert_eq!(metrics.lookup_batches, 1);
    assert_eq!(metrics.rows_returned, SUGGESTIONS as u64);
}

#[test]
fn test_statement_count_is_independent_of_row_count() {
    let store = SqliteStore::open_in_memory().unwrap();
    seed(store.connection());

    for limit in [1, 2, 3] {
        let backend = RecordingBackend::new(store.connection());
        let engine = SelEngine::new(&backend, catalog());
        let doc = json!({"target": "Suggestion", "alias": "s", "where": true, "limit": limit});
        let result = engine.execute_json(&doc.to_string(), &Scopes::new()).unwrap();
        assert_eq!(result.len(), limit as usize);
        assert_eq!(backend.statements().len(), 3, "limit {}", limit);
    }
}

#[test]
fn test_notes_filter_field_batch_by_context() {
    let store = SqliteStore::open_in_memory().unwrap();
    seed(store.connection());
    let backend = RecordingBackend::new(store.connection());
    let engine = SelEngine::new(&backend, catalog());

    let doc = json!({"target": "Note", "alias": "n", "where": true});
    assert_eq!(engine.execute_json(&doc.to_string(), &Scopes::new()).unwrap().len(), 4);

    let statements = backend.statements();
    assert_eq!(statements.len(), 2);
    assert!(statements[1].contains("note_id IN (SELECT value FROM json_each(?)) AND context = ?"));
}

#[test]
fn test_empty_result_skips_batches() {
    let store = SqliteStore::open_in_memory().unwrap();
    seed(store.connection());
    let backend = RecordingBackend::new(store.connection());
    let engine = SelEngine::new(&backend, catalog());

    let doc = json!({"target": "HistoryEntry", "alias": "h", "where": {"==": [{"prop": "action"}, "edit"]}});
    assert!(engine.execute_json(&doc.to_string(), &Scopes::new()).unwrap().is_empty());
    assert_eq!(backend.statements().len(), 1);
}
