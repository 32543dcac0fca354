//! Shared fixtures for integration tests
//!
//! Real SQLite databases seeded from the store layout. No mocks except
//! the statement-recording backend, which delegates to a real connection.

#![allow(dead_code)]

use std::cell::RefCell;

use rusqlite::{params, Connection};
use sel_engine::ast::{ScopeValue, Scopes};
use sel_engine::compiler::SqlParam;
use sel_engine::executor::{ExecutorResult, QueryBackend, SqlCursor};
use sel_engine::schema::FieldCatalog;
use sel_engine::store::SqliteStore;
use sel_engine::SelEngine;

pub const T0: i64 = 1_700_000_000_000;

pub fn insert_note(
    conn: &Connection,
    id: i64,
    deck: &str,
    model: &str,
    tags: &str,
    fields: &[(&str, &str)],
) {
    conn.execute(
        "INSERT INTO cached_note (id, deck_id, deck_name, model_name, tags, mod, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![id, deck.len() as i64, deck, model, tags, id * 10, T0 + id],
    )
    .unwrap();
    for (order, (name, value)) in fields.iter().enumerate() {
        conn.execute(
            "INSERT INTO field_value (note_id, context, field_name, field_value, field_order)
             VALUES (?1, 'fields', ?2, ?3, ?4)",
            params![id, name, value, order as i64],
        )
        .unwrap();
    }
}

pub fn insert_session(conn: &Connection, id: i64, deck: &str, state: &str) {
    conn.execute(
        "INSERT INTO session (id, deck_id, deck_name, prompt, state, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'tidy up', ?4, ?5, ?5)",
        params![id, deck.len() as i64, deck, state, T0 + id],
    )
    .unwrap();
}

/// Inserts a suggestion with `(context, field, value)` triples
pub fn insert_suggestion(
    conn: &Connection,
    id: i64,
    note_id: i64,
    session_id: i64,
    status: &str,
    fields: &[(&str, &str, &str)],
) {
    conn.execute(
        "INSERT INTO suggestion (id, note_id, session_id, reasoning, status, created_at)
         VALUES (?1, ?2, ?3, 'fix', ?4, ?5)",
        params![id, note_id, session_id, status, T0 + id],
    )
    .unwrap();
    for (order, (context, name, value)) in fields.iter().enumerate() {
        conn.execute(
            "INSERT INTO field_value (suggestion_id, context, field_name, field_value, field_order)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, context, name, value, order as i64],
        )
        .unwrap();
    }
}

/// Inserts a history entry with `(context tag, field, value)` triples
#[allow(clippy::too_many_arguments)]
pub fn insert_history(
    conn: &Connection,
    id: i64,
    note_id: i64,
    suggestion_id: Option<i64>,
    session_id: Option<i64>,
    deck: &str,
    action: &str,
    fields: &[(&str, &str, &str)],
) {
    conn.execute(
        "INSERT INTO history_entry (id, note_id, suggestion_id, session_id, deck_id, deck_name, action, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![id, note_id, suggestion_id, session_id, deck.len() as i64, deck, action, T0 + id],
    )
    .unwrap();
    for (order, (context, name, value)) in fields.iter().enumerate() {
        conn.execute(
            "INSERT INTO field_value (history_id, context, field_name, field_value, field_order)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, context, name, value, order as i64],
        )
        .unwrap();
    }
}

/// Four notes across sibling decks, two sessions, three suggestions and
/// two history entries.
pub fn seed(conn: &Connection) {
    insert_note(conn, 1, "Japanese", "Basic", "verb", &[("Front", "猫"), ("Back", "cat")]);
    insert_note(conn, 2, "Japanese::Kanji", "Basic", "leech", &[("Front", "水"), ("Back", "water")]);
    insert_note(conn, 3, "Japanese2", "Basic", "", &[("Front", "犬"), ("Back", "dog")]);
    insert_note(conn, 4, "French", "Cloze", "", &[("Text", "Le {{c1::chat}}"), ("Extra", "")]);

    insert_session(conn, 1, "Japanese", "done");
    insert_session(conn, 2, "French", "failed");
    conn.execute(
        "UPDATE session SET progress_total_batches = 4, progress_processed_batches = 3,
                            progress_failed_batches = 1, progress_input_tokens = 900
         WHERE id = 2",
        [],
    )
    .unwrap();

    insert_suggestion(
        conn,
        10,
        1,
        1,
        "pending",
        &[("original", "Back", "cat"), ("changes", "Back", "a cat")],
    );
    insert_suggestion(conn, 11, 2, 1, "accepted", &[("changes", "Front", "氷")]);
    insert_suggestion(conn, 12, 4, 2, "rejected", &[("changes", "Extra", "feline")]);

    insert_history(
        conn,
        100,
        1,
        Some(10),
        Some(1),
        "Japanese",
        "accept",
        &[("ai_changes", "Back", "a cat"), ("applied", "Back", "a cat")],
    );
    insert_history(conn, 101, 4, Some(12), Some(2), "French", "reject", &[]);
}

pub fn catalog() -> FieldCatalog {
    FieldCatalog::uniform(["Front", "Back", "Text", "Extra"])
}

pub fn seeded_store() -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap();
    seed(store.connection());
    store
}

pub fn seeded_engine() -> SelEngine<SqliteStore> {
    SelEngine::new(seeded_store(), catalog())
}

pub fn deck_scope(name: &str) -> Scopes {
    let mut scopes = Scopes::new();
    scopes.insert("deck".to_string(), ScopeValue::deck(name));
    scopes
}

/// Records every statement before delegating to SQLite
pub struct RecordingBackend<'a> {
    inner: &'a Connection,
    statements: RefCell<Vec<String>>,
}

impl<'a> RecordingBackend<'a> {
    pub fn new(inner: &'a Connection) -> Self {
        Self {
            inner,
            statements: RefCell::new(Vec::new()),
        }
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.borrow().clone()
    }
}

impl QueryBackend for RecordingBackend<'_> {
    fn for_each_row(
        &self,
        sql: &str,
        params: &[SqlParam],
        visit: &mut dyn FnMut(&dyn SqlCursor) -> ExecutorResult<()>,
    ) -> ExecutorResult<()> {
        self.statements.borrow_mut().push(sql.to_string());
        self.inner.for_each_row(sql, params, visit)
    }
}
