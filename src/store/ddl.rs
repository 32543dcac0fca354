//! Storage layout the engine reads
//!
//! The engine never writes these tables. The DDL exists so tests, tools and
//! fresh databases share one definition of the layout.

/// Tables and indexes for the four entity types and the shared field table
pub const STORE_DDL: &str = "
CREATE TABLE IF NOT EXISTS cached_note (
    id INTEGER PRIMARY KEY,
    deck_id INTEGER NOT NULL,
    deck_name TEXT NOT NULL,
    model_name TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '',
    mod INTEGER NOT NULL DEFAULT 0,
    estimated_tokens INTEGER,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS session (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    deck_id INTEGER NOT NULL,
    deck_name TEXT NOT NULL,
    prompt TEXT,
    state TEXT NOT NULL DEFAULT 'pending',
    state_message TEXT,
    exit_code INTEGER,
    progress_processed_cards INTEGER NOT NULL DEFAULT 0,
    progress_total_cards INTEGER NOT NULL DEFAULT 0,
    progress_processed_batches INTEGER NOT NULL DEFAULT 0,
    progress_total_batches INTEGER NOT NULL DEFAULT 0,
    progress_suggestions_count INTEGER NOT NULL DEFAULT 0,
    progress_input_tokens INTEGER NOT NULL DEFAULT 0,
    progress_output_tokens INTEGER NOT NULL DEFAULT 0,
    progress_failed_batches INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS suggestion (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    note_id INTEGER NOT NULL,
    session_id INTEGER NOT NULL REFERENCES session(id) ON DELETE CASCADE,
    reasoning TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'pending',
    created_at INTEGER NOT NULL,
    decided_at INTEGER,
    skipped_at INTEGER
);

CREATE TABLE IF NOT EXISTS history_entry (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    note_id INTEGER NOT NULL,
    suggestion_id INTEGER REFERENCES suggestion(id) ON DELETE SET NULL,
    session_id INTEGER REFERENCES session(id) ON DELETE SET NULL,
    deck_id INTEGER NOT NULL,
    deck_name TEXT NOT NULL,
    action TEXT NOT NULL,
    reasoning TEXT,
    timestamp INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS field_value (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    note_id INTEGER REFERENCES cached_note(id) ON DELETE CASCADE,
    suggestion_id INTEGER REFERENCES suggestion(id) ON DELETE CASCADE,
    history_id INTEGER REFERENCES history_entry(id) ON DELETE CASCADE,
    review_suggestion_id INTEGER,
    context TEXT NOT NULL,
    field_name TEXT NOT NULL,
    field_value TEXT NOT NULL DEFAULT '',
    field_order INTEGER NOT NULL DEFAULT 0,
    CHECK (
        (note_id IS NOT NULL) + (suggestion_id IS NOT NULL)
        + (history_id IS NOT NULL) + (review_suggestion_id IS NOT NULL) = 1
    )
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_field_value_note
    ON field_value(note_id, context, field_name) WHERE note_id IS NOT NULL;
CREATE UNIQUE INDEX IF NOT EXISTS idx_field_value_suggestion
    ON field_value(suggestion_id, context, field_name) WHERE suggestion_id IS NOT NULL;
CREATE UNIQUE INDEX IF NOT EXISTS idx_field_value_history
    ON field_value(history_id, context, field_name) WHERE history_id IS NOT NULL;
CREATE UNIQUE INDEX IF NOT EXISTS idx_field_value_review
    ON field_value(review_suggestion_id, context, field_name)
    WHERE review_suggestion_id IS NOT NULL;

CREATE INDEX IF NOT EXISTS idx_cached_note_deck ON cached_note(deck_name);
CREATE INDEX IF NOT EXISTS idx_suggestion_note ON suggestion(note_id);
CREATE INDEX IF NOT EXISTS idx_suggestion_session ON suggestion(session_id);
CREATE INDEX IF NOT EXISTS idx_history_note ON history_entry(note_id);
CREATE INDEX IF NOT EXISTS idx_history_session ON history_entry(session_id);
";
