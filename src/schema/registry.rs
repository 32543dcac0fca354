//! Static schema table for the four entity types

use super::types::{
    EntitySchema, EntityType, FieldContextDef, PropertyDef, PropertyKind, RelationDef, ScopeDef,
    ScopeKind,
};

const fn prop(
    name: &'static str,
    column: &'static str,
    kind: PropertyKind,
    label: &'static str,
    nullable: bool,
) -> PropertyDef {
    PropertyDef {
        name,
        column,
        kind,
        label,
        nullable,
    }
}

const fn ctx(key: &'static str, tag: &'static str) -> FieldContextDef {
    FieldContextDef { key, tag }
}

const fn rel(target: EntityType, property: &'static str) -> RelationDef {
    RelationDef {
        target,
        property,
        target_property: "id",
    }
}

const DECK_SCOPE: ScopeDef = ScopeDef {
    key: "deck",
    kind: ScopeKind::Deck,
    property: "deckName",
};

const SESSION_SCOPE: ScopeDef = ScopeDef {
    key: "session",
    kind: ScopeKind::Session,
    property: "sessionId",
};

use super::types::PropertyKind::{Integer, Text, Timestamp};

static NOTE: EntitySchema = EntitySchema {
    entity: EntityType::Note,
    table: "cached_note",
    properties: &[
        prop("id", "id", Integer, "Note ID", false),
        prop("deckId", "deck_id", Integer, "Deck ID", false),
        prop("deckName", "deck_name", Text, "Deck", false),
        prop("modelName", "model_name", Text, "Note Type", false),
        prop("tags", "tags", Text, "Tags", false),
        prop("mod", "mod", Integer, "Modified (Anki)", false),
        prop("estimatedTokens", "estimated_tokens", Integer, "Estimated Tokens", true),
        prop("createdAt", "created_at", Timestamp, "Created", false),
        prop("updatedAt", "updated_at", Timestamp, "Updated", false),
    ],
    field_contexts: &[ctx("fields", "fields")],
    relations: &[],
    scopes: &[DECK_SCOPE],
    field_fk: Some("note_id"),
};

static SUGGESTION: EntitySchema = EntitySchema {
    entity: EntityType::Suggestion,
    table: "suggestion",
    properties: &[
        prop("id", "id", Integer, "Suggestion ID", false),
        prop("noteId", "note_id", Integer, "Note ID", false),
        prop("sessionId", "session_id", Integer, "Session ID", false),
        prop("reasoning", "reasoning", Text, "Reasoning", false),
        prop("status", "status", Text, "Status", false),
        prop("createdAt", "created_at", Timestamp, "Created", false),
        prop("decidedAt", "decided_at", Timestamp, "Decided", true),
        prop("skippedAt", "skipped_at", Timestamp, "Skipped", true),
    ],
    field_contexts: &[
        ctx("original", "original"),
        ctx("changes", "changes"),
        ctx("edited", "edited"),
    ],
    relations: &[
        rel(EntityType::Note, "noteId"),
        rel(EntityType::Session, "sessionId"),
    ],
    scopes: &[SESSION_SCOPE],
    field_fk: Some("suggestion_id"),
};

static SESSION: EntitySchema = EntitySchema {
    entity: EntityType::Session,
    table: "session",
    properties: &[
        prop("id", "id", Integer, "Session ID", false),
        prop("deckId", "deck_id", Integer, "Deck ID", false),
        prop("deckName", "deck_name", Text, "Deck", false),
        prop("prompt", "prompt", Text, "Prompt", true),
        prop("state", "state", Text, "State", false),
        prop("stateMessage", "state_message", Text, "State Message", true),
        prop("exitCode", "exit_code", Integer, "Exit Code", true),
        prop("processedCards", "progress_processed_cards", Integer, "Processed Cards", false),
        prop("totalCards", "progress_total_cards", Integer, "Total Cards", false),
        prop("processedBatches", "progress_processed_batches", Integer, "Processed Batches", false),
        prop("totalBatches", "progress_total_batches", Integer, "Total Batches", false),
        prop("suggestionsCount", "progress_suggestions_count", Integer, "Suggestions", false),
        prop("inputTokens", "progress_input_tokens", Integer, "Input Tokens", false),
        prop("outputTokens", "progress_output_tokens", Integer, "Output Tokens", false),
        prop("failedBatches", "progress_failed_batches", Integer, "Failed Batches", false),
        prop("createdAt", "created_at", Timestamp, "Created", false),
        prop("updatedAt", "updated_at", Timestamp, "Updated", false),
    ],
    field_contexts: &[],
    relations: &[],
    scopes: &[DECK_SCOPE],
    field_fk: None,
};

static HISTORY_ENTRY: EntitySchema = EntitySchema {
    entity: EntityType::HistoryEntry,
    table: "history_entry",
    properties: &[
        prop("id", "id", Integer, "History ID", false),
        prop("noteId", "note_id", Integer, "Note ID", false),
        prop("suggestionId", "suggestion_id", Integer, "Suggestion ID", true),
        prop("sessionId", "session_id", Integer, "Session ID", true),
        prop("deckId", "deck_id", Integer, "Deck ID", false),
        prop("deckName", "deck_name", Text, "Deck", false),
        prop("action", "action", Text, "Action", false),
        prop("reasoning", "reasoning", Text, "Reasoning", true),
        prop("timestamp", "timestamp", Timestamp, "Timestamp", false),
    ],
    field_contexts: &[
        ctx("original", "original"),
        ctx("aiChanges", "ai_changes"),
        ctx("applied", "applied"),
        ctx("userEdits", "user_edits"),
    ],
    relations: &[
        rel(EntityType::Note, "noteId"),
        rel(EntityType::Suggestion, "suggestionId"),
        rel(EntityType::Session, "sessionId"),
    ],
    scopes: &[DECK_SCOPE, SESSION_SCOPE],
    field_fk: Some("history_id"),
};

pub(super) fn schema_for(entity: EntityType) -> &'static EntitySchema {
    match entity {
        EntityType::Note => &NOTE,
        EntityType::Suggestion => &SUGGESTION,
        EntityType::Session => &SESSION,
        EntityType::HistoryEntry => &HISTORY_ENTRY,
    }
}

/// All schemas in entity declaration order
pub fn all_schemas() -> impl Iterator<Item = &'static EntitySchema> {
    EntityType::ALL.into_iter().map(schema_for)
}
