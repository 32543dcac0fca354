//! Materialized entities returned by query execution

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::schema::EntityType;

/// One stored field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldValue {
    pub value: String,
    /// Position of the field in its note type
    pub order: i64,
}

impl FieldValue {
    pub fn new(value: impl Into<String>, order: i64) -> Self {
        Self {
            value: value.into(),
            order,
        }
    }
}

/// Field values grouped by context key, then by field name
pub type FieldMap = BTreeMap<String, BTreeMap<String, FieldValue>>;

/// Looks up a field value by context key and name
fn lookup<'a>(fields: &'a FieldMap, context: &str, name: &str) -> Option<&'a str> {
    fields
        .get(context)
        .and_then(|group| group.get(name))
        .map(|f| f.value.as_str())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: i64,
    pub deck_id: i64,
    pub deck_name: String,
    pub model_name: String,
    /// Whitespace-separated tag list, split
    pub tags: Vec<String>,
    #[serde(rename = "mod")]
    pub modified: i64,
    pub estimated_tokens: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub fields: FieldMap,
}

impl Note {
    /// Value of a note field, if present
    pub fn field(&self, name: &str) -> Option<&str> {
        lookup(&self.fields, "fields", name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: i64,
    pub note_id: i64,
    pub session_id: i64,
    pub reasoning: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub skipped_at: Option<DateTime<Utc>>,
    /// Note type of the suggested note, when the note is still cached
    pub model_name: Option<String>,
    pub fields: FieldMap,
}

impl Suggestion {
    pub fn field(&self, context: &str, name: &str) -> Option<&str> {
        lookup(&self.fields, context, name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: i64,
    pub deck_id: i64,
    pub deck_name: String,
    pub prompt: Option<String>,
    pub state: String,
    pub state_message: Option<String>,
    pub exit_code: Option<i64>,
    pub progress: SessionProgress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Counters a running session keeps up to date
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgress {
    pub processed_cards: i64,
    pub total_cards: i64,
    pub processed_batches: i64,
    pub total_batches: i64,
    pub suggestions_count: i64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub failed_batches: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: i64,
    pub note_id: i64,
    pub suggestion_id: Option<i64>,
    pub session_id: Option<i64>,
    pub deck_id: i64,
    pub deck_name: String,
    pub action: String,
    pub reasoning: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub model_name: Option<String>,
    pub fields: FieldMap,
}

impl HistoryEntry {
    pub fn field(&self, context: &str, name: &str) -> Option<&str> {
        lookup(&self.fields, context, name)
    }
}

/// Typed result of one top-level query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "target", content = "entities")]
pub enum SelResult {
    #[serde(rename = "Note")]
    Notes(Vec<Note>),
    #[serde(rename = "Suggestion")]
    Suggestions(Vec<Suggestion>),
    #[serde(rename = "Session")]
    Sessions(Vec<Session>),
    #[serde(rename = "HistoryEntry")]
    HistoryEntries(Vec<HistoryEntry>),
}

impl SelResult {
    /// Empty result for a target
    pub fn empty(target: EntityType) -> Self {
        match target {
            EntityType::Note => SelResult::Notes(Vec::new()),
            EntityType::Suggestion => SelResult::Suggestions(Vec::new()),
            EntityType::Session => SelResult::Sessions(Vec::new()),
            EntityType::HistoryEntry => SelResult::HistoryEntries(Vec::new()),
        }
    }

    pub fn target(&self) -> EntityType {
        match self {
            SelResult::Notes(_) => EntityType::Note,
            SelResult::Suggestions(_) => EntityType::Suggestion,
            SelResult::Sessions(_) => EntityType::Session,
            SelResult::HistoryEntries(_) => EntityType::HistoryEntry,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SelResult::Notes(v) => v.len(),
            SelResult::Suggestions(v) => v.len(),
            SelResult::Sessions(v) => v.len(),
            SelResult::HistoryEntries(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of the returned entities in result order
    pub fn ids(&self) -> Vec<i64> {
        match self {
            SelResult::Notes(v) => v.iter().map(|e| e.id).collect(),
            SelResult::Suggestions(v) => v.iter().map(|e| e.id).collect(),
            SelResult::Sessions(v) => v.iter().map(|e| e.id).collect(),
            SelResult::HistoryEntries(v) => v.iter().map(|e| e.id).collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
