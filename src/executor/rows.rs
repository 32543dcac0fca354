//! Row mapping from the top-level select list into entity structs
//!
//! Top-level queries select every property of the target in schema order,
//! so columns are addressed by property name through the schema.

use chrono::{DateTime, TimeZone, Utc};

use crate::schema::{EntitySchema, EntityType};

use super::backend::SqlCursor;
use super::errors::{ExecutorError, ExecutorResult};
use super::result::{FieldMap, HistoryEntry, Note, Session, SessionProgress, Suggestion};

/// Property-name addressed view of one row
pub(crate) struct RowReader<'r> {
    cursor: &'r dyn SqlCursor,
    schema: &'static EntitySchema,
}

impl<'r> RowReader<'r> {
    pub(crate) fn new(cursor: &'r dyn SqlCursor, entity: EntityType) -> Self {
        Self {
            cursor,
            schema: entity.schema(),
        }
    }

    fn index(&self, name: &str) -> ExecutorResult<usize> {
        self.schema.property_index(name).ok_or_else(|| {
            ExecutorError::row_decode(format!(
                "{} has no property '{}'",
                self.schema.entity, name
            ))
        })
    }

    fn missing(&self, name: &str) -> ExecutorError {
        ExecutorError::row_decode(format!(
            "{}.{} is NULL but not nullable",
            self.schema.entity, name
        ))
    }

    pub(crate) fn opt_int(&self, name: &str) -> ExecutorResult<Option<i64>> {
        self.cursor.integer(self.index(name)?)
    }

    pub(crate) fn int(&self, name: &str) -> ExecutorResult<i64> {
        self.opt_int(name)?.ok_or_else(|| self.missing(name))
    }

    pub(crate) fn opt_text(&self, name: &str) -> ExecutorResult<Option<String>> {
        self.cursor.text(self.index(name)?)
    }

    pub(crate) fn text(&self, name: &str) -> ExecutorResult<String> {
        self.opt_text(name)?.ok_or_else(|| self.missing(name))
    }

    pub(crate) fn opt_timestamp(&self, name: &str) -> ExecutorResult<Option<DateTime<Utc>>> {
        self.opt_int(name)?.map(from_millis).transpose()
    }

    pub(crate) fn timestamp(&self, name: &str) -> ExecutorResult<DateTime<Utc>> {
        self.opt_timestamp(name)?.ok_or_else(|| self.missing(name))
    }
}

/// Epoch milliseconds to UTC
pub(crate) fn from_millis(ms: i64) -> ExecutorResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| ExecutorError::row_decode(format!("timestamp {} out of range", ms)))
}

pub(crate) fn map_note(cursor: &dyn SqlCursor) -> ExecutorResult<Note> {
    let row = RowReader::new(cursor, EntityType::Note);
    Ok(Note {
        id: row.int("id")?,
        deck_id: row.int("deckId")?,
        deck_name: row.text("deckName")?,
        model_name: row.text("modelName")?,
        tags: row
            .text("tags")?
            .split_whitespace()
            .map(str::to_string)
            .collect(),
        modified: row.int("mod")?,
        estimated_tokens: row.opt_int("estimatedTokens")?,
        created_at: row.timestamp("createdAt")?,
        updated_at: row.timestamp("updatedAt")?,
        fields: FieldMap::new(),
    })
}

pub(crate) fn map_suggestion(cursor: &dyn SqlCursor) -> ExecutorResult<Suggestion> {
    let row = RowReader::new(cursor, EntityType::Suggestion);
    Ok(Suggestion {
        id: row.int("id")?,
        note_id: row.int("noteId")?,
        session_id: row.int("sessionId")?,
        reasoning: row.text("reasoning")?,
        status: row.text("status")?,
        created_at: row.timestamp("createdAt")?,
        decided_at: row.opt_timestamp("decidedAt")?,
        skipped_at: row.opt_timestamp("skippedAt")?,
        model_name: None,
        fields: FieldMap::new(),
    })
}

pub(crate) fn map_session(cursor: &dyn SqlCursor) -> ExecutorResult<Session> {
    let row = RowReader::new(cursor, EntityType::Session);
    Ok(Session {
        id: row.int("id")?,
        deck_id: row.int("deckId")?,
        deck_name: row.text("deckName")?,
        prompt: row.opt_text("prompt")?,
        state: row.text("state")?,
        state_message: row.opt_text("stateMessage")?,
        exit_code: row.opt_int("exitCode")?,
        progress: SessionProgress {
            processed_cards: row.int("processedCards")?,
            total_cards: row.int("totalCards")?,
            processed_batches: row.int("processedBatches")?,
            total_batches: row.int("totalBatches")?,
            suggestions_count: row.int("suggestionsCount")?,
            input_tokens: row.int("inputTokens")?,
            output_tokens: row.int("outputTokens")?,
            failed_batches: row.int("failedBatches")?,
        },
        created_at: row.timestamp("createdAt")?,
        updated_at: row.timestamp("updatedAt")?,
    })
}

pub(crate) fn map_history_entry(cursor: &dyn SqlCursor) -> ExecutorResult<HistoryEntry> {
    let row = RowReader::new(cursor, EntityType::HistoryEntry);
    Ok(HistoryEntry {
        id: row.int("id")?,
        note_id: row.int("noteId")?,
        suggestion_id: row.opt_int("suggestionId")?,
        session_id: row.opt_int("sessionId")?,
        deck_id: row.int("deckId")?,
        deck_name: row.text("deckName")?,
        action: row.text("action")?,
        reasoning: row.opt_text("reasoning")?,
        timestamp: row.timestamp("timestamp")?,
        model_name: None,
        fields: FieldMap::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ExecutorErrorCode;

    /// Row backed by a fixed vector of optional text cells
    struct FakeRow(Vec<Option<&'static str>>);

    impl SqlCursor for FakeRow {
        fn integer(&self, index: usize) -> ExecutorResult<Option<i64>> {
            match self.0.get(index).copied().flatten() {
                None => Ok(None),
                Some(s) => s
                    .parse()
                    .map(Some)
                    .map_err(|_| ExecutorError::row_decode(s.to_string())),
            }
        }

        fn text(&self, index: usize) -> ExecutorResult<Option<String>> {
            Ok(self.0.get(index).copied().flatten().map(str::to_string))
        }
    }

    #[test]
    fn test_note_row_splits_tags() {
        let row = FakeRow(vec![
            Some("7"),
            Some("1"),
            Some("Japanese::Kanji"),
            Some("Basic"),
            Some(" leech  verb "),
            Some("42"),
            None,
            Some("1700000000000"),
            Some("1700000001000"),
        ]);
        let note = map_note(&row).unwrap();
        assert_eq!(note.id, 7);
        assert_eq!(note.tags, vec!["leech".to_string(), "verb".to_string()]);
        assert_eq!(note.estimated_tokens, None);
        assert_eq!(note.created_at.timestamp_millis(), 1_700_000_000_000);
        assert!(note.fields.is_empty());
    }

    #[test]
    fn test_null_in_required_column_fails() {
        let row = FakeRow(vec![Some("1"), None]);
        let err = map_session(&row).unwrap_err();
        assert_eq!(err.code(), ExecutorErrorCode::RowDecode);
        assert!(err.message().contains("Session.deckId"));
    }

    #[test]
    fn test_session_row_reads_progress() {
        let row = FakeRow(vec![
            Some("2"),
            Some("8"),
            Some("French"),
            None,
            Some("failed"),
            Some("rate limited"),
            Some("1"),
            Some("30"),
            Some("40"),
            Some("3"),
            Some("4"),
            Some("12"),
            Some("9000"),
            Some("2500"),
            Some("1"),
            Some("10"),
            Some("20"),
        ]);
        let session = map_session(&row).unwrap();
        assert_eq!(session.exit_code, Some(1));
        assert_eq!(session.progress.total_cards, 40);
        assert_eq!(session.progress.suggestions_count, 12);
        assert_eq!(session.progress.failed_batches, 1);
        assert_eq!(session.updated_at.timestamp_millis(), 20);
    }

    #[test]
    fn test_nullable_timestamps_stay_none() {
        let row = FakeRow(vec![
            Some("1"),
            Some("2"),
            Some("3"),
            Some("because"),
            Some("pending"),
            Some("0"),
            None,
            Some("5"),
        ]);
        let suggestion = map_suggestion(&row).unwrap();
        assert_eq!(suggestion.decided_at, None);
        assert_eq!(suggestion.skipped_at.map(|t| t.timestamp_millis()), Some(5));
    }
}
