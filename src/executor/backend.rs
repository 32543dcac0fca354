//! Narrow storage seam used by the executor and the materializer
//!
//! The engine only needs to run a parameterized statement and read typed
//! columns from each row. SQLite connections implement both traits.

use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection, Row};

use crate::compiler::SqlParam;

use super::errors::{ExecutorError, ExecutorResult};

/// Typed column access on the current row
pub trait SqlCursor {
    /// Integer column. Fails on text or blob values.
    fn integer(&self, index: usize) -> ExecutorResult<Option<i64>>;

    /// Text column. Numbers are rendered as text.
    fn text(&self, index: usize) -> ExecutorResult<Option<String>>;
}

/// Something that can run a statement and stream its rows
pub trait QueryBackend {
    /// Runs `sql` with positional `params` and calls `visit` once per row.
    /// Stops at the first error returned by `visit`.
    fn for_each_row(
        &self,
        sql: &str,
        params: &[SqlParam],
        visit: &mut dyn FnMut(&dyn SqlCursor) -> ExecutorResult<()>,
    ) -> ExecutorResult<()>;
}

impl<T: QueryBackend + ?Sized> QueryBackend for &T {
    fn for_each_row(
        &self,
        sql: &str,
        params: &[SqlParam],
        visit: &mut dyn FnMut(&dyn SqlCursor) -> ExecutorResult<()>,
    ) -> ExecutorResult<()> {
        (**self).for_each_row(sql, params, visit)
    }
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlParam::Null => ToSqlOutput::Owned(Value::Null),
            SqlParam::Boolean(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
            SqlParam::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            SqlParam::Real(r) => ToSqlOutput::Owned(Value::Real(*r)),
            SqlParam::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

impl SqlCursor for Row<'_> {
    fn integer(&self, index: usize) -> ExecutorResult<Option<i64>> {
        match self.get_ref(index)? {
            ValueRef::Null => Ok(None),
            ValueRef::Integer(i) => Ok(Some(i)),
            ValueRef::Real(r) if r.fract() == 0.0 => Ok(Some(r as i64)),
            other => Err(ExecutorError::row_decode(format!(
                "column {} holds {}, expected an integer",
                index,
                other.data_type()
            ))),
        }
    }

    fn text(&self, index: usize) -> ExecutorResult<Option<String>> {
        match self.get_ref(index)? {
            ValueRef::Null => Ok(None),
            ValueRef::Text(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|e| ExecutorError::row_decode(format!("column {}: {}", index, e))),
            ValueRef::Integer(i) => Ok(Some(i.to_string())),
            ValueRef::Real(r) => Ok(Some(r.to_string())),
            ValueRef::Blob(_) => Err(ExecutorError::row_decode(format!(
                "column {} holds a blob, expected text",
                index
            ))),
        }
    }
}

impl QueryBackend for Connection {
    fn for_each_row(
        &self,
        sql: &str,
        params: &[SqlParam],
        visit: &mut dyn FnMut(&dyn SqlCursor) -> ExecutorResult<()>,
    ) -> ExecutorResult<()> {
        let mut stmt = self.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        while let Some(row) = rows.next()? {
            visit(row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(conn: &Connection, sql: &str, params: &[SqlParam]) -> Vec<(Option<i64>, Option<String>)> {
        let mut out = Vec::new();
        conn.for_each_row(sql, params, &mut |row| {
            out.push((row.integer(0)?, row.text(1)?));
            Ok(())
        })
        .unwrap();
        out
    }

    #[test]
    fn test_binds_every_param_kind() {
        let conn = Connection::open_in_memory().unwrap();
        let rows = collect(
            &conn,
            "SELECT ? + ?, ? || ':' || COALESCE(?, 'none')",
            &[
                SqlParam::Integer(40),
                SqlParam::Boolean(true),
                SqlParam::Real(1.5),
                SqlParam::Null,
            ],
        );
        assert_eq!(rows, vec![(Some(41), Some("1.5:none".to_string()))]);
    }

    #[test]
    fn test_text_param_is_never_interpreted() {
        let conn = Connection::open_in_memory().unwrap();
        let payload = "'; DROP TABLE x; --";
        let rows = collect(
            &conn,
            "SELECT length(?), ?",
            &[SqlParam::from(payload), SqlParam::from(payload)],
        );
        assert_eq!(rows, vec![(Some(payload.len() as i64), Some(payload.to_string()))]);
    }

    #[test]
    fn test_integer_read_rejects_text() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn
            .for_each_row("SELECT 'abc'", &[], &mut |row| row.integer(0).map(|_| ()))
            .unwrap_err();
        assert_eq!(err.code(), super::super::ExecutorErrorCode::RowDecode);
    }

    #[test]
    fn test_invalid_sql_is_execution_failure() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn
            .for_each_row("SELEKT 1", &[], &mut |_| Ok(()))
            .unwrap_err();
        assert_eq!(err.code(), super::super::ExecutorErrorCode::ExecutionFailed);
    }
}
