//! SQLite connection handling

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use tracing::info;

use crate::compiler::SqlParam;
use crate::executor::{ExecutorResult, QueryBackend, SqlCursor};
use crate::observability::{Event, ObservationScope};
use crate::schema::FieldCatalog;

use super::ddl::STORE_DDL;
use super::errors::{StoreError, StoreResult};

/// A connection to a flashcard store
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens an existing database read-only.
    ///
    /// `busy_timeout` bounds how long a read waits on a writer's lock.
    pub fn open(path: &Path, busy_timeout: Duration) -> StoreResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| open_error(path, e))?;
        conn.busy_timeout(busy_timeout)
            .map_err(|e| open_error(path, e))?;

        info!(path = %path.display(), read_only = true, "{}", Event::StoreOpened);
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Opens or creates a database read-write and applies the layout
    pub fn create(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(|e| open_error(path, e))?;
        let store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.initialize()?;

        info!(path = %path.display(), read_only = false, "{}", Event::StoreOpened);
        Ok(store)
    }

    /// Creates an in-memory database with the layout applied
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Open {
            path: ":memory:".to_string(),
            message: e.to_string(),
        })?;
        let store = Self { conn, path: None };
        store.initialize()?;
        Ok(store)
    }

    /// Applies the table layout. Idempotent.
    pub fn initialize(&self) -> StoreResult<()> {
        self.conn
            .execute_batch(STORE_DDL)
            .map_err(|e| StoreError::Schema(e.to_string()))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Path of the database file, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Builds the field catalogue from the names present in the field table.
    ///
    /// Every name is registered under every context tag.
    pub fn load_field_catalog(&self) -> StoreResult<FieldCatalog> {
        let scope = ObservationScope::new("CATALOG_LOAD");

        let names = match self.distinct_field_names() {
            Ok(names) => names,
            Err(e) => {
                scope.fail(&e.to_string());
                return Err(StoreError::Catalog(e.to_string()));
            }
        };

        let count = names.len().to_string();
        scope.complete_with(&[("names", count.as_str())]);
        info!(names = names.len(), "{}", Event::CatalogLoaded);
        Ok(FieldCatalog::uniform(names))
    }

    fn distinct_field_names(&self) -> rusqlite::Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT field_name FROM field_value ORDER BY field_name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }
}

impl QueryBackend for SqliteStore {
    fn for_each_row(
        &self,
        sql: &str,
        params: &[SqlParam],
        visit: &mut dyn FnMut(&dyn SqlCursor) -> ExecutorResult<()>,
    ) -> ExecutorResult<()> {
        self.conn.for_each_row(sql, params, visit)
    }
}

fn open_error(path: &Path, e: rusqlite::Error) -> StoreError {
    StoreError::Open {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}
