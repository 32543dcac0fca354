//! SQLite store adapter
//!
//! Opens the flashcard database, owns the table layout and builds the
//! field catalogue. Query execution goes through the connection, which
//! implements the executor's backend trait.

mod ddl;
mod errors;
mod sqlite;

pub use ddl::STORE_DDL;
pub use errors::{StoreError, StoreResult};
pub use sqlite::SqliteStore;
