//! Query executor and result materializer
//!
//! Consumes compiled queries and produces typed entities.
//!
//! # Invariants
//!
//! - Parameters are bound positionally, never spliced into SQL
//! - Field values are loaded with at most one query per entity type
//! - Empty results are not errors
//! - Driver failures surface as a single opaque execution error

mod backend;
mod errors;
mod executor;
mod materializer;
mod result;
mod rows;

pub use backend::{QueryBackend, SqlCursor};
pub use errors::{ExecutorError, ExecutorErrorCode, ExecutorResult};
pub use executor::SelExecutor;
pub use materializer::Materializer;
pub use result::{
    FieldMap, FieldValue, HistoryEntry, Note, SelResult, Session, SessionProgress, Suggestion,
};
