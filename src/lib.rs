//! sel_engine - typed JSON queries over an EAV flashcard store
//!
//! Pipeline: JSON → [`parser`] → [`ast`] → [`compiler`] → SQL →
//! [`executor`] → typed entities.
//!
//! ```ignore
//! use sel_engine::{ast::Scopes, schema::FieldCatalog, store::SqliteStore, SelEngine};
//!
//! let store = SqliteStore::open_in_memory()?;
//! let engine = SelEngine::new(store, FieldCatalog::uniform(["Front", "Back"]));
//! let notes = engine.execute_json(
//!     r#"{"target":"Note","alias":"n","where":{"contains":[{"field":"Front"},"猫"]}}"#,
//!     &Scopes::new(),
//! )?;
//! ```

pub mod ast;
pub mod cli;
pub mod compiler;
pub mod engine;
pub mod errors;
pub mod executor;
pub mod observability;
pub mod operators;
pub mod parser;
pub mod schema;
pub mod store;

pub use engine::SelEngine;
pub use errors::{EngineResult, SelError, Severity};
