//! Query compiler
//!
//! Turns a parsed query into parameterized SQL over the entity tables and
//! the shared `field_value` table.
//!
//! # Guarantees
//!
//! - No literal value is ever written into the SQL text
//! - Parameters are ordered as their markers appear in the text
//! - Aliases are checked, never generated
//! - Arity and types are enforced without implicit coercion

mod compiler;
mod context;
mod errors;
mod explain;
mod scope;
mod sql;

pub use compiler::{CompiledQuery, SelCompiler};
pub use errors::{CompileError, CompileErrorCode, CompileResult};
pub use explain::CompileExplain;
pub use sql::{SqlFragment, SqlParam};
