//! Query document parser
//!
//! Decodes the JSON grammar into the AST:
//! - `{"op": [a, b]}` or `{"op": a}` is an operation
//! - `{"query": {...}}` wraps a nested query
//! - JSON primitives are literals
//!
//! Round trip: `parse_query_value(&q.to_json()) == Ok(q)`.

mod errors;
mod parser;

pub use errors::{ParseError, ParseErrorCode, ParseResult};
pub use parser::{parse_node, parse_node_value, parse_query, parse_query_value};
