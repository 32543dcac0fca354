//! Operator registry
//!
//! Static table of every operator the query language knows: arity,
//! argument and return types, catalogue metadata and the strategy the
//! compiler uses to emit SQL.

mod registry;
mod signature;

pub use registry::OperatorRegistry;
pub use signature::{Category, OperatorDef, Signature, Strategy};
