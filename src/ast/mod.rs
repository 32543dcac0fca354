//! Query AST and value type model
//!
//! Pure data: node variants, query documents, scope values and the four
//! value types. Nothing here touches the store.

mod node;
mod query;
mod types;

pub use node::SelNode;
pub use query::{OrderClause, ScopeValue, Scopes, SelQuery, SortDirection};
pub use types::SelType;
