//! Entity schema metadata
//!
//! Describes what a query may reference:
//! - properties: direct columns of the entity table
//! - field contexts: namespaces into the shared `field_value` table
//! - relations between entities
//! - scopes a caller may inject
//!
//! The schema table is static. Field names are not part of it; they live
//! in a [`FieldCatalog`] supplied at compile time.

mod catalog;
mod registry;
mod types;

pub use catalog::FieldCatalog;
pub use registry::all_schemas;
pub use types::{
    EntitySchema, EntityType, FieldContextDef, PropertyDef, PropertyKind, RelationDef, ScopeDef,
    ScopeKind,
};
