//! Entity schema definitions
//!
//! Each entity type maps to one storage table, an ordered property list,
//! the field contexts it owns in the shared `field_value` table, its
//! relations to other entities and the scopes a caller may inject.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ast::SelType;

use super::registry;

/// Closed set of queryable entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    Note,
    Suggestion,
    Session,
    HistoryEntry,
}

impl EntityType {
    /// All entity types in declaration order
    pub const ALL: [EntityType; 4] = [
        EntityType::Note,
        EntityType::Suggestion,
        EntityType::Session,
        EntityType::HistoryEntry,
    ];

    /// Name used in query documents
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Note => "Note",
            EntityType::Suggestion => "Suggestion",
            EntityType::Session => "Session",
            EntityType::HistoryEntry => "HistoryEntry",
        }
    }

    /// Parses a target name. Exact match only.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// The schema describing this entity
    pub fn schema(&self) -> &'static EntitySchema {
        registry::schema_for(*self)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Storage representation of a property column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PropertyKind {
    /// INTEGER column
    Integer,
    /// TEXT column
    Text,
    /// INTEGER column holding epoch milliseconds
    Timestamp,
}

impl PropertyKind {
    /// Query-language type of values of this kind
    pub fn sel_type(&self) -> SelType {
        match self {
            PropertyKind::Integer | PropertyKind::Timestamp => SelType::Number,
            PropertyKind::Text => SelType::String,
        }
    }
}

/// A direct column of an entity's row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PropertyDef {
    /// Name used by `prop`, `ref` and `orderBy`
    pub name: &'static str,
    /// Storage column
    pub column: &'static str,
    pub kind: PropertyKind,
    pub label: &'static str,
    pub nullable: bool,
}

impl PropertyDef {
    pub fn sel_type(&self) -> SelType {
        self.kind.sel_type()
    }
}

/// Named namespace into the shared field table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldContextDef {
    /// Name used in `field(name, context)`
    pub key: &'static str,
    /// Value of `field_value.context`
    pub tag: &'static str,
}

/// Foreign-key link from a property to another entity's id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelationDef {
    pub target: EntityType,
    pub property: &'static str,
    pub target_property: &'static str,
}

/// Kind of implicit filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScopeKind {
    /// Deck and its sub-decks (`name` or `name::*`)
    Deck,
    /// Equality on the bound property
    Session,
}

/// Implicit filter a caller may inject into a top-level query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScopeDef {
    pub key: &'static str,
    pub kind: ScopeKind,
    /// Property the scope filters on
    pub property: &'static str,
}

/// Metadata for one entity type
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EntitySchema {
    pub entity: EntityType,
    pub table: &'static str,
    pub properties: &'static [PropertyDef],
    pub field_contexts: &'static [FieldContextDef],
    pub relations: &'static [RelationDef],
    pub scopes: &'static [ScopeDef],
    /// Column of `field_value` owning this entity's field rows
    pub field_fk: Option<&'static str>,
}

impl EntitySchema {
    pub fn property(&self, name: &str) -> Option<&'static PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Position of a property in the select list
    pub fn property_index(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name == name)
    }

    pub fn field_context(&self, key: &str) -> Option<&'static FieldContextDef> {
        self.field_contexts.iter().find(|c| c.key == key)
    }

    pub fn field_context_by_tag(&self, tag: &str) -> Option<&'static FieldContextDef> {
        self.field_contexts.iter().find(|c| c.tag == tag)
    }

    /// Context used by `field(name)` without an explicit context
    pub fn default_field_context(&self) -> Option<&'static FieldContextDef> {
        self.field_contexts.first()
    }

    pub fn scope(&self, key: &str) -> Option<&'static ScopeDef> {
        self.scopes.iter().find(|s| s.key == key)
    }

    /// True when this entity owns rows in the field table
    pub fn has_fields(&self) -> bool {
        self.field_fk.is_some() && !self.field_contexts.is_empty()
    }
}
