//! Field name catalogue
//!
//! Field names are data: they come from the note types of the user's
//! collection. The compiler checks `field(...)` references against a
//! catalogue keyed by storage context tag.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::registry::all_schemas;

/// Known field names per context tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldCatalog {
    by_context: BTreeMap<String, BTreeSet<String>>,
}

impl FieldCatalog {
    /// Creates an empty catalogue. Every `field` reference fails against it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the same names under every context tag of every entity.
    ///
    /// Snapshots of a note (original, changes, applied...) share the note
    /// type's field names, so this is the usual shape.
    pub fn uniform<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        let mut catalog = Self::new();
        for schema in all_schemas() {
            for context in schema.field_contexts {
                catalog
                    .by_context
                    .entry(context.tag.to_string())
                    .or_default()
                    .extend(names.iter().cloned());
            }
        }
        catalog
    }

    /// Adds names under one context tag
    pub fn with_context<I, S>(mut self, tag: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.by_context
            .entry(tag.to_string())
            .or_default()
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn insert(&mut self, tag: &str, name: impl Into<String>) {
        self.by_context
            .entry(tag.to_string())
            .or_default()
            .insert(name.into());
    }

    pub fn contains(&self, tag: &str, name: &str) -> bool {
        self.by_context
            .get(tag)
            .map(|names| names.contains(name))
            .unwrap_or(false)
    }

    /// Names registered under a context tag, sorted
    pub fn names(&self, tag: &str) -> impl Iterator<Item = &str> {
        self.by_context
            .get(tag)
            .into_iter()
            .flat_map(|names| names.iter().map(String::as_str))
    }

    /// Total number of (context, name) entries
    pub fn len(&self) -> usize {
        self.by_context.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
