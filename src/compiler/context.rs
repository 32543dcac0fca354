//! Alias chain of the queries being compiled
//!
//! The chain holds the query currently being compiled plus every
//! enclosing query, outermost first. `ref` resolves nearest first.

use crate::schema::EntitySchema;

/// One query on the chain
#[derive(Debug, Clone, Copy)]
pub struct Frame<'q> {
    pub alias: &'q str,
    pub schema: &'static EntitySchema,
}

impl Frame<'_> {
    /// Qualified, quoted column reference, e.g. `"root".deck_name`
    pub fn column(&self, column: &str) -> String {
        format!("\"{}\".{}", self.alias, column)
    }
}

#[derive(Debug, Default)]
pub struct AliasChain<'q> {
    frames: Vec<Frame<'q>>,
}

impl<'q> AliasChain<'q> {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn push(&mut self, frame: Frame<'q>) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<Frame<'q>> {
        self.frames.pop()
    }

    /// The query currently being compiled
    pub fn current(&self) -> Option<&Frame<'q>> {
        self.frames.last()
    }

    /// Nearest frame with the given alias
    pub fn find(&self, alias: &str) -> Option<&Frame<'q>> {
        self.frames.iter().rev().find(|f| f.alias == alias)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.find(alias).is_some()
    }
}
