//! Query documents, ordering clauses and caller-injected scope values

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::node::SelNode;
use crate::schema::EntityType;

/// Sort direction of an ORDER BY clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Returns the JSON spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "Asc",
            SortDirection::Desc => "Desc",
        }
    }

    /// Returns the SQL keyword
    pub fn sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// One ORDER BY clause over a direct property of the query target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClause {
    /// Property name as exposed to queries (e.g. `createdAt`)
    pub property: String,
    pub direction: SortDirection,
}

impl OrderClause {
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Desc,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("prop".into(), Value::String(self.property.clone()));
        obj.insert(
            "direction".into(),
            Value::String(self.direction.as_str().into()),
        );
        Value::Object(obj)
    }
}

/// A query over one entity type.
///
/// Built once by its producer and never mutated afterwards. The alias is
/// chosen by the producer; the compiler only checks it.
#[derive(Debug, Clone, PartialEq)]
pub struct SelQuery {
    pub target: EntityType,
    pub alias: String,
    pub where_clause: SelNode,
    pub order_by: Vec<OrderClause>,
    pub limit: Option<u64>,
    /// Projected value. Only meaningful for subqueries.
    pub result: Option<SelNode>,
}

impl SelQuery {
    /// Creates a query with no ordering, limit or result
    pub fn new(target: EntityType, alias: impl Into<String>, where_clause: SelNode) -> Self {
        Self {
            target,
            alias: alias.into(),
            where_clause,
            order_by: Vec::new(),
            limit: None,
            result: None,
        }
    }

    pub fn order_by(mut self, clause: OrderClause) -> Self {
        self.order_by.push(clause);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn result(mut self, result: SelNode) -> Self {
        self.result = Some(result);
        self
    }

    /// Serializes the query into the JSON grammar accepted by the parser.
    /// Empty `orderBy` and absent optional keys are omitted.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("target".into(), Value::String(self.target.as_str().into()));
        obj.insert("alias".into(), Value::String(self.alias.clone()));
        obj.insert("where".into(), self.where_clause.to_json());
        if !self.order_by.is_empty() {
            obj.insert(
                "orderBy".into(),
                Value::Array(self.order_by.iter().map(OrderClause::to_json).collect()),
            );
        }
        if let Some(limit) = self.limit {
            obj.insert("limit".into(), Value::from(limit));
        }
        if let Some(ref result) = self.result {
            obj.insert("result".into(), result.to_json());
        }
        Value::Object(obj)
    }
}

/// Value of an implicit filter injected by the caller (e.g. the current deck)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeValue {
    /// Bound value: a deck name or id, a session id
    pub value: Value,
    /// Label shown to the user; deck scopes fall back to it when `value` is not a name
    #[serde(default)]
    pub display_label: String,
    /// Whether the user may clear this scope in the builder
    #[serde(default)]
    pub locked: bool,
}

impl ScopeValue {
    pub fn new(value: impl Into<Value>, display_label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            display_label: display_label.into(),
            locked: false,
        }
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    /// Deck scope by name
    pub fn deck(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(Value::String(name.clone()), name)
    }
}

/// Active scopes keyed by scope name (`deck`, `session`)
pub type Scopes = BTreeMap<String, ScopeValue>;
