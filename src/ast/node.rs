//! AST node variants
//!
//! The node set is closed. Every consumer matches exhaustively so a new
//! variant cannot be silently ignored.

use serde_json::{json, Map, Number, Value};

use super::query::SelQuery;
use super::types::SelType;

/// A node of the query AST
#[derive(Debug, Clone, PartialEq)]
pub enum SelNode {
    /// Operator application, e.g. `{"==": [a, b]}`
    Operation {
        /// Registered operator key
        operator: String,
        /// Arguments in source order
        args: Vec<SelNode>,
    },
    /// String literal
    String(String),
    /// Number literal, integral or fractional
    Number(Number),
    /// Boolean literal
    Boolean(bool),
    /// Null literal
    Null,
    /// Nested query used as an operand
    Query(Box<SelQuery>),
}

impl SelNode {
    /// Builds an operation node
    pub fn op(operator: impl Into<String>, args: Vec<SelNode>) -> Self {
        SelNode::Operation {
            operator: operator.into(),
            args,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        SelNode::String(value.into())
    }

    pub fn int(value: i64) -> Self {
        SelNode::Number(Number::from(value))
    }

    /// Builds a fractional number literal. Returns None for NaN and infinities.
    pub fn float(value: f64) -> Option<Self> {
        Number::from_f64(value).map(SelNode::Number)
    }

    /// `{"prop": name}`
    pub fn prop(name: impl Into<String>) -> Self {
        Self::op("prop", vec![Self::string(name)])
    }

    /// `{"field": name}` in the entity's default context
    pub fn field(name: impl Into<String>) -> Self {
        Self::op("field", vec![Self::string(name)])
    }

    /// `{"ref": [alias, name]}`
    pub fn reference(alias: impl Into<String>, name: impl Into<String>) -> Self {
        Self::op("ref", vec![Self::string(alias), Self::string(name)])
    }

    /// `{"query": {...}}`
    pub fn subquery(query: SelQuery) -> Self {
        Self::op("query", vec![SelNode::Query(Box::new(query))])
    }

    /// Type carried by a literal node. Operations and queries have no
    /// static type before compilation.
    pub fn literal_type(&self) -> Option<SelType> {
        match self {
            SelNode::String(_) => Some(SelType::String),
            SelNode::Number(_) => Some(SelType::Number),
            SelNode::Boolean(_) => Some(SelType::Boolean),
            SelNode::Null => Some(SelType::Any),
            SelNode::Operation { .. } | SelNode::Query(_) => None,
        }
    }

    /// True for the literal `true`
    pub fn is_trivially_true(&self) -> bool {
        matches!(self, SelNode::Boolean(true))
    }

    /// Operator key when this node is an operation
    pub fn operator(&self) -> Option<&str> {
        match self {
            SelNode::Operation { operator, .. } => Some(operator),
            _ => None,
        }
    }

    /// Serializes the node back into the JSON grammar accepted by the parser.
    ///
    /// Operations always use the array argument form. A `query` operation
    /// wrapping a single query serializes to `{"query": {...}}`, and so does
    /// a bare query node.
    pub fn to_json(&self) -> Value {
        match self {
            SelNode::Operation { operator, args } => {
                let value = match args.as_slice() {
                    [SelNode::Query(q)] if operator == "query" => q.to_json(),
                    _ => Value::Array(args.iter().map(SelNode::to_json).collect()),
                };
                let mut obj = Map::new();
                obj.insert(operator.clone(), value);
                Value::Object(obj)
            }
            SelNode::String(s) => Value::String(s.clone()),
            SelNode::Number(n) => Value::Number(n.clone()),
            SelNode::Boolean(b) => Value::Bool(*b),
            SelNode::Null => Value::Null,
            SelNode::Query(q) => json!({ "query": q.to_json() }),
        }
    }
}

impl From<&str> for SelNode {
    fn from(value: &str) -> Self {
        SelNode::string(value)
    }
}

impl From<i64> for SelNode {
    fn from(value: i64) -> Self {
        SelNode::int(value)
    }
}

impl From<bool> for SelNode {
    fn from(value: bool) -> Self {
        SelNode::Boolean(value)
    }
}
