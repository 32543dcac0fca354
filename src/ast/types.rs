//! Value types of the query language
//!
//! Four types only:
//! - Any: wildcard used by operator signatures, never a runtime value
//! - Boolean
//! - Number
//! - String

use serde::{Deserialize, Serialize};
use std::fmt;

/// Static type of a node once resolved against the operator registry and schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelType {
    /// Matches every concrete type during signature checking
    Any,
    Boolean,
    Number,
    String,
}

impl SelType {
    /// Returns the type name used in diagnostics and the operator catalogue
    pub fn as_str(&self) -> &'static str {
        match self {
            SelType::Any => "Any",
            SelType::Boolean => "Boolean",
            SelType::Number => "Number",
            SelType::String => "String",
        }
    }

    /// True when a value of type `actual` may fill a slot declared as `self`.
    ///
    /// `Any` on either side matches.
    pub fn accepts(&self, actual: SelType) -> bool {
        matches!(self, SelType::Any) || matches!(actual, SelType::Any) || *self == actual
    }

    /// True for every type except `Any`
    pub fn is_concrete(&self) -> bool {
        !matches!(self, SelType::Any)
    }
}

impl fmt::Display for SelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
