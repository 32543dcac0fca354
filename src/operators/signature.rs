//! Operator signatures, categories and compilation strategies

use serde::Serialize;

use crate::ast::SelType;

/// Grouping used by the operator catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Comparison,
    String,
    Logic,
    Predicate,
    Math,
    Aggregate,
    /// Reference and subquery constructors, not offered as user operators
    Internal,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Comparison => "Comparison",
            Category::String => "String",
            Category::Logic => "Logic",
            Category::Predicate => "Predicate",
            Category::Math => "Math",
            Category::Aggregate => "Aggregate",
            Category::Internal => "Internal",
        }
    }
}

/// Arity and typing of an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub min_args: usize,
    /// None for variadic operators
    pub max_args: Option<usize>,
    /// Declared argument types. The last entry repeats for variadic tails.
    pub arg_types: &'static [SelType],
    pub return_type: SelType,
    /// All arguments must resolve to the same concrete type
    pub uniform: bool,
}

impl Signature {
    /// Declared type of the argument at `index`
    pub fn arg_type_at(&self, index: usize) -> SelType {
        self.arg_types
            .get(index)
            .or_else(|| self.arg_types.last())
            .copied()
            .unwrap_or(SelType::Any)
    }

    /// True when `count` arguments satisfy the arity
    pub fn accepts_arity(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.map_or(true, |max| count <= max)
    }

    /// Human-readable arity, e.g. `2`, `1..3`, `at least 1`
    pub fn describe_arity(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => max.to_string(),
            Some(max) => format!("{}..{}", self.min_args, max),
            None => format!("at least {}", self.min_args),
        }
    }
}

/// How the compiler turns an application of the operator into SQL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Strategy {
    /// Binary comparison with the given SQL operator
    Compare(&'static str),
    /// Variadic AND / OR
    Junction(&'static str),
    Not,
    /// SQL template with `$n` argument markers. A marker may repeat.
    Template(&'static str),
    /// Variadic arithmetic with the given SQL operator
    Arithmetic(&'static str),
    /// Aggregate function, only valid in a subquery result
    Aggregate(&'static str),
    /// `COUNT(*)` or `COUNT(expr)`
    Count,
    Field,
    Prop,
    Ref,
    Query,
    Exists,
}

/// One registry entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperatorDef {
    pub key: &'static str,
    pub display_name: &'static str,
    pub category: Category,
    pub description: &'static str,
    pub signature: Signature,
    #[serde(skip)]
    pub strategy: Strategy,
}

impl OperatorDef {
    /// True for operators offered to query authors
    pub fn is_user_facing(&self) -> bool {
        self.category != Category::Internal
    }
}
