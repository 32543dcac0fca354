//! Compiler error types
//!
//! Error codes:
//! - SEL_COMPILE_UNKNOWN_OPERATOR (REJECT)
//! - SEL_COMPILE_ARITY_MISMATCH (REJECT)
//! - SEL_COMPILE_TYPE_MISMATCH (REJECT)
//! - SEL_COMPILE_UNKNOWN_FIELD (REJECT)
//! - SEL_COMPILE_UNRESOLVED_SCOPE (REJECT)
//! - SEL_COMPILE_DUPLICATE_ALIAS (REJECT)
//! - SEL_COMPILE_UNKNOWN_PROPERTY (REJECT)
//! - SEL_COMPILE_UNKNOWN_FIELD_CONTEXT (REJECT)
//! - SEL_COMPILE_UNKNOWN_SCOPE (REJECT)
//! - SEL_COMPILE_INVALID_ALIAS (REJECT)
//! - SEL_COMPILE_INVALID_ARGUMENT (REJECT)
//! - SEL_COMPILE_INVALID_QUERY (REJECT)
//! - SEL_COMPILE_MISPLACED_AGGREGATE (REJECT)

use std::fmt;

use crate::ast::SelType;
use crate::errors::Severity;
use crate::schema::EntityType;

/// Compiler error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorCode {
    /// Operator key not in the registry
    UnknownOperator,
    /// Argument count outside the operator's arity
    ArityMismatch,
    /// Argument type does not match the signature
    TypeMismatch,
    /// Field name not in the catalogue for the context
    UnknownField,
    /// `ref` alias not found on the ancestor chain
    UnresolvedScope,
    /// Alias already used by an enclosing query
    DuplicateAlias,
    /// Property not declared by the entity
    UnknownProperty,
    /// Field context not declared by the entity
    UnknownFieldContext,
    /// Scope key not supported by the target entity
    UnknownScope,
    /// Alias is not a plain identifier
    InvalidAlias,
    /// Argument has the wrong node shape (e.g. a non-literal field name)
    InvalidArgument,
    /// Query structure not valid in its position
    InvalidQuery,
    /// Aggregate outside a subquery result
    MisplacedAggregate,
}

impl CompileErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            CompileErrorCode::UnknownOperator => "SEL_COMPILE_UNKNOWN_OPERATOR",
            CompileErrorCode::ArityMismatch => "SEL_COMPILE_ARITY_MISMATCH",
            CompileErrorCode::TypeMismatch => "SEL_COMPILE_TYPE_MISMATCH",
            CompileErrorCode::UnknownField => "SEL_COMPILE_UNKNOWN_FIELD",
            CompileErrorCode::UnresolvedScope => "SEL_COMPILE_UNRESOLVED_SCOPE",
            CompileErrorCode::DuplicateAlias => "SEL_COMPILE_DUPLICATE_ALIAS",
            CompileErrorCode::UnknownProperty => "SEL_COMPILE_UNKNOWN_PROPERTY",
            CompileErrorCode::UnknownFieldContext => "SEL_COMPILE_UNKNOWN_FIELD_CONTEXT",
            CompileErrorCode::UnknownScope => "SEL_COMPILE_UNKNOWN_SCOPE",
            CompileErrorCode::InvalidAlias => "SEL_COMPILE_INVALID_ALIAS",
            CompileErrorCode::InvalidArgument => "SEL_COMPILE_INVALID_ARGUMENT",
            CompileErrorCode::InvalidQuery => "SEL_COMPILE_INVALID_QUERY",
            CompileErrorCode::MisplacedAggregate => "SEL_COMPILE_MISPLACED_AGGREGATE",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for CompileErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Semantic error in a well-formed AST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    code: CompileErrorCode,
    message: String,
    /// JSON path of the offending node
    path: String,
    /// Operator, field, property or alias the error is about
    subject: Option<String>,
}

impl CompileError {
    fn new(
        code: CompileErrorCode,
        path: &str,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            path: path.into(),
            subject: Some(subject.into()),
        }
    }

    pub fn unknown_operator(path: &str, operator: &str) -> Self {
        Self::new(
            CompileErrorCode::UnknownOperator,
            path,
            operator,
            format!("Unknown operator '{}'", operator),
        )
    }

    pub fn arity_mismatch(path: &str, operator: &str, expected: &str, actual: usize) -> Self {
        Self::new(
            CompileErrorCode::ArityMismatch,
            path,
            operator,
            format!(
                "Operator '{}' expects {} argument(s), got {}",
                operator, expected, actual
            ),
        )
    }

    pub fn type_mismatch(
        path: &str,
        operator: &str,
        index: usize,
        expected: SelType,
        actual: SelType,
    ) -> Self {
        Self::new(
            CompileErrorCode::TypeMismatch,
            path,
            operator,
            format!(
                "Operator '{}' argument {} expects {}, got {}",
                operator, index, expected, actual
            ),
        )
    }

    /// Both operands of a uniform operator resolved to different types
    pub fn operand_mismatch(path: &str, operator: &str, left: SelType, right: SelType) -> Self {
        Self::new(
            CompileErrorCode::TypeMismatch,
            path,
            operator,
            format!(
                "Operator '{}' compares {} with {}; operands must share a type",
                operator, left, right
            ),
        )
    }

    /// A condition position received a non-boolean expression
    pub fn not_a_condition(path: &str, actual: SelType) -> Self {
        Self::new(
            CompileErrorCode::TypeMismatch,
            path,
            "where",
            format!("Condition must be Boolean, got {}", actual),
        )
    }

    pub fn unknown_field(path: &str, name: &str, context: &str) -> Self {
        Self::new(
            CompileErrorCode::UnknownField,
            path,
            name,
            format!("Unknown field '{}' in context '{}'", name, context),
        )
    }

    pub fn unresolved_scope(path: &str, alias: &str) -> Self {
        Self::new(
            CompileErrorCode::UnresolvedScope,
            path,
            alias,
            format!("No enclosing query has alias '{}'", alias),
        )
    }

    pub fn duplicate_alias(path: &str, alias: &str) -> Self {
        Self::new(
            CompileErrorCode::DuplicateAlias,
            path,
            alias,
            format!("Alias '{}' is already used by an enclosing query", alias),
        )
    }

    pub fn unknown_property(path: &str, entity: EntityType, name: &str) -> Self {
        Self::new(
            CompileErrorCode::UnknownProperty,
            path,
            name,
            format!("Unknown property '{}' for {}", name, entity),
        )
    }

    pub fn unknown_field_context(path: &str, entity: EntityType, context: &str) -> Self {
        Self::new(
            CompileErrorCode::UnknownFieldContext,
            path,
            context,
            format!("{} has no field context '{}'", entity, context),
        )
    }

    /// Entity has no field storage at all
    pub fn no_field_storage(path: &str, entity: EntityType) -> Self {
        Self::new(
            CompileErrorCode::UnknownFieldContext,
            path,
            entity.as_str(),
            format!("{} has no fields", entity),
        )
    }

    pub fn unknown_scope(entity: EntityType, key: &str) -> Self {
        Self::new(
            CompileErrorCode::UnknownScope,
            &format!("$scopes.{}", key),
            key,
            format!("{} does not support scope '{}'", entity, key),
        )
    }

    pub fn invalid_alias(path: &str, alias: &str) -> Self {
        Self::new(
            CompileErrorCode::InvalidAlias,
            path,
            alias,
            format!(
                "Alias '{}' must be an identifier and may not start with '__'",
                alias
            ),
        )
    }

    pub fn invalid_argument(path: &str, operator: &str, reason: impl Into<String>) -> Self {
        Self::new(CompileErrorCode::InvalidArgument, path, operator, reason)
    }

    pub fn invalid_query(path: &str, reason: impl Into<String>) -> Self {
        Self {
            code: CompileErrorCode::InvalidQuery,
            message: reason.into(),
            path: path.into(),
            subject: None,
        }
    }

    pub fn misplaced_aggregate(path: &str, operator: &str) -> Self {
        Self::new(
            CompileErrorCode::MisplacedAggregate,
            path,
            operator,
            format!(
                "Aggregate '{}' is only allowed in a subquery result",
                operator
            ),
        )
    }

    pub fn code(&self) -> CompileErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} (at {})",
            self.code.severity(),
            self.code.code(),
            self.message,
            self.path
        )
    }
}

impl std::error::Error for CompileError {}

/// Result type for compilation
pub type CompileResult<T> = Result<T, CompileError>;
