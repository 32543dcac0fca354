//! Parser error types
//!
//! Error codes:
//! - SEL_PARSE_INVALID_JSON (REJECT)
//! - SEL_PARSE_INVALID_QUERY (REJECT)
//! - SEL_PARSE_INVALID_NODE (REJECT)
//! - SEL_PARSE_UNKNOWN_OPERATOR (REJECT)

use std::fmt;

use crate::errors::Severity;

/// Parser error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorCode {
    /// Input is not valid JSON
    InvalidJson,
    /// Query object is malformed
    InvalidQuery,
    /// Node has an unrecognized shape
    InvalidNode,
    /// Single-key object whose key is not an operator
    UnknownOperator,
}

impl ParseErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ParseErrorCode::InvalidJson => "SEL_PARSE_INVALID_JSON",
            ParseErrorCode::InvalidQuery => "SEL_PARSE_INVALID_QUERY",
            ParseErrorCode::InvalidNode => "SEL_PARSE_INVALID_NODE",
            ParseErrorCode::UnknownOperator => "SEL_PARSE_UNKNOWN_OPERATOR",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for ParseErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Structural error in a query document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    code: ParseErrorCode,
    message: String,
    /// JSON path of the offending value, e.g. `$.where.and[1]`
    path: String,
}

impl ParseError {
    pub fn invalid_json(reason: impl fmt::Display) -> Self {
        Self {
            code: ParseErrorCode::InvalidJson,
            message: format!("Invalid JSON: {}", reason),
            path: "$".into(),
        }
    }

    pub fn invalid_query(path: &str, reason: impl Into<String>) -> Self {
        Self {
            code: ParseErrorCode::InvalidQuery,
            message: reason.into(),
            path: path.into(),
        }
    }

    pub fn invalid_node(path: &str, reason: impl Into<String>) -> Self {
        Self {
            code: ParseErrorCode::InvalidNode,
            message: reason.into(),
            path: path.into(),
        }
    }

    pub fn unknown_operator(path: &str, operator: &str) -> Self {
        Self {
            code: ParseErrorCode::UnknownOperator,
            message: format!("Unknown operator '{}'", operator),
            path: path.into(),
        }
    }

    pub fn code(&self) -> ParseErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for ParseError {
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

impl std::error::Error for ParseError {}

/// Result type for parsing
pub type ParseResult<T> = Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let err = ParseError::unknown_operator("$.where", "like");
        assert_eq!(
            err.to_string(),
            "[REJECT] SEL_PARSE_UNKNOWN_OPERATOR: Unknown operator 'like' (at $.where)"
        );
    }
}
