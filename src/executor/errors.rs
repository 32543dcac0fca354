//! Executor error types
//!
//! Error codes:
//! - SEL_EXECUTION_FAILED (ERROR)
//! - SEL_EXECUTION_ROW_DECODE (ERROR)
//!
//! Driver failures are wrapped into a single opaque error carrying the
//! driver's message.

use std::fmt;

use crate::errors::Severity;

/// Executor error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorErrorCode {
    /// The store rejected the statement or the connection failed
    ExecutionFailed,
    /// A row did not match the entity layout
    RowDecode,
}

impl ExecutorErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorErrorCode::ExecutionFailed => "SEL_EXECUTION_FAILED",
            ExecutorErrorCode::RowDecode => "SEL_EXECUTION_ROW_DECODE",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Error
    }
}

impl fmt::Display for ExecutorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failure while running a compiled query or loading its fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorError {
    code: ExecutorErrorCode,
    message: String,
}

impl ExecutorError {
    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self {
            code: ExecutorErrorCode::ExecutionFailed,
            message: message.into(),
        }
    }

    pub fn row_decode(message: impl Into<String>) -> Self {
        Self {
            code: ExecutorErrorCode::RowDecode,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ExecutorErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for ExecutorError {}

impl From<rusqlite::Error> for ExecutorError {
    fn from(e: rusqlite::Error) -> Self {
        Self::execution_failed(e.to_string())
    }
}

/// Result type for execution
pub type ExecutorResult<T> = Result<T, ExecutorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_error_is_wrapped() {
        let err: ExecutorError = rusqlite::Error::InvalidQuery.into();
        assert_eq!(err.code(), ExecutorErrorCode::ExecutionFailed);
        assert!(err.to_string().starts_with("[ERROR] SEL_EXECUTION_FAILED: "));
    }
}
