//! Crate-level error aggregation
//!
//! Each stage reports its own error type with a stable string code.
//! [`SelError`] wraps them for callers that run the whole pipeline.

use std::fmt;
use thiserror::Error;

use crate::compiler::CompileError;
use crate::executor::ExecutorError;
use crate::parser::ParseError;
use crate::store::StoreError;

/// Severity levels shared by every error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected; fixing the input is the only recovery
    Reject,
    /// Operation failed but the engine is healthy
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Any failure of the parse, compile, execute pipeline
#[derive(Debug, Error)]
pub enum SelError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Execution(#[from] ExecutorError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SelError {
    /// Stable string code of the underlying error
    pub fn code(&self) -> &'static str {
        match self {
            SelError::Parse(e) => e.code().code(),
            SelError::Compile(e) => e.code().code(),
            SelError::Execution(e) => e.code().code(),
            SelError::Store(e) => e.code(),
        }
    }

    /// True when the request itself was at fault
    pub fn is_rejection(&self) -> bool {
        matches!(self, SelError::Parse(_) | SelError::Compile(_))
    }
}

/// Result type for the full pipeline
pub type EngineResult<T> = Result<T, SelError>;
