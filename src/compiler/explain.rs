//! Explain output for compiled queries
//!
//! Deterministic, human-readable description of what a query compiles to,
//! or why it was rejected.

use serde::Serialize;
use std::fmt;

use super::compiler::CompiledQuery;
use super::errors::CompileError;

/// Compile-only explain output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileExplain {
    /// Whether compilation succeeded
    pub accepted: bool,
    pub target: Option<String>,
    pub sql: Option<String>,
    /// Parameter values rendered for display
    pub params: Vec<String>,
    pub rejection_code: Option<String>,
    pub rejection_reason: Option<String>,
    pub rejection_path: Option<String>,
}

impl CompileExplain {
    pub fn from_compiled(compiled: &CompiledQuery) -> Self {
        Self {
            accepted: true,
            target: Some(compiled.target.as_str().to_string()),
            sql: Some(compiled.sql.clone()),
            params: compiled.params.iter().map(|p| p.to_string()).collect(),
            rejection_code: None,
            rejection_reason: None,
            rejection_path: None,
        }
    }

    pub fn from_error(err: &CompileError) -> Self {
        Self {
            accepted: false,
            target: None,
            sql: None,
            params: Vec::new(),
            rejection_code: Some(err.code().code().to_string()),
            rejection_reason: Some(err.message().to_string()),
            rejection_path: Some(err.path().to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for CompileExplain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.accepted {
            writeln!(f, "ACCEPTED")?;
            if let Some(ref target) = self.target {
                writeln!(f, "  target: {}", target)?;
            }
            if let Some(ref sql) = self.sql {
                writeln!(f, "  sql: {}", sql)?;
            }
            for (i, param) in self.params.iter().enumerate() {
                writeln!(f, "  ?{}: {}", i + 1, param)?;
            }
        } else {
            writeln!(f, "REJECTED")?;
            if let Some(ref code) = self.rejection_code {
                writeln!(f, "  code: {}", code)?;
            }
            if let Some(ref reason) = self.rejection_reason {
                writeln!(f, "  reason: {}", reason)?;
            }
            if let Some(ref path) = self.rejection_path {
                writeln!(f, "  at: {}", path)?;
            }
        }
        Ok(())
    }
}
