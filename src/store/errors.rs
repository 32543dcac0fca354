//! Store adapter errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("[ERROR] SEL_STORE_OPEN_FAILED: cannot open {path}: {message}")]
    Open { path: String, message: String },

    #[error("[ERROR] SEL_STORE_SCHEMA_FAILED: {0}")]
    Schema(String),

    #[error("[ERROR] SEL_STORE_CATALOG_FAILED: {0}")]
    Catalog(String),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Open { .. } => "SEL_STORE_OPEN_FAILED",
            StoreError::Schema(_) => "SEL_STORE_SCHEMA_FAILED",
            StoreError::Catalog(_) => "SEL_STORE_CATALOG_FAILED",
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
