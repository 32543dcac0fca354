//! Observable lifecycle events of the query engine
//!
//! Events are explicit and typed. They are emitted as the message of a
//! `tracing` event so log filters can match on a stable name.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration and store
    /// Engine configuration loaded and validated
    ConfigLoaded,
    /// Store connection opened
    StoreOpened,
    /// Field catalogue built from the store
    CatalogLoaded,

    // Query pipeline
    /// Query document received
    QueryReceived,
    /// Query document parsed
    QueryParsed,
    /// Query compiled to SQL
    QueryCompiled,
    /// Query executed and materialized
    QueryExecuted,
    /// Query refused at parse or compile time
    QueryRejected,
    /// Query failed inside the store
    QueryFailed,

    // Materialization
    /// One batch of field values loaded
    FieldsBatchLoaded,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StoreOpened => "STORE_OPENED",
            Event::CatalogLoaded => "CATALOG_LOADED",

            Event::QueryReceived => "QUERY_RECEIVED",
            Event::QueryParsed => "QUERY_PARSED",
            Event::QueryCompiled => "QUERY_COMPILED",
            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::QueryFailed => "QUERY_FAILED",

            Event::FieldsBatchLoaded => "FIELDS_BATCH_LOADED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
