//! Engine facade
//!
//! Runs the whole pipeline: JSON → parser → AST → compiler → SQL →
//! executor → materialized entities. Owns the backend, the field catalogue
//! and the metrics of one engine instance.

use tracing::{debug, info_span, warn};
use uuid::Uuid;

use crate::ast::{Scopes, SelQuery};
use crate::compiler::{CompileExplain, CompiledQuery, SelCompiler};
use crate::errors::{EngineResult, SelError};
use crate::executor::{QueryBackend, SelExecutor, SelResult};
use crate::observability::{Event, MetricsRegistry};
use crate::parser::{parse_query, parse_query_value, ParseResult};
use crate::schema::FieldCatalog;

/// A query engine bound to one backend
pub struct SelEngine<B: QueryBackend> {
    backend: B,
    catalog: FieldCatalog,
    default_limit: Option<u64>,
    metrics: MetricsRegistry,
}

impl<B: QueryBackend> SelEngine<B> {
    pub fn new(backend: B, catalog: FieldCatalog) -> Self {
        Self {
            backend,
            catalog,
            default_limit: None,
            metrics: MetricsRegistry::new(),
        }
    }

    /// Caps top-level queries that carry no limit of their own
    pub fn with_default_limit(mut self, limit: Option<u64>) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    fn compiler(&self) -> SelCompiler<'_> {
        SelCompiler::new(&self.catalog).with_default_limit(self.default_limit)
    }

    /// Parses a query document
    pub fn parse(&self, json: &str) -> EngineResult<SelQuery> {
        debug!(bytes = json.len(), "{}", Event::QueryReceived);
        self.parsed(parse_query(json))
    }

    /// Parses an already decoded query document
    pub fn parse_value(&self, doc: &serde_json::Value) -> EngineResult<SelQuery> {
        debug!("{}", Event::QueryReceived);
        self.parsed(parse_query_value(doc))
    }

    fn parsed(&self, result: ParseResult<SelQuery>) -> EngineResult<SelQuery> {
        match result {
            Ok(query) => {
                self.metrics.increment_queries_parsed();
                debug!(target_entity = %query.target, alias = %query.alias, "{}", Event::QueryParsed);
                Ok(query)
            }
            Err(e) => Err(self.rejected(e.into())),
        }
    }

    /// Compiles a query with the given scopes
    pub fn compile(&self, query: &SelQuery, scopes: &Scopes) -> EngineResult<CompiledQuery> {
        match self.compiler().compile(query, scopes) {
            Ok(compiled) => {
                self.metrics.increment_queries_compiled();
                debug!(
                    sql = %compiled.sql,
                    params = compiled.params.len(),
                    "{}",
                    Event::QueryCompiled
                );
                Ok(compiled)
            }
            Err(e) => Err(self.rejected(e.into())),
        }
    }

    /// Compiles a query and describes the outcome without running it
    pub fn explain(&self, query: &SelQuery, scopes: &Scopes) -> CompileExplain {
        match self.compiler().compile(query, scopes) {
            Ok(compiled) => compiled.explain(),
            Err(e) => CompileExplain::from_error(&e),
        }
    }

    /// Compiles and executes a query
    pub fn execute(&self, query: &SelQuery, scopes: &Scopes) -> EngineResult<SelResult> {
        let query_id = Uuid::new_v4();
        let span = info_span!("sel_query", %query_id, target_entity = %query.target);
        let _guard = span.enter();

        let compiled = self.compile(query, scopes)?;
        self.run(&compiled)
    }

    /// Parses, compiles and executes a query document
    pub fn execute_json(&self, json: &str, scopes: &Scopes) -> EngineResult<SelResult> {
        let query = self.parse(json)?;
        self.execute(&query, scopes)
    }

    /// Executes an already compiled query
    pub fn run(&self, compiled: &CompiledQuery) -> EngineResult<SelResult> {
        let result = SelExecutor::new(&self.backend)
            .with_metrics(&self.metrics)
            .execute(compiled);

        match result {
            Ok(result) => {
                self.metrics.increment_queries_executed();
                debug!(rows = result.len(), "{}", Event::QueryExecuted);
                Ok(result)
            }
            Err(e) => {
                self.metrics.increment_queries_failed();
                warn!(code = e.code().code(), error = %e, "{}", Event::QueryFailed);
                Err(e.into())
            }
        }
    }

    fn rejected(&self, err: SelError) -> SelError {
        self.metrics.increment_queries_rejected();
        debug!(code = err.code(), error = %err, "{}", Event::QueryRejected);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    fn engine() -> SelEngine<SqliteStore> {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .connection()
            .execute_batch(
                "INSERT INTO session (id, deck_id, deck_name, state, created_at, updated_at)
                     VALUES (1, 1, 'Japanese', 'done', 0, 0),
                            (2, 2, 'French', 'failed', 0, 0);",
            )
            .unwrap();
        SelEngine::new(store, FieldCatalog::uniform(["Front", "Back"]))
    }

    #[test]
    fn test_execute_json_counts_stages() {
        let engine = engine();
        let result = engine
            .execute_json(
                r#"{"target":"Session","alias":"s","where":{"==":[{"prop":"state"},"done"]}}"#,
                &Scopes::new(),
            )
            .unwrap();

        assert_eq!(result.ids(), vec![1]);
        let m = engine.metrics().snapshot();
        assert_eq!(m.queries_parsed, 1);
        assert_eq!(m.queries_compiled, 1);
        assert_eq!(m.queries_executed, 1);
        assert_eq!(m.rows_returned, 1);
        assert_eq!(m.queries_rejected, 0);
    }

    #[test]
    fn test_rejections_are_counted() {
        let engine = engine();
        let err = engine
            .execute_json("{not json", &Scopes::new())
            .unwrap_err();
        assert_eq!(err.code(), "SEL_PARSE_INVALID_JSON");

        let err = engine
            .execute_json(
                r#"{"target":"Session","alias":"s","where":{"==":[{"prop":"colour"},"red"]}}"#,
                &Scopes::new(),
            )
            .unwrap_err();
        assert_eq!(err.code(), "SEL_COMPILE_UNKNOWN_PROPERTY");
        assert_eq!(engine.metrics().snapshot().queries_rejected, 2);
    }

    #[test]
    fn test_default_limit_applies() {
        let engine = engine().with_default_limit(Some(1));
        let query = engine
            .parse(r#"{"target":"Session","alias":"s","where":true}"#)
            .unwrap();
        assert_eq!(engine.execute(&query, &Scopes::new()).unwrap().len(), 1);
    }

    #[test]
    fn test_explain_does_not_execute() {
        let engine = engine();
        let query = engine
            .parse(r#"{"target":"Session","alias":"s","where":true}"#)
            .unwrap();
        assert!(engine.explain(&query, &Scopes::new()).accepted);
        assert_eq!(engine.metrics().snapshot().queries_executed, 0);
    }
}
