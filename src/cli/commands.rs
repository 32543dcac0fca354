//! CLI command implementations
//!
//! `query` and `compile` read one request from stdin:
//!
//! ```json
//! {"query": {"target": "Note", "alias": "n", "where": true}, "scopes": {"deck": {"value": "Japanese"}}}
//! ```
//!
//! A bare query document is accepted as a request without scopes.
//! Rejected queries are answered with an error envelope; only config,
//! store and I/O failures end the process with a non-zero status.

use std::path::Path;

use serde_json::{json, Value};

use crate::ast::{Scopes, SelQuery};
use crate::engine::SelEngine;
use crate::errors::EngineResult;
use crate::executor::QueryBackend;
use crate::operators::OperatorRegistry;
use crate::parser::ParseError;
use crate::schema::all_schemas;

use super::args::{Cli, Command};
use super::config::EngineConfig;
use super::errors::CliResult;
use super::io::{read_request, write_error, write_response};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Query { config } => query(&config),
        Command::Compile { config } => compile(&config),
        Command::Operators => write_response(operator_catalogue()),
        Command::Schema => write_response(schema_catalogue()),
    }
}

/// Executes one query against the configured database
pub fn query(config_path: &Path) -> CliResult<()> {
    let engine = EngineConfig::load(config_path)?.open_engine()?;
    let request = read_request()?;
    respond(handle_query(&engine, &request))
}

/// Compiles one query and prints the SQL without running it
pub fn compile(config_path: &Path) -> CliResult<()> {
    let engine = EngineConfig::load(config_path)?.open_engine()?;
    let request = read_request()?;
    respond(handle_compile(&engine, &request))
}

fn respond(result: EngineResult<Value>) -> CliResult<()> {
    match result {
        Ok(data) => write_response(data),
        Err(e) => write_error(e.code(), &e.to_string()),
    }
}

/// Runs a request and returns the serialized entities
pub fn handle_query<B: QueryBackend>(engine: &SelEngine<B>, request: &Value) -> EngineResult<Value> {
    let (query, scopes) = split_request(engine, request)?;
    Ok(engine.execute(&query, &scopes)?.to_json())
}

/// Compiles a request and returns its explain output.
///
/// Compile rejections are part of the explain output, not errors.
pub fn handle_compile<B: QueryBackend>(
    engine: &SelEngine<B>,
    request: &Value,
) -> EngineResult<Value> {
    let (query, scopes) = split_request(engine, request)?;
    Ok(engine.explain(&query, &scopes).to_json())
}

fn split_request<B: QueryBackend>(
    engine: &SelEngine<B>,
    request: &Value,
) -> EngineResult<(SelQuery, Scopes)> {
    let obj = request
        .as_object()
        .ok_or_else(|| ParseError::invalid_query("$", "request must be a JSON object"))?;

    let Some(doc) = obj.get("query") else {
        return Ok((engine.parse_value(request)?, Scopes::new()));
    };

    let query = engine.parse_value(doc)?;
    let scopes = match obj.get("scopes") {
        None | Some(Value::Null) => Scopes::new(),
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| ParseError::invalid_query("$.scopes", e.to_string()))?,
    };
    Ok((query, scopes))
}

/// User-facing operators with their signatures
pub fn operator_catalogue() -> Value {
    let ops: Vec<_> = OperatorRegistry::global().user_operators().collect();
    json!({ "operators": ops })
}

/// Entity schemas: properties, field contexts, relations and scopes
pub fn schema_catalogue() -> Value {
    let entities: Vec<_> = all_schemas().collect();
    json!({ "entities": entities })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldCatalog;
    use crate::store::SqliteStore;

    fn engine() -> SelEngine<SqliteStore> {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .connection()
            .execute_batch(
                "INSERT INTO cached_note (id, deck_id, deck_name, model_name, tags, mod, created_at, updated_at)
                     VALUES (1, 1, 'Japanese', 'Basic', 'verb', 0, 0, 0),
                            (2, 2, 'French', 'Basic', '', 0, 0, 0);",
            )
            .unwrap();
        SelEngine::new(store, FieldCatalog::uniform(["Front"]))
    }

    #[test]
    fn test_request_with_scopes() {
        let request = json!({
            "query": {"target": "Note", "alias": "n", "where": true},
            "scopes": {"deck": {"value": "Japanese", "displayLabel": "Japanese"}}
        });
        let data = handle_query(&engine(), &request).unwrap();
        assert_eq!(data["target"], "Note");
        assert_eq!(data["entities"].as_array().unwrap().len(), 1);
        assert_eq!(data["entities"][0]["tags"], json!(["verb"]));
    }

    #[test]
    fn test_bare_query_document() {
        let request = json!({"target": "Note", "alias": "n", "where": true});
        let data = handle_query(&engine(), &request).unwrap();
        assert_eq!(data["entities"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_scopes_rejected() {
        let request = json!({
            "query": {"target": "Note", "alias": "n", "where": true},
            "scopes": {"deck": "Japanese"}
        });
        let err = handle_query(&engine(), &request).unwrap_err();
        assert_eq!(err.code(), "SEL_PARSE_INVALID_QUERY");
    }

    #[test]
    fn test_compile_reports_rejection_in_output() {
        let request = json!({"target": "Note", "alias": "n", "where": {"field": "Back"}});
        let data = handle_compile(&engine(), &request).unwrap();
        assert_eq!(data["accepted"], false);
        assert_eq!(data["rejection_code"], "SEL_COMPILE_UNKNOWN_FIELD");
    }

    #[test]
    fn test_catalogues() {
        let ops = operator_catalogue();
        let keys: Vec<&str> = ops["operators"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|o| o["key"].as_str())
            .collect();
        assert!(keys.contains(&"startsWith"));
        assert!(!keys.contains(&"ref"));

        let schema = schema_catalogue();
        assert_eq!(schema["entities"].as_array().unwrap().len(), 4);
        assert_eq!(schema["entities"][0]["table"], "cached_note");
    }
}
