//! Parser and compiler guarantees checked from outside the crate
//!
//! - Documents survive a parse → serialize → parse round trip
//! - User-supplied strings never reach the SQL text
//! - Malformed queries are rejected with stable codes and paths

mod common;

use common::{catalog, deck_scope, seeded_engine};
use sel_engine::ast::{ScopeValue, Scopes, SelQuery};
use sel_engine::compiler::{CompileErrorCode, SelCompiler, SqlParam};
use sel_engine::executor::SelResult;
use sel_engine::parser::{parse_query_value, ParseErrorCode};
use sel_engine::schema::FieldCatalog;
use serde_json::{json, Value};

fn parse(doc: &Value) -> SelQuery {
    parse_query_value(doc).unwrap()
}

fn compile_err(doc: Value) -> sel_engine::compiler::CompileError {
    SelCompiler::new(&catalog())
        .compile(&parse(&doc), &Scopes::new())
        .unwrap_err()
}

fn note_where(condition: Value) -> Value {
    json!({"target": "Note", "alias": "n", "where": condition})
}

// =============================================================================
// Round trip
// =============================================================================

#[test]
fn test_round_trip_preserves_queries() {
    let docs = [
        note_where(json!(true)),
        json!({
            "target": "Suggestion", "alias": "root",
            "where": {"and": [
                {"==": [{"prop": "status"}, "pending"]},
                {"or": [
                    {"contains": [{"field": ["Back", "changes", "original"]}, "猫"]},
                    {"isNull": {"prop": "decidedAt"}}
                ]},
                {"exists": {"query": {
                    "target": "HistoryEntry", "alias": "h",
                    "where": {"==": [{"prop": "suggestionId"}, {"ref": ["root", "id"]}]},
                    "limit": 1
                }}}
            ]},
            "orderBy": [{"prop": "createdAt", "direction": "Desc"}, {"prop": "id", "direction": "Asc"}],
            "limit": 50
        }),
        note_where(json!({">=": [
            {"query": {
                "target": "Suggestion", "alias": "s",
                "where": {"==": [{"prop": "noteId"}, {"ref": ["n", "id"]}]},
                "result": {"count": []}
            }},
            {"*": [2, 1.5, -3]}
        ]})),
        note_where(json!({"!=": [{"prop": "estimatedTokens"}, null]})),
    ];

    for doc in docs {
        let query = parse(&doc);
        let reparsed = parse(&query.to_json());
        assert_eq!(reparsed, query, "{}", doc);
    }
}

#[test]
fn test_round_trip_compiles_identically() {
    let doc = note_where(json!({"and": [
        {"startsWith": [{"prop": "deckName"}, "Japanese"]},
        {"==": [{"len": {"field": "Front"}}, 1]}
    ]}));
    let query = parse(&doc);
    let cat = catalog();
    let compiler = SelCompiler::new(&cat);
    let a = compiler.compile(&query, &Scopes::new()).unwrap();
    let b = compiler.compile(&parse(&query.to_json()), &Scopes::new()).unwrap();
    assert_eq!(a.sql, b.sql);
    assert_eq!(a.params, b.params);
}

// =============================================================================
// Injection safety
// =============================================================================

const PAYLOAD: &str = "x'); DROP TABLE cached_note; --";

#[test]
fn test_literals_are_bound_not_spliced() {
    let cat = catalog();
    let query = parse(&note_where(json!({"or": [
        {"contains": [{"field": "Front"}, PAYLOAD]},
        {"==": [{"prop": "tags"}, PAYLOAD]}
    ]})));
    let compiled = SelCompiler::new(&cat).compile(&query, &Scopes::new()).unwrap();

    assert!(!compiled.sql.contains("DROP"));
    assert!(!compiled.sql.contains('\''));
    assert_eq!(
        compiled.params.iter().filter(|p| **p == SqlParam::from(PAYLOAD)).count(),
        2
    );
}

#[test]
fn test_field_names_and_scopes_are_bound() {
    let hostile_field = "Front' OR 1=1 --";
    let cat = FieldCatalog::uniform([hostile_field]);
    let mut scopes = Scopes::new();
    scopes.insert("deck".into(), ScopeValue::deck(PAYLOAD));
    let query = parse(&note_where(json!({"isNotEmpty": {"field": hostile_field}})));
    let compiled = SelCompiler::new(&cat).compile(&query, &scopes).unwrap();

    assert!(!compiled.sql.contains("OR 1=1"));
    assert!(!compiled.sql.contains("DROP"));
    assert!(compiled.params.contains(&SqlParam::from(hostile_field)));
    assert!(compiled.params.contains(&SqlParam::from(format!("{}::", PAYLOAD))));
}

#[test]
fn test_hostile_values_execute_harmlessly() {
    let engine = seeded_engine();
    let doc = note_where(json!({"==": [{"field": "Front"}, PAYLOAD]}));
    assert!(engine
        .execute_json(&doc.to_string(), &deck_scope(PAYLOAD))
        .unwrap()
        .is_empty());

    let all = engine
        .execute_json(&note_where(json!(true)).to_string(), &Scopes::new())
        .unwrap();
    assert!(matches!(all, SelResult::Notes(ref notes) if notes.len() == 4));
}

#[test]
fn test_hostile_alias_is_rejected() {
    let err = compile_err(json!({"target": "Note", "alias": "n\" WHERE 1=1 --", "where": true}));
    assert_eq!(err.code(), CompileErrorCode::InvalidAlias);
}

// =============================================================================
// Arity and type enforcement
// =============================================================================

#[test]
fn test_arity_is_enforced() {
    let err = compile_err(note_where(json!({"==": [{"prop": "id"}]})));
    assert_eq!(err.code(), CompileErrorCode::ArityMismatch);
    assert_eq!(err.path(), "$.where");

    let err = compile_err(note_where(json!({"not": [true, false]})));
    assert_eq!(err.code(), CompileErrorCode::ArityMismatch);

    let err = compile_err(note_where(json!({"/": [{"prop": "id"}, 2, 3]})));
    assert_eq!(err.code(), CompileErrorCode::ArityMismatch);
}

#[test]
fn test_types_are_enforced_without_coercion() {
    let err = compile_err(note_where(json!({"contains": [{"prop": "id"}, "1"]})));
    assert_eq!(err.code(), CompileErrorCode::TypeMismatch);

    let err = compile_err(note_where(json!({"==": [{"field": "Front"}, 1]})));
    assert_eq!(err.code(), CompileErrorCode::TypeMismatch);

    let err = compile_err(note_where(json!({"and": [true, {"prop": "deckName"}]})));
    assert_eq!(err.code(), CompileErrorCode::TypeMismatch);
    assert_eq!(err.path(), "$.where.and[1]");
}

// =============================================================================
// Unknown references
// =============================================================================

#[test]
fn test_unknown_field_is_rejected() {
    let err = compile_err(note_where(json!({"isEmpty": {"field": "nonexistentField"}})));
    assert_eq!(err.code(), CompileErrorCode::UnknownField);
    assert!(err.message().contains("nonexistentField"));
}

#[test]
fn test_unknown_field_context_is_rejected() {
    let err = compile_err(json!({
        "target": "HistoryEntry", "alias": "h",
        "where": {"isEmpty": {"field": ["Front", "ai_changes"]}}
    }));
    assert_eq!(err.code(), CompileErrorCode::UnknownFieldContext);
}

#[test]
fn test_unknown_scope_is_rejected() {
    let cat = catalog();
    let mut scopes = Scopes::new();
    scopes.insert("deck".into(), ScopeValue::deck("Japanese"));
    let query = parse(&json!({"target": "Suggestion", "alias": "s", "where": true}));
    let err = SelCompiler::new(&cat).compile(&query, &scopes).unwrap_err();
    assert_eq!(err.code(), CompileErrorCode::UnknownScope);
}

#[test]
fn test_unresolved_ref_alias() {
    let err = compile_err(note_where(json!({"exists": {"query": {
        "target": "Suggestion", "alias": "s",
        "where": {"==": [{"prop": "noteId"}, {"ref": ["root", "id"]}]}
    }}})));
    assert_eq!(err.code(), CompileErrorCode::UnresolvedScope);
}

#[test]
fn test_parser_rejections_carry_paths() {
    let err = parse_query_value(&note_where(json!({"or": [true, {"matches": ["a", "b"]}]})))
        .unwrap_err();
    assert_eq!(err.code(), ParseErrorCode::UnknownOperator);
    assert_eq!(err.path(), "$.where.or[1]");

    let err = parse_query_value(&json!({"target": "Card", "alias": "c", "where": true})).unwrap_err();
    assert_eq!(err.code(), ParseErrorCode::InvalidQuery);
}

#[test]
fn test_engine_errors_have_stable_codes() {
    let engine = seeded_engine();
    let err = engine
        .execute_json(&note_where(json!({"==": [{"field": "Nope"}, "x"]})).to_string(), &Scopes::new())
        .unwrap_err();
    assert_eq!(err.code(), "SEL_COMPILE_UNKNOWN_FIELD");
    assert!(err.is_rejection());
    assert!(err.to_string().starts_with("[REJECT] SEL_COMPILE_UNKNOWN_FIELD"));
}
