//! Scope predicates injected around the user's condition

use serde_json::Value;

use crate::ast::{ScopeValue, SelNode, SelType};
use crate::schema::{EntitySchema, ScopeKind};

use super::errors::{CompileError, CompileResult};

/// Deck hierarchy separator
const DECK_SEPARATOR: &str = "::";

/// Builds the predicate for one active scope as an ordinary AST node so it
/// goes through the same typing and SQL generation as user conditions.
///
/// - deck: the deck itself or any deck below it, ignoring ASCII case
/// - session: `<bound property> == value`
pub(crate) fn scope_predicate(
    schema: &EntitySchema,
    key: &str,
    scope: &ScopeValue,
) -> CompileResult<SelNode> {
    let def = schema
        .scope(key)
        .ok_or_else(|| CompileError::unknown_scope(schema.entity, key))?;
    let path = format!("$scopes.{}", key);

    match def.kind {
        ScopeKind::Deck => {
            let name = match &scope.value {
                Value::String(s) if !s.is_empty() => s.clone(),
                _ if !scope.display_label.is_empty() => scope.display_label.clone(),
                _ => {
                    return Err(CompileError::invalid_argument(
                        &path,
                        key,
                        "Deck scope requires a deck name",
                    ))
                }
            };
            Ok(deck_predicate(def.property, name))
        }
        ScopeKind::Session => {
            let literal = match &scope.value {
                Value::String(s) => session_literal(schema, def.property, s),
                Value::Number(n) => SelNode::Number(n.clone()),
                Value::Bool(b) => SelNode::Boolean(*b),
                _ => {
                    return Err(CompileError::invalid_argument(
                        &path,
                        key,
                        "Session scope requires a scalar value",
                    ))
                }
            };
            Ok(SelNode::op("==", vec![SelNode::prop(def.property), literal]))
        }
    }
}

/// `startsWith(deck, name) AND len(deck) == len(name) OR startsWith(deck, name + "::")`
///
/// A case-insensitive prefix as long as the whole name is the deck itself.
fn deck_predicate(property: &str, name: String) -> SelNode {
    let length = i64::try_from(name.chars().count()).unwrap_or(i64::MAX);
    let prefix = format!("{}{}", name, DECK_SEPARATOR);
    SelNode::op(
        "or",
        vec![
            SelNode::op(
                "and",
                vec![
                    SelNode::op("startsWith", vec![SelNode::prop(property), SelNode::String(name)]),
                    SelNode::op(
                        "==",
                        vec![
                            SelNode::op("len", vec![SelNode::prop(property)]),
                            SelNode::int(length),
                        ],
                    ),
                ],
            ),
            SelNode::op("startsWith", vec![SelNode::prop(property), SelNode::String(prefix)]),
        ],
    )
}

/// Numeric text bound to a numeric property is compared as a number
fn session_literal(schema: &EntitySchema, property: &str, value: &str) -> SelNode {
    let numeric = schema
        .property(property)
        .map(|p| p.sel_type() == SelType::Number)
        .unwrap_or(false);
    match value.trim().parse::<i64>() {
        Ok(n) if numeric => SelNode::int(n),
        _ => SelNode::String(value.to_string()),
    }
}
