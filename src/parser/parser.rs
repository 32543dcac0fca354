//! JSON to AST decoding
//!
//! Strictly structural: operator keys must be registered, but arity,
//! types, properties, fields and aliases are checked by the compiler.
//! Any shape not covered by the grammar is rejected.

use serde_json::{Map, Value};

use crate::ast::{OrderClause, SelNode, SelQuery, SortDirection};
use crate::operators::OperatorRegistry;
use crate::schema::EntityType;

use super::errors::{ParseError, ParseResult};

const QUERY_KEYS: [&str; 6] = ["target", "alias", "where", "orderBy", "limit", "result"];
const ORDER_KEYS: [&str; 4] = ["field", "prop", "direction", "desc"];

/// Parses a query document from JSON text
pub fn parse_query(input: &str) -> ParseResult<SelQuery> {
    let value: Value = serde_json::from_str(input).map_err(ParseError::invalid_json)?;
    parse_query_value(&value)
}

/// Parses a query document from an already decoded JSON value
pub fn parse_query_value(value: &Value) -> ParseResult<SelQuery> {
    query_at(value, "$")
}

/// Parses a single expression from JSON text
pub fn parse_node(input: &str) -> ParseResult<SelNode> {
    let value: Value = serde_json::from_str(input).map_err(ParseError::invalid_json)?;
    parse_node_value(&value)
}

/// Parses a single expression from an already decoded JSON value
pub fn parse_node_value(value: &Value) -> ParseResult<SelNode> {
    node_at(value, "$")
}

fn child(path: &str, key: &str) -> String {
    format!("{}.{}", path, key)
}

fn index(path: &str, i: usize) -> String {
    format!("{}[{}]", path, i)
}

fn query_at(value: &Value, path: &str) -> ParseResult<SelQuery> {
    let obj = value
        .as_object()
        .ok_or_else(|| ParseError::invalid_query(path, "Query must be a JSON object"))?;

    if let Some(key) = obj.keys().find(|k| !QUERY_KEYS.contains(&k.as_str())) {
        return Err(ParseError::invalid_query(
            &child(path, key),
            format!("Unknown query key '{}'", key),
        ));
    }

    let target = required_str(obj, path, "target")?;
    let target = EntityType::from_name(target).ok_or_else(|| {
        ParseError::invalid_query(
            &child(path, "target"),
            format!("Unknown target '{}'", target),
        )
    })?;

    let alias = required_str(obj, path, "alias")?;
    if alias.is_empty() {
        return Err(ParseError::invalid_query(
            &child(path, "alias"),
            "Alias must not be empty",
        ));
    }

    let where_path = child(path, "where");
    let where_clause = match obj.get("where") {
        Some(Value::Bool(b)) => SelNode::Boolean(*b),
        Some(v @ Value::Object(_)) => node_at(v, &where_path)?,
        Some(_) => {
            return Err(ParseError::invalid_query(
                &where_path,
                "where must be a single-key operation object or a boolean",
            ))
        }
        None => return Err(ParseError::invalid_query(path, "Missing required key 'where'")),
    };

    let order_path = child(path, "orderBy");
    let order_by = match obj.get("orderBy") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| order_clause_at(item, &index(&order_path, i)))
            .collect::<ParseResult<Vec<_>>>()?,
        Some(clause @ Value::Object(_)) => vec![order_clause_at(clause, &order_path)?],
        Some(_) => {
            return Err(ParseError::invalid_query(
                &order_path,
                "orderBy must be a clause object or an array of clauses",
            ))
        }
    };

    let limit = match obj.get("limit") {
        None | Some(Value::Null) => None,
        Some(v) => Some(v.as_u64().ok_or_else(|| {
            ParseError::invalid_query(&child(path, "limit"), "limit must be a non-negative integer")
        })?),
    };

    let result = match obj.get("result") {
        None | Some(Value::Null) => None,
        Some(v) => Some(node_at(v, &child(path, "result"))?),
    };

    Ok(SelQuery {
        target,
        alias: alias.to_string(),
        where_clause,
        order_by,
        limit,
        result,
    })
}

fn required_str<'v>(obj: &'v Map<String, Value>, path: &str, key: &str) -> ParseResult<&'v str> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ParseError::invalid_query(
            &child(path, key),
            format!("'{}' must be a string", key),
        )),
        None => Err(ParseError::invalid_query(
            path,
            format!("Missing required key '{}'", key),
        )),
    }
}

fn order_clause_at(value: &Value, path: &str) -> ParseResult<OrderClause> {
    let obj = value
        .as_object()
        .ok_or_else(|| ParseError::invalid_query(path, "Order clause must be an object"))?;

    if let Some(key) = obj.keys().find(|k| !ORDER_KEYS.contains(&k.as_str())) {
        return Err(ParseError::invalid_query(
            &child(path, key),
            format!("Unknown order clause key '{}'", key),
        ));
    }

    let property = match (obj.get("field"), obj.get("prop")) {
        (Some(Value::String(s)), None) | (None, Some(Value::String(s))) => s.clone(),
        (Some(_), Some(_)) => {
            return Err(ParseError::invalid_query(
                path,
                "Order clause must name exactly one of 'field' or 'prop'",
            ))
        }
        (None, None) => {
            return Err(ParseError::invalid_query(
                path,
                "Order clause requires 'field' or 'prop'",
            ))
        }
        _ => {
            return Err(ParseError::invalid_query(
                path,
                "Order clause property must be a string",
            ))
        }
    };

    let direction = match (obj.get("direction"), obj.get("desc")) {
        (Some(_), Some(_)) => {
            return Err(ParseError::invalid_query(
                path,
                "Order clause may carry 'direction' or 'desc', not both",
            ))
        }
        (Some(Value::String(d)), None) => match d.as_str() {
            "Asc" => SortDirection::Asc,
            "Desc" => SortDirection::Desc,
            other => {
                return Err(ParseError::invalid_query(
                    &child(path, "direction"),
                    format!("Unknown direction '{}', expected Asc or Desc", other),
                ))
            }
        },
        (None, Some(Value::Bool(desc))) => {
            if *desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            }
        }
        (None, None) => SortDirection::Asc,
        (Some(_), None) => {
            return Err(ParseError::invalid_query(
                &child(path, "direction"),
                "direction must be a string",
            ))
        }
        (None, Some(_)) => {
            return Err(ParseError::invalid_query(
                &child(path, "desc"),
                "desc must be a boolean",
            ))
        }
    };

    Ok(OrderClause {
        property,
        direction,
    })
}

fn node_at(value: &Value, path: &str) -> ParseResult<SelNode> {
    match value {
        Value::Null => Ok(SelNode::Null),
        Value::Bool(b) => Ok(SelNode::Boolean(*b)),
        Value::Number(n) => Ok(SelNode::Number(n.clone())),
        Value::String(s) => Ok(SelNode::String(s.clone())),
        Value::Array(_) => Err(ParseError::invalid_node(
            path,
            "Arrays are only allowed as operator argument lists",
        )),
        Value::Object(obj) => {
            let mut entries = obj.iter();
            let (key, arg) = match (entries.next(), entries.next()) {
                (Some(entry), None) => entry,
                _ => {
                    return Err(ParseError::invalid_node(
                        path,
                        format!("Operation object must have exactly one key, found {}", obj.len()),
                    ))
                }
            };
            let op_path = child(path, key);

            if key == "query" {
                let query = match arg {
                    Value::Array(items) if items.len() == 1 => {
                        query_at(&items[0], &index(&op_path, 0))?
                    }
                    _ => query_at(arg, &op_path)?,
                };
                return Ok(SelNode::op("query", vec![SelNode::Query(Box::new(query))]));
            }

            if !OperatorRegistry::global().contains(key) {
                return Err(ParseError::unknown_operator(path, key));
            }

            let args = match arg {
                Value::Array(items) if key == "field" => field_args(items, &op_path)?,
                Value::Array(items) => items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| node_at(item, &index(&op_path, i)))
                    .collect::<ParseResult<Vec<_>>>()?,
                single => vec![node_at(single, &op_path)?],
            };

            Ok(SelNode::op(key.as_str(), args))
        }
    }
}

/// `field` also takes its fallback contexts as one trailing list:
/// `["Back", ["edited", "changes"]]` reads as `["Back", "edited", "changes"]`.
fn field_args(items: &[Value], path: &str) -> ParseResult<Vec<SelNode>> {
    let mut args = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match item {
            Value::Array(contexts) if i == 1 && items.len() == 2 => {
                let list_path = index(path, i);
                for (j, context) in contexts.iter().enumerate() {
                    match context {
                        Value::String(s) => args.push(SelNode::String(s.clone())),
                        _ => {
                            return Err(ParseError::invalid_node(
                                &index(&list_path, j),
                                "Field contexts must be strings",
                            ))
                        }
                    }
                }
            }
            _ => args.push(node_at(item, &index(path, i))?),
        }
    }
    Ok(args)
}
