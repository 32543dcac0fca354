//! AST to SQL compiler
//!
//! Compilation flow for a top-level query:
//! 1. Check the alias and resolve the target schema
//! 2. Emit the explicit column list in property order
//! 3. Compile scope predicates, then the user condition
//! 4. Append ORDER BY and LIMIT
//!
//! Every literal becomes a `?` parameter. Parameters are collected in the
//! order their markers appear in the SQL text.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use crate::ast::{Scopes, SelNode, SelQuery, SelType};
use crate::operators::{OperatorDef, OperatorRegistry, Strategy};
use crate::schema::{EntityType, FieldCatalog, FieldContextDef};

use super::context::{AliasChain, Frame};
use super::errors::{CompileError, CompileResult};
use super::explain::CompileExplain;
use super::scope::scope_predicate;
use super::sql::{SqlFragment, SqlParam};

/// Output of compilation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub target: EntityType,
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl CompiledQuery {
    /// Diagnostic view of the statement and its parameters
    pub fn explain(&self) -> CompileExplain {
        CompileExplain::from_compiled(self)
    }
}

/// A compiled expression with its resolved type
#[derive(Debug)]
struct Typed {
    frag: SqlFragment,
    ty: SelType,
    /// Contains an aggregate outside any nested subquery
    aggregate: bool,
}

impl Typed {
    fn literal(param: SqlParam, ty: SelType) -> Self {
        Self {
            frag: SqlFragment::param(param),
            ty,
            aggregate: false,
        }
    }

    fn new(frag: SqlFragment, ty: SelType) -> Self {
        Self {
            frag,
            ty,
            aggregate: false,
        }
    }
}

/// How a subquery is consumed by its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubqueryUse {
    /// Operand of `exists`
    Exists,
    /// Scalar value
    Scalar,
}

/// Compiles queries against the static schema and a field catalogue
#[derive(Debug, Clone)]
pub struct SelCompiler<'c> {
    registry: &'static OperatorRegistry,
    catalog: &'c FieldCatalog,
    default_limit: Option<u64>,
}

impl<'c> SelCompiler<'c> {
    pub fn new(catalog: &'c FieldCatalog) -> Self {
        Self {
            registry: OperatorRegistry::global(),
            catalog,
            default_limit: None,
        }
    }

    /// Limit applied to top-level queries that carry none
    pub fn with_default_limit(mut self, limit: Option<u64>) -> Self {
        self.default_limit = limit;
        self
    }

    /// Compiles a top-level query with the given active scopes
    pub fn compile(&self, query: &SelQuery, scopes: &Scopes) -> CompileResult<CompiledQuery> {
        if query.result.is_some() {
            return Err(CompileError::invalid_query(
                "$.result",
                "result is only allowed on subqueries",
            ));
        }

        let schema = query.target.schema();
        let predicates = scopes
            .iter()
            .map(|(key, scope)| {
                scope_predicate(schema, key, scope).map(|node| (format!("$scopes.{}", key), node))
            })
            .collect::<CompileResult<Vec<_>>>()?;

        let mut chain = AliasChain::new();
        self.check_alias(&chain, &query.alias, "$.alias")?;
        let frame = Frame {
            alias: &query.alias,
            schema,
        };
        chain.push(frame);

        let columns: Vec<String> = schema
            .properties
            .iter()
            .map(|p| frame.column(p.column))
            .collect();
        let mut sql = SqlFragment::raw(format!(
            "SELECT {} FROM {} AS \"{}\" WHERE ",
            columns.join(", "),
            schema.table,
            query.alias
        ));

        let mut conditions = Vec::with_capacity(predicates.len() + 1);
        for (path, predicate) in &predicates {
            conditions.push(self.compile_condition(predicate, &mut chain, path)?);
        }
        if conditions.is_empty() || !query.where_clause.is_trivially_true() {
            conditions.push(self.compile_condition(&query.where_clause, &mut chain, "$.where")?);
        }
        sql.append(SqlFragment::join(conditions, " AND "));

        self.append_order_by(&mut sql, query, &frame, "$")?;
        if let Some(limit) = query.limit.or(self.default_limit) {
            sql.push_sql(" LIMIT ").push_param(limit_param(limit));
        }

        chain.pop();
        Ok(CompiledQuery {
            target: query.target,
            sql: sql.sql,
            params: sql.params,
        })
    }

    fn check_alias(&self, chain: &AliasChain<'_>, alias: &str, path: &str) -> CompileResult<()> {
        if !is_identifier(alias) || alias.starts_with("__") {
            return Err(CompileError::invalid_alias(path, alias));
        }
        if chain.contains(alias) {
            return Err(CompileError::duplicate_alias(path, alias));
        }
        Ok(())
    }

    fn append_order_by(
        &self,
        sql: &mut SqlFragment,
        query: &SelQuery,
        frame: &Frame<'_>,
        path: &str,
    ) -> CompileResult<()> {
        if query.order_by.is_empty() {
            return Ok(());
        }
        let mut terms = Vec::with_capacity(query.order_by.len());
        for (i, clause) in query.order_by.iter().enumerate() {
            let prop = frame.schema.property(&clause.property).ok_or_else(|| {
                CompileError::unknown_property(
                    &format!("{}.orderBy[{}]", path, i),
                    query.target,
                    &clause.property,
                )
            })?;
            terms.push(format!(
                "{} {}",
                frame.column(prop.column),
                clause.direction.sql()
            ));
        }
        sql.push_sql(" ORDER BY ").push_sql(&terms.join(", "));
        Ok(())
    }

    /// Compiles a node that must evaluate to a boolean
    fn compile_condition<'q>(
        &self,
        node: &'q SelNode,
        chain: &mut AliasChain<'q>,
        path: &str,
    ) -> CompileResult<SqlFragment> {
        let typed = self.compile_node(node, chain, path, false)?;
        if !SelType::Boolean.accepts(typed.ty) {
            return Err(CompileError::not_a_condition(path, typed.ty));
        }
        Ok(typed.frag)
    }

    fn compile_node<'q>(
        &self,
        node: &'q SelNode,
        chain: &mut AliasChain<'q>,
        path: &str,
        aggregates: bool,
    ) -> CompileResult<Typed> {
        match node {
            SelNode::String(s) => Ok(Typed::literal(SqlParam::Text(s.clone()), SelType::String)),
            SelNode::Number(n) => Ok(Typed::literal(SqlParam::from_number(n), SelType::Number)),
            SelNode::Boolean(b) => Ok(Typed::literal(SqlParam::Boolean(*b), SelType::Boolean)),
            SelNode::Null => Ok(Typed::literal(SqlParam::Null, SelType::Any)),
            SelNode::Query(q) => self.compile_subquery(q, chain, path, SubqueryUse::Scalar),
            SelNode::Operation { operator, args } => {
                self.compile_operation(operator, args, chain, path, aggregates)
            }
        }
    }

    fn compile_operation<'q>(
        &self,
        operator: &str,
        args: &'q [SelNode],
        chain: &mut AliasChain<'q>,
        path: &str,
        aggregates: bool,
    ) -> CompileResult<Typed> {
        let def = self
            .registry
            .get(operator)
            .ok_or_else(|| CompileError::unknown_operator(path, operator))?;
        let sig = &def.signature;
        if !sig.accepts_arity(args.len()) {
            return Err(CompileError::arity_mismatch(
                path,
                operator,
                &sig.describe_arity(),
                args.len(),
            ));
        }

        match def.strategy {
            Strategy::Field => self.compile_field(def, args, chain, path),
            Strategy::Prop => {
                let name = string_arg(args, 0, path, def)?;
                let frame = current_frame(chain)?;
                property_ref(&frame, name, &arg_path(path, def.key, 0))
            }
            Strategy::Ref => {
                let alias = string_arg(args, 0, path, def)?;
                let name = string_arg(args, 1, path, def)?;
                let frame = *chain
                    .find(alias)
                    .ok_or_else(|| CompileError::unresolved_scope(&arg_path(path, def.key, 0), alias))?;
                property_ref(&frame, name, &arg_path(path, def.key, 1))
            }
            Strategy::Query => match &args[0] {
                SelNode::Query(q) => {
                    self.compile_subquery(q, chain, &arg_path(path, def.key, 0), SubqueryUse::Scalar)
                }
                _ => Err(CompileError::invalid_argument(
                    path,
                    def.key,
                    "query expects a nested query",
                )),
            },
            Strategy::Exists => {
                let sub_path = arg_path(path, def.key, 0);
                let q = subquery_operand(&args[0]).ok_or_else(|| {
                    CompileError::invalid_argument(&sub_path, def.key, "exists expects a query")
                })?;
                let sub = self.compile_subquery(q, chain, &sub_path, SubqueryUse::Exists)?;
                let mut frag = SqlFragment::raw("EXISTS ");
                frag.append(sub.frag);
                Ok(Typed::new(frag, SelType::Boolean))
            }
            Strategy::Count => {
                if !aggregates {
                    return Err(CompileError::misplaced_aggregate(path, def.key));
                }
                let frag = match args {
                    [] => SqlFragment::raw("COUNT(*)"),
                    [SelNode::String(s)] if s == "*" => SqlFragment::raw("COUNT(*)"),
                    _ => {
                        let arg = self.compile_args(def, args, chain, path, false)?.remove(0);
                        let mut frag = SqlFragment::raw("COUNT(");
                        frag.append(arg.frag).push_sql(")");
                        frag
                    }
                };
                Ok(Typed {
                    frag,
                    ty: SelType::Number,
                    aggregate: true,
                })
            }
            Strategy::Aggregate(function) => {
                if !aggregates {
                    return Err(CompileError::misplaced_aggregate(path, def.key));
                }
                let arg = self.compile_args(def, args, chain, path, false)?.remove(0);
                let ty = if sig.return_type.is_concrete() {
                    sig.return_type
                } else {
                    arg.ty
                };
                let mut frag = SqlFragment::raw(format!("{}(", function));
                frag.append(arg.frag).push_sql(")");
                Ok(Typed {
                    frag,
                    ty,
                    aggregate: true,
                })
            }
            Strategy::Compare(sql_op) => {
                let compared_with_null = args.iter().any(|a| matches!(a, SelNode::Null));
                let sql_op = match (sql_op, compared_with_null) {
                    ("=", true) => "IS",
                    ("<>", true) => "IS NOT",
                    (op, _) => op,
                };
                let mut compiled = self.compile_args(def, args, chain, path, aggregates)?;
                let aggregate = compiled.iter().any(|t| t.aggregate);
                let right = compiled.pop();
                let left = compiled.pop();
                let (left, right) = match (left, right) {
                    (Some(l), Some(r)) => (l, r),
                    _ => return Err(CompileError::arity_mismatch(path, def.key, "2", args.len())),
                };
                let mut frag = SqlFragment::raw("(");
                frag.append(left.frag)
                    .push_sql(&format!(" {} ", sql_op))
                    .append(right.frag)
                    .push_sql(")");
                Ok(Typed {
                    frag,
                    ty: SelType::Boolean,
                    aggregate,
                })
            }
            Strategy::Junction(joiner) => {
                let compiled = self.compile_args(def, args, chain, path, aggregates)?;
                Ok(combine(compiled, |frags| {
                    SqlFragment::join(frags, &format!(" {} ", joiner)).parenthesized()
                }, SelType::Boolean))
            }
            Strategy::Not => {
                let compiled = self.compile_args(def, args, chain, path, aggregates)?;
                Ok(combine(compiled, |frags| {
                    let mut frag = SqlFragment::raw("(NOT ");
                    frag.append(SqlFragment::join(frags, "")).push_sql(")");
                    frag
                }, SelType::Boolean))
            }
            Strategy::Template(template) => {
                let compiled = self.compile_args(def, args, chain, path, aggregates)?;
                Ok(combine(compiled, |frags| SqlFragment::render(template, &frags), sig.return_type))
            }
            Strategy::Arithmetic(math_op) => {
                let compiled = self.compile_args(def, args, chain, path, aggregates)?;
                Ok(combine(compiled, |mut frags| {
                    if frags.len() == 1 && math_op == "-" {
                        let mut frag = SqlFragment::raw("(0 - ");
                        frag.append(frags.remove(0)).push_sql(")");
                        frag
                    } else {
                        SqlFragment::join(frags, &format!(" {} ", math_op)).parenthesized()
                    }
                }, SelType::Number))
            }
        }
    }

    /// Compiles every argument and checks it against the signature
    fn compile_args<'q>(
        &self,
        def: &OperatorDef,
        args: &'q [SelNode],
        chain: &mut AliasChain<'q>,
        path: &str,
        aggregates: bool,
    ) -> CompileResult<Vec<Typed>> {
        let sig = &def.signature;
        let mut compiled = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let arg_path = arg_path(path, def.key, i);
            let typed = self.compile_node(arg, chain, &arg_path, aggregates)?;
            let expected = sig.arg_type_at(i);
            if !expected.accepts(typed.ty) {
                return Err(CompileError::type_mismatch(&arg_path, def.key, i, expected, typed.ty));
            }
            compiled.push(typed);
        }

        if sig.uniform {
            let mut concrete = compiled.iter().map(|t| t.ty).filter(SelType::is_concrete);
            if let Some(first) = concrete.next() {
                if let Some(other) = concrete.find(|t| *t != first) {
                    return Err(CompileError::operand_mismatch(path, def.key, first, other));
                }
            }
        }
        Ok(compiled)
    }

    /// `field(name)` or `field(name, context, fallback...)`
    fn compile_field(
        &self,
        def: &OperatorDef,
        args: &[SelNode],
        chain: &AliasChain<'_>,
        path: &str,
    ) -> CompileResult<Typed> {
        let frame = current_frame(chain)?;
        let schema = frame.schema;
        let fk = match schema.field_fk {
            Some(fk) if schema.has_fields() => fk,
            _ => return Err(CompileError::no_field_storage(path, schema.entity)),
        };

        let name = string_arg(args, 0, path, def)?;
        let contexts: Vec<&FieldContextDef> = if args.len() == 1 {
            schema
                .default_field_context()
                .into_iter()
                .collect()
        } else {
            let mut contexts = Vec::with_capacity(args.len() - 1);
            for i in 1..args.len() {
                let key = string_arg(args, i, path, def)?;
                let context = schema.field_context(key).ok_or_else(|| {
                    CompileError::unknown_field_context(&arg_path(path, def.key, i), schema.entity, key)
                })?;
                contexts.push(context);
            }
            contexts
        };

        if !contexts.iter().any(|c| self.catalog.contains(c.tag, name)) {
            let keys: Vec<&str> = contexts.iter().map(|c| c.key).collect();
            return Err(CompileError::unknown_field(path, name, &keys.join(", ")));
        }

        let mut frag = SqlFragment::raw(format!(
            "(SELECT __fv.field_value FROM field_value AS __fv WHERE __fv.{} = {}",
            fk,
            frame.column("id")
        ));
        match contexts.as_slice() {
            [single] => {
                frag.push_sql(" AND __fv.context = ")
                    .push_param(single.tag.into())
                    .push_sql(" AND __fv.field_name = ")
                    .push_param(name.into());
            }
            many => {
                frag.push_sql(" AND __fv.field_name = ").push_param(name.into());
                let markers = SqlFragment::join(
                    many.iter().map(|c| SqlFragment::param(c.tag.into())).collect(),
                    ", ",
                );
                frag.push_sql(" AND __fv.context IN (").append(markers).push_sql(")");
                frag.push_sql(" ORDER BY CASE __fv.context");
                for (priority, context) in many.iter().enumerate() {
                    frag.push_sql(" WHEN ")
                        .push_param(context.tag.into())
                        .push_sql(&format!(" THEN {}", priority));
                }
                frag.push_sql(" END LIMIT 1");
            }
        }
        frag.push_sql(")");
        Ok(Typed::new(frag, SelType::String))
    }

    fn compile_subquery<'q>(
        &self,
        query: &'q SelQuery,
        chain: &mut AliasChain<'q>,
        path: &str,
        usage: SubqueryUse,
    ) -> CompileResult<Typed> {
        self.check_alias(chain, &query.alias, &format!("{}.alias", path))?;
        chain.push(Frame {
            alias: &query.alias,
            schema: query.target.schema(),
        });
        let outcome = self.subquery_body(query, chain, path, usage);
        chain.pop();
        outcome
    }

    fn subquery_body<'q>(
        &self,
        query: &'q SelQuery,
        chain: &mut AliasChain<'q>,
        path: &str,
        usage: SubqueryUse,
    ) -> CompileResult<Typed> {
        let frame = current_frame(chain)?;

        let (select, ty, aggregate) = match (&query.result, usage) {
            (Some(result), _) => {
                let typed = self.compile_node(result, chain, &format!("{}.result", path), true)?;
                (typed.frag, typed.ty, typed.aggregate)
            }
            (None, SubqueryUse::Exists) => (SqlFragment::raw("1"), SelType::Boolean, false),
            (None, SubqueryUse::Scalar) => {
                return Err(CompileError::invalid_query(
                    path,
                    "A subquery without result can only be used inside exists",
                ))
            }
        };

        let condition =
            self.compile_condition(&query.where_clause, chain, &format!("{}.where", path))?;

        let mut frag = SqlFragment::raw("(SELECT ");
        frag.append(select)
            .push_sql(&format!(
                " FROM {} AS \"{}\" WHERE ",
                frame.schema.table, query.alias
            ))
            .append(condition);
        self.append_order_by(&mut frag, query, &frame, path)?;
        match query.limit {
            Some(limit) => {
                frag.push_sql(" LIMIT ").push_param(limit_param(limit));
            }
            None if usage == SubqueryUse::Scalar && !aggregate => {
                frag.push_sql(" LIMIT 1");
            }
            None => {}
        }
        frag.push_sql(")");

        let ty = match usage {
            SubqueryUse::Exists => SelType::Boolean,
            SubqueryUse::Scalar => ty,
        };
        Ok(Typed::new(frag, ty))
    }
}

/// Merges compiled arguments into one expression
fn combine(
    compiled: Vec<Typed>,
    build: impl FnOnce(Vec<SqlFragment>) -> SqlFragment,
    ty: SelType,
) -> Typed {
    let aggregate = compiled.iter().any(|t| t.aggregate);
    let frag = build(compiled.into_iter().map(|t| t.frag).collect());
    Typed {
        frag,
        ty,
        aggregate,
    }
}

fn arg_path(path: &str, operator: &str, index: usize) -> String {
    format!("{}.{}[{}]", path, operator, index)
}

fn current_frame<'q>(chain: &AliasChain<'q>) -> CompileResult<Frame<'q>> {
    chain
        .current()
        .copied()
        .ok_or_else(|| CompileError::invalid_query("$", "Expression outside of any query"))
}

/// Argument that must be a string literal (names, aliases, contexts)
fn string_arg<'a>(
    args: &'a [SelNode],
    index: usize,
    path: &str,
    def: &OperatorDef,
) -> CompileResult<&'a str> {
    match args.get(index) {
        Some(SelNode::String(s)) => Ok(s),
        _ => Err(CompileError::invalid_argument(
            &arg_path(path, def.key, index),
            def.key,
            format!("'{}' argument {} must be a string literal", def.key, index),
        )),
    }
}

fn property_ref(frame: &Frame<'_>, name: &str, path: &str) -> CompileResult<Typed> {
    let prop = frame
        .schema
        .property(name)
        .ok_or_else(|| CompileError::unknown_property(path, frame.schema.entity, name))?;
    Ok(Typed::new(
        SqlFragment::raw(frame.column(prop.column)),
        prop.sel_type(),
    ))
}

/// Accepts `query(q)` or a bare query node
fn subquery_operand(node: &SelNode) -> Option<&SelQuery> {
    match node {
        SelNode::Query(q) => Some(q),
        SelNode::Operation { operator, args } if operator == "query" => match args.as_slice() {
            [SelNode::Query(q)] => Some(q),
            _ => None,
        },
        _ => None,
    }
}

fn limit_param(limit: u64) -> SqlParam {
    SqlParam::Integer(i64::try_from(limit).unwrap_or(i64::MAX))
}

fn is_identifier(alias: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").ok())
        .as_ref()
        .map_or(false, |re| re.is_match(alias))
}
