//! SQL text with positional parameters
//!
//! Literal values never enter the SQL text. A fragment carries its text
//! and the values of its `?` markers in textual order, so concatenating
//! fragments keeps text and parameters aligned.

use serde::Serialize;
use serde_json::Number;
use std::fmt;

/// A bound parameter value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    Null,
    /// Bound as 0 or 1
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlParam {
    /// Integral numbers bind as integers, everything else as reals
    pub fn from_number(n: &Number) -> Self {
        match n.as_i64() {
            Some(i) => SqlParam::Integer(i),
            None => SqlParam::Real(n.as_f64().unwrap_or(f64::NAN)),
        }
    }
}

impl fmt::Display for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlParam::Null => write!(f, "NULL"),
            SqlParam::Boolean(b) => write!(f, "{}", b),
            SqlParam::Integer(i) => write!(f, "{}", i),
            SqlParam::Real(r) => write!(f, "{}", r),
            SqlParam::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(value)
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        SqlParam::Integer(value)
    }
}

/// SQL text plus the parameters of its `?` markers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl SqlFragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fragment of fixed SQL text with no parameters
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// A single `?` bound to `param`
    pub fn param(param: SqlParam) -> Self {
        Self {
            sql: "?".into(),
            params: vec![param],
        }
    }

    pub fn push_sql(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    /// Appends a `?` bound to `param`
    pub fn push_param(&mut self, param: SqlParam) -> &mut Self {
        self.sql.push('?');
        self.params.push(param);
        self
    }

    pub fn append(&mut self, other: SqlFragment) -> &mut Self {
        self.sql.push_str(&other.sql);
        self.params.extend(other.params);
        self
    }

    pub fn append_ref(&mut self, other: &SqlFragment) -> &mut Self {
        self.sql.push_str(&other.sql);
        self.params.extend(other.params.iter().cloned());
        self
    }

    /// Joins fragments with a separator
    pub fn join(parts: Vec<SqlFragment>, separator: &str) -> SqlFragment {
        let mut out = SqlFragment::new();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                out.push_sql(separator);
            }
            out.append(part);
        }
        out
    }

    /// Wraps the fragment in parentheses
    pub fn parenthesized(self) -> SqlFragment {
        let mut out = SqlFragment::raw("(");
        out.append(self).push_sql(")");
        out
    }

    /// Renders a template with `$n` markers.
    ///
    /// Every occurrence of `$n` copies the text and parameters of
    /// `args[n]`, so a repeated marker repeats its parameters in order.
    /// Markers beyond `args` are emitted verbatim.
    pub fn render(template: &str, args: &[SqlFragment]) -> SqlFragment {
        let mut out = SqlFragment::new();
        let mut rest = template;
        while let Some(pos) = rest.find('$') {
            out.push_sql(&rest[..pos]);
            let after = &rest[pos + 1..];
            let digits = after.bytes().take_while(u8::is_ascii_digit).count();
            match after[..digits].parse::<usize>().ok().and_then(|i| args.get(i)) {
                Some(arg) => {
                    out.append_ref(arg);
                }
                None => {
                    out.push_sql(&rest[pos..pos + 1 + digits]);
                }
            }
            rest = &after[digits..];
        }
        out.push_sql(rest);
        out
    }
}
