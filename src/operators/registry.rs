//! The operator table
//!
//! Built once on first use and never mutated. Lookups by key go through a
//! hash index; catalogue queries are linear scans over the table.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::ast::SelType;

use super::signature::{Category, OperatorDef, Signature, Strategy};

use crate::ast::SelType::{Any, Boolean, Number, String as Str};

const fn sig(
    min_args: usize,
    max_args: Option<usize>,
    arg_types: &'static [SelType],
    return_type: SelType,
) -> Signature {
    Signature {
        min_args,
        max_args,
        arg_types,
        return_type,
        uniform: false,
    }
}

const fn uniform(sig: Signature) -> Signature {
    Signature {
        uniform: true,
        ..sig
    }
}

const fn def(
    key: &'static str,
    display_name: &'static str,
    category: Category,
    description: &'static str,
    signature: Signature,
    strategy: Strategy,
) -> OperatorDef {
    OperatorDef {
        key,
        display_name,
        category,
        description,
        signature,
        strategy,
    }
}

const COMPARE: Signature = uniform(sig(2, Some(2), &[Any], Boolean));
const STRING_MATCH: Signature = sig(2, Some(2), &[Str], Boolean);
const CHECK: Signature = sig(1, Some(1), &[Any], Boolean);
const VARIADIC_MATH: Signature = sig(1, None, &[Number], Number);
const BINARY_MATH: Signature = sig(2, Some(2), &[Number], Number);

static OPERATORS: &[OperatorDef] = &[
    // Comparison
    def("==", "equals", Category::Comparison, "Both sides are equal", COMPARE, Strategy::Compare("=")),
    def("!=", "not equals", Category::Comparison, "Both sides differ", COMPARE, Strategy::Compare("<>")),
    def("<", "less than", Category::Comparison, "Left is less than right", COMPARE, Strategy::Compare("<")),
    def("<=", "at most", Category::Comparison, "Left is less than or equal to right", COMPARE, Strategy::Compare("<=")),
    def(">", "greater than", Category::Comparison, "Left is greater than right", COMPARE, Strategy::Compare(">")),
    def(">=", "at least", Category::Comparison, "Left is greater than or equal to right", COMPARE, Strategy::Compare(">=")),
    // Logic
    def("and", "all of", Category::Logic, "Every condition holds", sig(1, None, &[Boolean], Boolean), Strategy::Junction("AND")),
    def("or", "any of", Category::Logic, "At least one condition holds", sig(1, None, &[Boolean], Boolean), Strategy::Junction("OR")),
    def("not", "not", Category::Logic, "Negates a condition", sig(1, Some(1), &[Boolean], Boolean), Strategy::Not),
    // String
    def("contains", "contains", Category::String, "Text contains the substring, ignoring ASCII case", STRING_MATCH, Strategy::Template("(instr(lower($0), lower($1)) > 0)")),
    def("startsWith", "starts with", Category::String, "Text starts with the prefix, ignoring ASCII case", STRING_MATCH, Strategy::Template("(instr(lower($0), lower($1)) = 1)")),
    def("endsWith", "ends with", Category::String, "Text ends with the suffix, ignoring ASCII case", STRING_MATCH, Strategy::Template("(length($0) >= length($1) AND lower(substr($0, length($0) - length($1) + 1)) = lower($1))")),
    def("len", "length", Category::String, "Character length, 0 when absent", sig(1, Some(1), &[Str], Number), Strategy::Template("COALESCE(LENGTH($0), 0)")),
    // Predicate
    def("isNull", "is null", Category::Predicate, "Value is absent", CHECK, Strategy::Template("($0 IS NULL)")),
    def("isNotNull", "is not null", Category::Predicate, "Value is present", CHECK, Strategy::Template("($0 IS NOT NULL)")),
    def("isEmpty", "is empty", Category::Predicate, "Value is absent or empty text", CHECK, Strategy::Template("($0 IS NULL OR $0 = '')")),
    def("isNotEmpty", "is not empty", Category::Predicate, "Value is present and not empty text", CHECK, Strategy::Template("($0 IS NOT NULL AND $0 <> '')")),
    def("exists", "exists", Category::Predicate, "The subquery matches at least one row", sig(1, Some(1), &[Any], Boolean), Strategy::Exists),
    // Math
    def("+", "plus", Category::Math, "Sum of the operands", VARIADIC_MATH, Strategy::Arithmetic("+")),
    def("-", "minus", Category::Math, "Difference, or negation with one operand", VARIADIC_MATH, Strategy::Arithmetic("-")),
    def("*", "times", Category::Math, "Product of the operands", VARIADIC_MATH, Strategy::Arithmetic("*")),
    def("/", "divided by", Category::Math, "Quotient", BINARY_MATH, Strategy::Arithmetic("/")),
    def("%", "modulo", Category::Math, "Remainder", BINARY_MATH, Strategy::Arithmetic("%")),
    // Aggregate
    def("count", "count", Category::Aggregate, "Number of matching rows or non-null values", sig(0, Some(1), &[Any], Number), Strategy::Count),
    def("avg", "average", Category::Aggregate, "Mean of the values", sig(1, Some(1), &[Number], Number), Strategy::Aggregate("AVG")),
    def("min", "minimum", Category::Aggregate, "Smallest value", sig(1, Some(1), &[Any], Any), Strategy::Aggregate("MIN")),
    def("max", "maximum", Category::Aggregate, "Largest value", sig(1, Some(1), &[Any], Any), Strategy::Aggregate("MAX")),
    // Internal
    def("field", "field", Category::Internal, "Field value by name, with optional context fallbacks", sig(1, None, &[Str], Str), Strategy::Field),
    def("prop", "property", Category::Internal, "Property of the current query target", sig(1, Some(1), &[Str], Any), Strategy::Prop),
    def("ref", "reference", Category::Internal, "Property of an enclosing query by alias", sig(2, Some(2), &[Str, Str], Any), Strategy::Ref),
    def("query", "subquery", Category::Internal, "Correlated subquery producing its result", sig(1, Some(1), &[Any], Any), Strategy::Query),
];

/// Read-only operator registry
#[derive(Debug)]
pub struct OperatorRegistry {
    operators: &'static [OperatorDef],
    by_key: HashMap<&'static str, usize>,
}

impl OperatorRegistry {
    /// The process-wide registry
    pub fn global() -> &'static OperatorRegistry {
        static REGISTRY: OnceLock<OperatorRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| OperatorRegistry::build(OPERATORS))
    }

    fn build(operators: &'static [OperatorDef]) -> Self {
        let by_key = operators
            .iter()
            .enumerate()
            .map(|(i, op)| (op.key, i))
            .collect();
        Self { operators, by_key }
    }

    pub fn get(&self, key: &str) -> Option<&'static OperatorDef> {
        self.by_key.get(key).map(|&i| &self.operators[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Every operator in table order, internal ones included
    pub fn iter(&self) -> impl Iterator<Item = &'static OperatorDef> {
        self.operators.iter()
    }

    pub fn user_operators(&self) -> impl Iterator<Item = &'static OperatorDef> {
        self.operators.iter().filter(|op| op.is_user_facing())
    }

    /// User operators whose result can fill a slot of type `t`.
    ///
    /// Operators returning `Any` always qualify; `t == Any` selects all.
    pub fn returning_type(&self, t: SelType) -> Vec<&'static OperatorDef> {
        self.user_operators()
            .filter(|op| t.accepts(op.signature.return_type))
            .collect()
    }

    /// User operators whose first argument accepts a value of type `t`
    pub fn accepting_type(&self, t: SelType) -> Vec<&'static OperatorDef> {
        self.user_operators()
            .filter(|op| op.signature.max_args != Some(0))
            .filter(|op| op.signature.arg_type_at(0).accepts(t))
            .collect()
    }

    pub fn by_category(&self, category: Category) -> Vec<&'static OperatorDef> {
        self.operators
            .iter()
            .filter(|op| op.category == category)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}
