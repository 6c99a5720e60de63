//! Intermediate representation nodes produced by lowering.
//!
//! Field references, predicates and range predicates live inside [`Expr`] so
//! every pass matches on one closed sum type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::expr::node::Expr;
use crate::lexical::query::boolean::Occur;

/// Declared scalar type of a document member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    Text,
    Bool,
    Int64,
    Float64,
    DateTime,
    Other,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::Text => "text",
            ScalarKind::Bool => "bool",
            ScalarKind::Int64 => "int64",
            ScalarKind::Float64 => "float64",
            ScalarKind::DateTime => "datetime",
            ScalarKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// Name used by the field reference standing for "any field".
pub const ANY_FIELD: &str = "*";

/// The value of field `name` on the document under test.
///
/// Two references with the same name are interchangeable regardless of kind or boost.
#[derive(Debug, Clone)]
pub struct FieldReference {
    pub kind: ScalarKind,
    pub name: String,
    pub boost: f32,
}

impl FieldReference {
    pub fn new(name: impl Into<String>, kind: ScalarKind) -> Self {
        FieldReference {
            kind,
            name: name.into(),
            boost: 1.0,
        }
    }

    /// The reference produced for the any-field marker.
    pub fn any_field() -> Self {
        FieldReference::new(ANY_FIELD, ScalarKind::Text)
    }

    pub fn is_any_field(&self) -> bool {
        self.name == ANY_FIELD
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }
}

impl PartialEq for FieldReference {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// How a predicate's pattern is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryType {
    Default,
    Prefix,
    Suffix,
    Wildcard,
    Fuzzy,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
}

impl QueryType {
    pub fn is_lower_bound(self) -> bool {
        matches!(self, QueryType::GreaterThan | QueryType::GreaterOrEqual)
    }

    pub fn is_upper_bound(self) -> bool {
        matches!(self, QueryType::LessThan | QueryType::LessOrEqual)
    }

    pub fn is_comparison(self) -> bool {
        self.is_lower_bound() || self.is_upper_bound()
    }

    pub fn is_inclusive(self) -> bool {
        matches!(self, QueryType::GreaterOrEqual | QueryType::LessOrEqual)
    }

    /// The same comparison with operands swapped (`5 > x` is `x < 5`).
    pub fn mirrored(self) -> Self {
        match self {
            QueryType::GreaterThan => QueryType::LessThan,
            QueryType::GreaterOrEqual => QueryType::LessOrEqual,
            QueryType::LessThan => QueryType::GreaterThan,
            QueryType::LessOrEqual => QueryType::GreaterOrEqual,
            other => other,
        }
    }

    /// The comparison matching exactly the values this one rejects.
    pub fn complement(self) -> Self {
        match self {
            QueryType::GreaterThan => QueryType::LessOrEqual,
            QueryType::GreaterOrEqual => QueryType::LessThan,
            QueryType::LessThan => QueryType::GreaterOrEqual,
            QueryType::LessOrEqual => QueryType::GreaterThan,
            other => other,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            QueryType::Default => "=",
            QueryType::Prefix => "^=",
            QueryType::Suffix => "$=",
            QueryType::Wildcard => "*=",
            QueryType::Fuzzy => "~=",
            QueryType::GreaterThan => ">",
            QueryType::GreaterOrEqual => ">=",
            QueryType::LessThan => "<",
            QueryType::LessOrEqual => "<=",
        }
    }
}

/// A single field-vs-pattern test.
///
/// `pattern` is never an IR node; it is evaluated to a literal at translation time.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: FieldReference,
    pub pattern: Box<Expr>,
    pub occur: Occur,
    pub query_type: QueryType,
    pub boost: f32,
    pub allow_special_characters: bool,
    /// Minimum similarity (or edit count) of a fuzzy predicate.
    pub similarity: Option<f32>,
}

impl Predicate {
    /// A MUST predicate inheriting the field's boost.
    pub fn new(field: FieldReference, query_type: QueryType, pattern: Expr) -> Self {
        let boost = field.boost;
        Predicate {
            field,
            pattern: Box::new(pattern),
            occur: Occur::Must,
            query_type,
            boost,
            allow_special_characters: false,
            similarity: None,
        }
    }

    pub fn with_occur(mut self, occur: Occur) -> Self {
        self.occur = occur;
        self
    }

    pub fn with_similarity(mut self, similarity: f32) -> Self {
        self.similarity = Some(similarity);
        self
    }

    /// Flip MUST and MUST_NOT, keeping everything else.
    pub fn negated(mut self) -> Self {
        self.occur = self.occur.negate();
        self
    }
}

/// A two-sided (or open) range over one field.
#[derive(Debug, Clone, PartialEq)]
pub struct RangePredicate {
    pub field: FieldReference,
    pub lower: Option<Box<Expr>>,
    /// `GreaterThan` or `GreaterOrEqual`.
    pub lower_type: QueryType,
    pub upper: Option<Box<Expr>>,
    /// `LessThan` or `LessOrEqual`.
    pub upper_type: QueryType,
    pub occur: Occur,
    pub boost: f32,
}

impl RangePredicate {
    pub fn include_lower(&self) -> bool {
        self.lower_type == QueryType::GreaterOrEqual
    }

    pub fn include_upper(&self) -> bool {
        self.upper_type == QueryType::LessOrEqual
    }

    pub fn negated(mut self) -> Self {
        self.occur = self.occur.negate();
        self
    }
}

fn occur_sign(occur: Occur) -> &'static str {
    match occur {
        Occur::Must => "+",
        Occur::MustNot => "-",
        Occur::Should => "",
        Occur::Filter => "#",
    }
}

impl fmt::Display for FieldReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)?;
        if self.boost != 1.0 {
            write!(f, "^{}", self.boost)?;
        }
        Ok(())
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} {} {}",
            occur_sign(self.occur),
            self.field.name,
            self.query_type.symbol(),
            self.pattern
        )?;
        if self.boost != 1.0 {
            write!(f, "^{}", self.boost)?;
        }
        Ok(())
    }
}

impl fmt::Display for RangePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.include_lower() { '[' } else { '(' };
        let close = if self.include_upper() { ']' } else { ')' };
        write!(f, "{}{} in {open}", occur_sign(self.occur), self.field.name)?;
        match &self.lower {
            Some(lower) => write!(f, "{lower}")?,
            None => f.write_str("*")?,
        }
        f.write_str(", ")?;
        match &self.upper {
            Some(upper) => write!(f, "{upper}")?,
            None => f.write_str("*")?,
        }
        write!(f, "{close}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_reference_identity_by_name() {
        let a = FieldReference::new("year", ScalarKind::Int64);
        let b = FieldReference::new("year", ScalarKind::Text).with_boost(3.0);
        assert_eq!(a, b);
        assert_ne!(a, FieldReference::new("title", ScalarKind::Int64));
    }

    #[test]
    fn test_query_type_algebra() {
        assert_eq!(QueryType::GreaterThan.mirrored(), QueryType::LessThan);
        assert_eq!(QueryType::LessOrEqual.mirrored(), QueryType::GreaterOrEqual);
        assert_eq!(QueryType::LessThan.complement(), QueryType::GreaterOrEqual);
        assert_eq!(QueryType::GreaterThan.complement(), QueryType::LessOrEqual);
        assert_eq!(QueryType::Prefix.mirrored(), QueryType::Prefix);
        assert!(QueryType::GreaterOrEqual.is_lower_bound());
        assert!(!QueryType::Fuzzy.is_comparison());
    }

    #[test]
    fn test_predicate_display() {
        let field = FieldReference::new("title", ScalarKind::Text);
        let predicate = Predicate::new(field, QueryType::Prefix, Expr::constant("ru"));
        assert_eq!(predicate.to_string(), "+title ^= \"ru\"");
        assert_eq!(predicate.negated().to_string(), "-title ^= \"ru\"");
    }
}
