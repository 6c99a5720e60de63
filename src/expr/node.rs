//! The expression tree handed over by the upstream query parser.
//!
//! Host-language nodes (constants, member access, calls, operators) and the IR
//! nodes produced by lowering share one enum so that every pass matches
//! exhaustively.

use std::fmt;
use std::sync::Arc;

use crate::data::DataValue;
use crate::error::Result;
use crate::expr::ir::{FieldReference, Predicate, RangePredicate, ScalarKind};

/// Lazily evaluated value closed over by a query, such as a local variable.
pub type ValueFn = Arc<dyn Fn() -> DataValue + Send + Sync>;

/// A closed-over external value.
#[derive(Clone)]
pub struct CapturedValue {
    name: String,
    value: ValueFn,
}

impl CapturedValue {
    pub fn new<F>(name: impl Into<String>, value: F) -> Self
    where
        F: Fn() -> DataValue + Send + Sync + 'static,
    {
        CapturedValue {
            name: name.into(),
            value: Arc::new(value),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the current value.
    pub fn get(&self) -> DataValue {
        (self.value)()
    }
}

impl PartialEq for CapturedValue {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for CapturedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedValue")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    AndAlso,
    OrElse,
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    BitAnd,
    BitOr,
    Coalesce,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::AndAlso => "&&",
            BinaryOp::OrElse => "||",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterOrEqual => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::Coalesce => "??",
        }
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::AndAlso | BinaryOp::OrElse)
    }

    /// `==`, `!=`, `<`, `<=`, `>`, `>=`.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::LessThan
                | BinaryOp::LessOrEqual
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterOrEqual
        )
    }

    /// The operator giving the same result with operands swapped.
    pub fn mirrored(self) -> Self {
        match self {
            BinaryOp::LessThan => BinaryOp::GreaterThan,
            BinaryOp::LessOrEqual => BinaryOp::GreaterOrEqual,
            BinaryOp::GreaterThan => BinaryOp::LessThan,
            BinaryOp::GreaterOrEqual => BinaryOp::LessOrEqual,
            other => other,
        }
    }
}

/// Methods the lowering passes recognize by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    StartsWith,
    EndsWith,
    Contains,
    /// `a.compare_to(b)`, a three-way comparison.
    CompareTo,
    /// `compare(a, b)`, the static three-way comparison.
    Compare,
    /// `a.similar_to(value[, similarity])`, a fuzzy match.
    SimilarTo,
    ToLowercase,
    ToUppercase,
    /// `source.get_field("name")`, indexed member access.
    GetField,
    Boost,
    AllowSpecialCharacters,
    Score,
    AnyField,
    Other(String),
}

impl Method {
    pub fn name(&self) -> &str {
        match self {
            Method::StartsWith => "starts_with",
            Method::EndsWith => "ends_with",
            Method::Contains => "contains",
            Method::CompareTo => "compare_to",
            Method::Compare => "compare",
            Method::SimilarTo => "similar_to",
            Method::ToLowercase => "to_lowercase",
            Method::ToUppercase => "to_uppercase",
            Method::GetField => "get_field",
            Method::Boost => "boost",
            Method::AllowSpecialCharacters => "allow_special_characters",
            Method::Score => "score",
            Method::AnyField => "any_field",
            Method::Other(name) => name,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A node of a predicate or ordering expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(DataValue),
    Captured(CapturedValue),
    /// The query source: the document under test.
    Source(String),
    Member {
        target: Box<Expr>,
        name: String,
        kind: ScalarKind,
    },
    Call {
        target: Option<Box<Expr>>,
        method: Method,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },
    Convert {
        operand: Box<Expr>,
        kind: ScalarKind,
    },
    Field(FieldReference),
    Predicate(Predicate),
    Range(RangePredicate),
    /// Order by relevance.
    Relevance,
    /// Match against every searchable field.
    AnyField,
    /// A boosted compound query.
    Boost {
        target: Box<Expr>,
        boost: f32,
    },
}

impl Expr {
    pub fn constant(value: impl Into<DataValue>) -> Self {
        Expr::Constant(value.into())
    }

    pub fn null() -> Self {
        Expr::Constant(DataValue::Null)
    }

    pub fn captured<F>(name: impl Into<String>, value: F) -> Self
    where
        F: Fn() -> DataValue + Send + Sync + 'static,
    {
        Expr::Captured(CapturedValue::new(name, value))
    }

    pub fn source(name: impl Into<String>) -> Self {
        Expr::Source(name.into())
    }

    pub fn field(name: impl Into<String>, kind: ScalarKind) -> Self {
        Expr::Field(FieldReference::new(name, kind))
    }

    pub fn member(self, name: impl Into<String>, kind: ScalarKind) -> Self {
        Expr::Member {
            target: Box::new(self),
            name: name.into(),
            kind,
        }
    }

    pub fn call(self, method: Method, args: Vec<Expr>) -> Self {
        Expr::Call {
            target: Some(Box::new(self)),
            method,
            args,
        }
    }

    pub fn static_call(method: Method, args: Vec<Expr>) -> Self {
        Expr::Call {
            target: None,
            method,
            args,
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn conditional(test: Expr, if_true: Expr, if_false: Expr) -> Self {
        Expr::Conditional {
            test: Box::new(test),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        }
    }

    pub fn equal(self, rhs: impl Into<Expr>) -> Self {
        Expr::binary(BinaryOp::Equal, self, rhs.into())
    }

    pub fn not_equal(self, rhs: impl Into<Expr>) -> Self {
        Expr::binary(BinaryOp::NotEqual, self, rhs.into())
    }

    pub fn less_than(self, rhs: impl Into<Expr>) -> Self {
        Expr::binary(BinaryOp::LessThan, self, rhs.into())
    }

    pub fn less_or_equal(self, rhs: impl Into<Expr>) -> Self {
        Expr::binary(BinaryOp::LessOrEqual, self, rhs.into())
    }

    pub fn greater_than(self, rhs: impl Into<Expr>) -> Self {
        Expr::binary(BinaryOp::GreaterThan, self, rhs.into())
    }

    pub fn greater_or_equal(self, rhs: impl Into<Expr>) -> Self {
        Expr::binary(BinaryOp::GreaterOrEqual, self, rhs.into())
    }

    pub fn and_also(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::AndAlso, self, rhs)
    }

    pub fn or_else(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::OrElse, self, rhs)
    }

    pub fn logical_not(self) -> Self {
        Expr::unary(UnaryOp::Not, self)
    }

    pub fn convert(self, kind: ScalarKind) -> Self {
        Expr::Convert {
            operand: Box::new(self),
            kind,
        }
    }

    pub fn starts_with(self, pattern: impl Into<Expr>) -> Self {
        self.call(Method::StartsWith, vec![pattern.into()])
    }

    pub fn ends_with(self, pattern: impl Into<Expr>) -> Self {
        self.call(Method::EndsWith, vec![pattern.into()])
    }

    pub fn contains_text(self, pattern: impl Into<Expr>) -> Self {
        self.call(Method::Contains, vec![pattern.into()])
    }

    pub fn compare_to(self, other: impl Into<Expr>) -> Self {
        self.call(Method::CompareTo, vec![other.into()])
    }

    pub fn similar_to(self, value: impl Into<Expr>, similarity: Option<f32>) -> Self {
        let mut args = vec![value.into()];
        if let Some(similarity) = similarity {
            args.push(Expr::constant(similarity as f64));
        }
        self.call(Method::SimilarTo, args)
    }

    pub fn to_lowercase(self) -> Self {
        self.call(Method::ToLowercase, Vec::new())
    }

    pub fn to_uppercase(self) -> Self {
        self.call(Method::ToUppercase, Vec::new())
    }

    pub fn get_field(self, name: impl Into<String>) -> Self {
        self.call(Method::GetField, vec![Expr::constant(name.into())])
    }

    pub fn boost(self, amount: impl Into<Expr>) -> Self {
        self.call(Method::Boost, vec![amount.into()])
    }

    pub fn allow_special_characters(self) -> Self {
        self.call(Method::AllowSpecialCharacters, Vec::new())
    }

    /// `source.score()`, the relevance marker.
    pub fn score(self) -> Self {
        self.call(Method::Score, Vec::new())
    }

    /// `source.any_field()`, the any-field marker.
    pub fn any_field(self) -> Self {
        self.call(Method::AnyField, Vec::new())
    }

    pub fn is_null_constant(&self) -> bool {
        matches!(self, Expr::Constant(DataValue::Null))
    }

    pub fn as_bool_constant(&self) -> Option<bool> {
        match self {
            Expr::Constant(DataValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// The field this node stands for, treating the any-field marker as a field.
    pub fn field_operand(&self) -> Option<FieldReference> {
        match self {
            Expr::Field(field) => Some(field.clone()),
            Expr::AnyField => Some(FieldReference::any_field()),
            _ => None,
        }
    }

    /// True for nodes that already are search predicates.
    pub fn is_query_node(&self) -> bool {
        matches!(self, Expr::Predicate(_) | Expr::Range(_) | Expr::Boost { .. })
    }

    /// Direct children, in evaluation order. Predicate patterns are not children.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Constant(_)
            | Expr::Captured(_)
            | Expr::Source(_)
            | Expr::Field(_)
            | Expr::Predicate(_)
            | Expr::Range(_)
            | Expr::Relevance
            | Expr::AnyField => Vec::new(),
            Expr::Member { target, .. } => vec![&**target],
            Expr::Call { target, args, .. } => target.iter().map(|t| &**t).chain(args).collect(),
            Expr::Unary { operand, .. } | Expr::Convert { operand, .. } => vec![&**operand],
            Expr::Binary { left, right, .. } => vec![&**left, &**right],
            Expr::Conditional {
                test,
                if_true,
                if_false,
            } => vec![&**test, &**if_true, &**if_false],
            Expr::Boost { target, .. } => vec![&**target],
        }
    }

    /// True if this node or any descendant satisfies `predicate`.
    pub fn contains(&self, predicate: &dyn Fn(&Expr) -> bool) -> bool {
        predicate(self) || self.children().into_iter().any(|c| c.contains(predicate))
    }

    /// True if the subtree touches the document under test.
    pub fn references_document(&self) -> bool {
        self.contains(&|e| {
            matches!(
                e,
                Expr::Source(_)
                    | Expr::Field(_)
                    | Expr::Predicate(_)
                    | Expr::Range(_)
                    | Expr::Relevance
                    | Expr::AnyField
                    | Expr::Boost { .. }
            )
        })
    }

    /// Rebuild this node with every direct child passed through `f`.
    pub fn try_map_children<F>(self, f: &mut F) -> Result<Expr>
    where
        F: FnMut(Expr) -> Result<Expr>,
    {
        Ok(match self {
            Expr::Member { target, name, kind } => Expr::Member {
                target: Box::new(f(*target)?),
                name,
                kind,
            },
            Expr::Call {
                target,
                method,
                args,
            } => Expr::Call {
                target: match target {
                    Some(target) => Some(Box::new(f(*target)?)),
                    None => None,
                },
                method,
                args: args.into_iter().map(&mut *f).collect::<Result<_>>()?,
            },
            Expr::Unary { op, operand } => Expr::Unary {
                op,
                operand: Box::new(f(*operand)?),
            },
            Expr::Binary { op, left, right } => Expr::Binary {
                op,
                left: Box::new(f(*left)?),
                right: Box::new(f(*right)?),
            },
            Expr::Conditional {
                test,
                if_true,
                if_false,
            } => Expr::Conditional {
                test: Box::new(f(*test)?),
                if_true: Box::new(f(*if_true)?),
                if_false: Box::new(f(*if_false)?),
            },
            Expr::Convert { operand, kind } => Expr::Convert {
                operand: Box::new(f(*operand)?),
                kind,
            },
            Expr::Boost { target, boost } => Expr::Boost {
                target: Box::new(f(*target)?),
                boost,
            },
            leaf => leaf,
        })
    }

    /// Post-order rewrite: children first, then `f` on the rebuilt node.
    pub fn transform_up<F>(self, f: &mut F) -> Result<Expr>
    where
        F: FnMut(Expr) -> Result<Expr>,
    {
        let rebuilt = self.try_map_children(&mut |child| child.transform_up(&mut *f))?;
        f(rebuilt)
    }
}

impl From<DataValue> for Expr {
    fn from(value: DataValue) -> Self {
        Expr::Constant(value)
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::constant(value)
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Expr::constant(value)
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::constant(value)
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Expr::constant(value)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::constant(value)
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Expr::constant(value)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Expr {
    fn from(value: chrono::DateTime<chrono::Utc>) -> Self {
        Expr::constant(value)
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{arg}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(value) => write!(f, "{value}"),
            Expr::Captured(captured) => write!(f, "${}", captured.name()),
            Expr::Source(name) => f.write_str(name),
            Expr::Member { target, name, .. } => write!(f, "{target}.{name}"),
            Expr::Call {
                target,
                method,
                args,
            } => {
                if let Some(target) = target {
                    write!(f, "{target}.")?;
                }
                write!(f, "{method}(")?;
                write_args(f, args)?;
                f.write_str(")")
            }
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not => write!(f, "!{operand}"),
                UnaryOp::Negate => write!(f, "-{operand}"),
            },
            Expr::Binary { op, left, right } => write!(f, "({left} {} {right})", op.symbol()),
            Expr::Conditional {
                test,
                if_true,
                if_false,
            } => write!(f, "({test} ? {if_true} : {if_false})"),
            Expr::Convert { operand, kind } => write!(f, "({kind}){operand}"),
            Expr::Field(field) => write!(f, "{field}"),
            Expr::Predicate(predicate) => write!(f, "pred({predicate})"),
            Expr::Range(range) => write!(f, "range({range})"),
            Expr::Relevance => f.write_str("score()"),
            Expr::AnyField => f.write_str("@*"),
            Expr::Boost { target, boost } => write!(f, "{target}^{boost}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let doc = Expr::source("doc");
        let expr = doc
            .clone()
            .member("title", ScalarKind::Text)
            .starts_with("ru")
            .and_also(doc.member("year", ScalarKind::Int64).greater_than(2000));
        assert_eq!(
            expr.to_string(),
            "(doc.title.starts_with(\"ru\") && (doc.year > 2000))"
        );
    }

    #[test]
    fn test_transform_up_visits_children_first() {
        let expr = Expr::constant(1).equal(Expr::constant(2));
        let mut order = Vec::new();
        let rebuilt = expr
            .transform_up(&mut |e| {
                order.push(e.to_string());
                Ok(e)
            })
            .unwrap();
        assert_eq!(order, vec!["1", "2", "(1 == 2)"]);
        assert_eq!(rebuilt, Expr::constant(1).equal(Expr::constant(2)));
    }

    #[test]
    fn test_references_document() {
        let captured = Expr::captured("x", || DataValue::Int64(3));
        assert!(!captured.references_document());
        assert!(
            Expr::source("doc")
                .member("a", ScalarKind::Text)
                .references_document()
        );
    }

    #[test]
    fn test_captured_equality_is_identity() {
        let a = CapturedValue::new("x", || DataValue::Int64(1));
        let b = CapturedValue::new("x", || DataValue::Int64(1));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
