//! Merges paired bounds on one field into a range predicate.
//!
//! `f >= a && f < b` becomes `f in [a, b)`. The gap form `f < a || f > b`
//! becomes the excluded range `NOT f in [a, b]`: both bounds flip to their
//! complement and the polarity flips. Only a direct pair of MUST predicates is
//! merged; anything else is left as is.

use crate::error::Result;
use crate::expr::{BinaryOp, Expr, Predicate, QueryType, RangePredicate};
use crate::lexical::query::boolean::Occur;
use crate::lowering::{PassContext, rewrite_nodes};

pub(crate) fn apply(expr: Expr, _ctx: &PassContext) -> Result<Expr> {
    rewrite_nodes(expr, |node| Ok(rewrite(node)))
}

fn rewrite(node: Expr) -> Expr {
    let Expr::Binary { op, left, right } = node else {
        return node;
    };
    let merged = match (op, &*left, &*right) {
        (BinaryOp::AndAlso, Expr::Predicate(a), Expr::Predicate(b)) => conjunction(a, b),
        (BinaryOp::OrElse, Expr::Predicate(a), Expr::Predicate(b)) => gap(a, b),
        _ => None,
    };
    match merged {
        Some(range) => Expr::Range(range),
        None => Expr::Binary { op, left, right },
    }
}

fn mergeable(a: &Predicate, b: &Predicate) -> bool {
    a.field == b.field && a.occur == Occur::Must && b.occur == Occur::Must
}

/// `lower && upper` in either order.
fn conjunction(a: &Predicate, b: &Predicate) -> Option<RangePredicate> {
    if !mergeable(a, b) {
        return None;
    }
    let (lower, upper) = if a.query_type.is_lower_bound() && b.query_type.is_upper_bound() {
        (a, b)
    } else if b.query_type.is_lower_bound() && a.query_type.is_upper_bound() {
        (b, a)
    } else {
        return None;
    };
    Some(RangePredicate {
        field: lower.field.clone(),
        lower: Some(lower.pattern.clone()),
        lower_type: lower.query_type,
        upper: Some(upper.pattern.clone()),
        upper_type: upper.query_type,
        occur: Occur::Must,
        boost: lower.boost * upper.boost,
    })
}

/// `f < x || f > y` in either order.
fn gap(a: &Predicate, b: &Predicate) -> Option<RangePredicate> {
    if !mergeable(a, b) {
        return None;
    }
    let (below, above) = match (a.query_type, b.query_type) {
        (QueryType::LessThan, QueryType::GreaterThan) => (a, b),
        (QueryType::GreaterThan, QueryType::LessThan) => (b, a),
        _ => return None,
    };
    Some(RangePredicate {
        field: below.field.clone(),
        lower: Some(below.pattern.clone()),
        lower_type: below.query_type.complement(),
        upper: Some(above.pattern.clone()),
        upper_type: above.query_type.complement(),
        occur: Occur::MustNot,
        boost: below.boost * above.boost,
    })
}
