//! Pattern-matching calls on a field become predicates.
//!
//! Three-way comparisons are matched against zero first:
//! `a.compare_to(b) > 0` is `a > b`, `0 > compare(a, b)` is `a < b`. The
//! resulting comparison is handed to relational lowering, which puts the field
//! on the left.

use crate::data::DataValue;
use crate::error::{LexiqError, Result};
use crate::expr::{
    BinaryOp, Expr, FieldReference, Method, Predicate, QueryType, evaluate, is_evaluable,
};
use crate::lowering::{PassContext, Role, boost, rewrite_nodes};

pub(crate) fn apply(expr: Expr, _ctx: &PassContext) -> Result<Expr> {
    rewrite_nodes(expr, rewrite)
}

fn rewrite(node: Expr) -> Result<Expr> {
    match node {
        Expr::Call {
            target: Some(target),
            method,
            args,
        } if target.field_operand().is_some() => {
            match (pattern_query_type(&method), target.field_operand()) {
                (Some(query_type), Some(field)) => {
                    pattern_predicate(field, query_type, args, &method)
                }
                _ => Ok(Expr::Call {
                    target: Some(target),
                    method,
                    args,
                }),
            }
        }
        Expr::Binary { op, left, right } if op.is_comparison() => {
            Ok(compare_against_zero(op, *left, *right))
        }
        other => Ok(other),
    }
}

fn pattern_query_type(method: &Method) -> Option<QueryType> {
    match method {
        Method::StartsWith => Some(QueryType::Prefix),
        Method::EndsWith => Some(QueryType::Suffix),
        Method::Contains => Some(QueryType::Wildcard),
        Method::SimilarTo => Some(QueryType::Fuzzy),
        _ => None,
    }
}

fn pattern_predicate(
    field: FieldReference,
    query_type: QueryType,
    mut args: Vec<Expr>,
    method: &Method,
) -> Result<Expr> {
    let similarity = match (query_type, args.len()) {
        (QueryType::Fuzzy, 2) => args.pop().map(|arg| similarity_of(&arg)).transpose()?,
        (_, 1) => None,
        (_, n) => {
            return Err(LexiqError::invalid_argument(format!(
                "{method} takes {} argument(s), got {n}",
                if query_type == QueryType::Fuzzy { "1 or 2" } else { "1" }
            )));
        }
    };
    let Some(pattern) = args.pop() else {
        return Err(LexiqError::invalid_argument(format!("{method} needs a pattern")));
    };
    if !is_evaluable(&pattern) {
        if !pattern.references_document() {
            // An annotated value: report it the way the annotation pass does.
            boost::apply_to_queries(pattern.clone(), &PassContext { role: Role::Predicate })?;
        }
        return Err(LexiqError::unsupported_expression(format!(
            "{method}({pattern}) with a document-dependent pattern"
        )));
    }

    let mut predicate = Predicate::new(field, query_type, pattern);
    predicate.similarity = similarity;
    Ok(Expr::Predicate(predicate))
}

fn similarity_of(arg: &Expr) -> Result<f32> {
    let value = evaluate(arg)?;
    value.as_float().map(|f| f as f32).ok_or_else(|| {
        LexiqError::invalid_argument(format!("similarity must be numeric, got {value}"))
    })
}

fn is_zero(expr: &Expr) -> bool {
    match expr {
        Expr::Constant(DataValue::Int64(0)) => true,
        Expr::Constant(DataValue::Float64(f)) => *f == 0.0,
        _ => false,
    }
}

/// The operands of a three-way comparison call.
fn three_way_operands(expr: Expr) -> std::result::Result<(Expr, Expr), Expr> {
    match expr {
        Expr::Call {
            target: Some(target),
            method: Method::CompareTo,
            mut args,
        } if args.len() == 1 => {
            let other = args.remove(0);
            Ok((*target, other))
        }
        Expr::Call {
            target: None,
            method: Method::Compare,
            mut args,
        } if args.len() == 2 => {
            let right = args.remove(1);
            let left = args.remove(0);
            Ok((left, right))
        }
        other => Err(other),
    }
}

fn compare_against_zero(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    if is_zero(&right) {
        match three_way_operands(left) {
            Ok((a, b)) => Expr::binary(op, a, b),
            Err(left) => Expr::binary(op, left, right),
        }
    } else if is_zero(&left) {
        match three_way_operands(right) {
            Ok((a, b)) => Expr::binary(op.mirrored(), a, b),
            Err(right) => Expr::binary(op, left, right),
        }
    } else {
        Expr::binary(op, left, right)
    }
}
