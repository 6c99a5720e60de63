//! `pred == false`, `pred != true` and `!pred` flip the predicate's polarity.

use crate::error::Result;
use crate::expr::{BinaryOp, Expr, UnaryOp};
use crate::lowering::{PassContext, rewrite_nodes};

pub(crate) fn apply(expr: Expr, _ctx: &PassContext) -> Result<Expr> {
    rewrite_nodes(expr, |node| Ok(rewrite(node)))
}

fn negate(expr: Expr) -> Expr {
    match expr {
        Expr::Predicate(predicate) => Expr::Predicate(predicate.negated()),
        Expr::Range(range) => Expr::Range(range.negated()),
        other => other,
    }
}

fn is_single_query(expr: &Expr) -> bool {
    matches!(expr, Expr::Predicate(_) | Expr::Range(_))
}

fn rewrite(node: Expr) -> Expr {
    match node {
        Expr::Unary {
            op: UnaryOp::Not,
            operand,
        } if is_single_query(&operand) => negate(*operand),
        Expr::Binary {
            op: op @ (BinaryOp::Equal | BinaryOp::NotEqual),
            left,
            right,
        } => {
            let left_is_query = is_single_query(&left);
            let literal = if left_is_query {
                right.as_bool_constant()
            } else if is_single_query(&right) {
                left.as_bool_constant()
            } else {
                None
            };
            let Some(value) = literal else {
                return Expr::Binary { op, left, right };
            };
            let query = if left_is_query { *left } else { *right };
            // Equal to true or not equal to false keeps the polarity.
            if value == (op == BinaryOp::Equal) {
                query
            } else {
                negate(query)
            }
        }
        other => other,
    }
}
