//! Bare boolean fields used as truth values become `field == true`.
//!
//! Only positions read as a truth value are rewritten: the clause root, the
//! operands of logical operators, a negation's operand and a conditional's
//! test. `!flag` becomes `flag == false`; double negation cancels. Explicit
//! equality tests are left alone.

use crate::error::Result;
use crate::expr::{BinaryOp, Expr, Method, ScalarKind, UnaryOp};
use crate::lowering::{PassContext, Role};

pub(crate) fn apply(expr: Expr, ctx: &PassContext) -> Result<Expr> {
    if ctx.role != Role::Predicate {
        return Ok(expr);
    }
    lift(expr, true)
}

fn is_flag(expr: &Expr) -> bool {
    matches!(expr, Expr::Field(field) if field.kind == ScalarKind::Bool)
}

fn lift(expr: Expr, truth: bool) -> Result<Expr> {
    match expr {
        flag if truth && is_flag(&flag) => Ok(flag.equal(true)),
        Expr::Unary {
            op: UnaryOp::Not,
            operand,
        } if truth => match *operand {
            flag if is_flag(&flag) => Ok(flag.equal(false)),
            Expr::Unary {
                op: UnaryOp::Not,
                operand: inner,
            } => lift(*inner, true),
            operand => Ok(Expr::unary(UnaryOp::Not, lift(operand, true)?)),
        },
        Expr::Binary {
            op: op @ (BinaryOp::AndAlso | BinaryOp::OrElse | BinaryOp::BitAnd | BinaryOp::BitOr),
            left,
            right,
        } if truth || is_logical(&left) || is_logical(&right) => Ok(Expr::binary(
            op,
            lift(*left, true)?,
            lift(*right, true)?,
        )),
        Expr::Conditional {
            test,
            if_true,
            if_false,
        } => Ok(Expr::conditional(
            lift(*test, true)?,
            lift(*if_true, truth)?,
            lift(*if_false, truth)?,
        )),
        // Annotations keep the truth context of their target.
        Expr::Call {
            target: Some(target),
            method: method @ (Method::Boost | Method::AllowSpecialCharacters),
            args,
        } => Ok(Expr::Call {
            target: Some(Box::new(lift(*target, truth)?)),
            method,
            args,
        }),
        other => other.try_map_children(&mut |child| lift(child, false)),
    }
}

/// Logical operators over comparisons read their operands as truth values.
fn is_logical(expr: &Expr) -> bool {
    match expr {
        Expr::Binary { op, .. } => op.is_comparison() || op.is_logical(),
        Expr::Unary {
            op: UnaryOp::Not, ..
        } => true,
        other => other.is_query_node(),
    }
}
