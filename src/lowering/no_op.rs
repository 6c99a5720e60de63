//! Removes calls and wrappers that do not change what a query matches.
//!
//! Case sensitivity is a property of the field's analysis, so case folding on a
//! field is dropped. Conversions on a field only retype the reference.

use crate::error::Result;
use crate::expr::{BinaryOp, Expr, Method, ScalarKind};
use crate::lowering::{PassContext, rewrite_nodes};

pub(crate) fn apply(expr: Expr, _ctx: &PassContext) -> Result<Expr> {
    rewrite_nodes(expr, |node| Ok(rewrite(node)))
}

fn rewrite(node: Expr) -> Expr {
    match node {
        Expr::Call {
            target: Some(target),
            method: Method::ToLowercase | Method::ToUppercase,
            args,
        } if args.is_empty() && target.field_operand().is_some() => *target,
        Expr::Convert { operand, kind } => match *operand {
            Expr::Field(mut field) => {
                if kind != ScalarKind::Other {
                    field.kind = kind;
                }
                Expr::Field(field)
            }
            Expr::AnyField => Expr::AnyField,
            operand => Expr::Convert {
                operand: Box::new(operand),
                kind,
            },
        },
        Expr::Binary { op, left, right } => collapse(op, *left, *right),
        other => other,
    }
}

/// `true && x`, `x && true`, `false || x` and `x || false` become `x`.
fn collapse(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let neutral = match op {
        BinaryOp::AndAlso => true,
        BinaryOp::OrElse => false,
        _ => return Expr::binary(op, left, right),
    };
    if left.as_bool_constant() == Some(neutral) {
        right
    } else if right.as_bool_constant() == Some(neutral) {
        left
    } else {
        Expr::binary(op, left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lowering::Role;

    const CTX: PassContext = PassContext {
        role: Role::Predicate,
    };

    #[test]
    fn test_case_folding_on_field_is_removed() {
        let field = Expr::field("title", ScalarKind::Text);
        assert_eq!(apply(field.clone().to_lowercase(), &CTX).unwrap(), field);
        assert_eq!(apply(field.clone().to_uppercase(), &CTX).unwrap(), field);

        let constant = Expr::constant("A").to_lowercase();
        assert_eq!(apply(constant.clone(), &CTX).unwrap(), constant);
    }

    #[test]
    fn test_partial_evaluation_wrappers_collapse_recursively() {
        let field = Expr::field("flag", ScalarKind::Bool);
        let expr = Expr::constant(true)
            .and_also(Expr::constant(false).or_else(field.clone()))
            .and_also(Expr::constant(true));
        assert_eq!(apply(expr, &CTX).unwrap(), field);
    }

    #[test]
    fn test_convert_retypes_field() {
        let expr = Expr::field("year", ScalarKind::Text).convert(ScalarKind::Int64);
        let Expr::Field(field) = apply(expr, &CTX).unwrap() else {
            panic!("expected field");
        };
        assert_eq!(field.kind, ScalarKind::Int64);
    }
}
