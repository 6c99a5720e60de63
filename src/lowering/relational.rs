//! Field comparisons become predicates.

use crate::error::{LexiqError, Result};
use crate::expr::{BinaryOp, Expr, Predicate, QueryType, is_evaluable};
use crate::lexical::query::boolean::Occur;
use crate::lowering::{PassContext, rewrite_nodes};

pub(crate) fn apply(expr: Expr, _ctx: &PassContext) -> Result<Expr> {
    rewrite_nodes(expr, rewrite)
}

fn query_type(op: BinaryOp) -> Option<(QueryType, Occur)> {
    match op {
        BinaryOp::Equal => Some((QueryType::Default, Occur::Must)),
        BinaryOp::NotEqual => Some((QueryType::Default, Occur::MustNot)),
        BinaryOp::LessThan => Some((QueryType::LessThan, Occur::Must)),
        BinaryOp::LessOrEqual => Some((QueryType::LessOrEqual, Occur::Must)),
        BinaryOp::GreaterThan => Some((QueryType::GreaterThan, Occur::Must)),
        BinaryOp::GreaterOrEqual => Some((QueryType::GreaterOrEqual, Occur::Must)),
        _ => None,
    }
}

fn rewrite(node: Expr) -> Result<Expr> {
    let Expr::Binary { op, left, right } = node else {
        return Ok(node);
    };

    if let Some((query_type, occur)) = query_type(op) {
        if let Some(field) = left.field_operand()
            && is_evaluable(&right)
        {
            let predicate = Predicate::new(field, query_type, *right).with_occur(occur);
            return Ok(Expr::Predicate(predicate));
        }
        if let Some(field) = right.field_operand()
            && is_evaluable(&left)
        {
            // `5 > field` is `field < 5`.
            let predicate =
                Predicate::new(field, query_type.mirrored(), *left).with_occur(occur);
            return Ok(Expr::Predicate(predicate));
        }
        return Ok(Expr::Binary { op, left, right });
    }

    match op {
        BinaryOp::AndAlso | BinaryOp::OrElse => Ok(Expr::Binary { op, left, right }),
        // Non-short-circuit logic over queries is still logic.
        BinaryOp::BitAnd | BinaryOp::BitOr if left.is_query_node() && right.is_query_node() => {
            let logical = if op == BinaryOp::BitAnd {
                BinaryOp::AndAlso
            } else {
                BinaryOp::OrElse
            };
            Ok(Expr::Binary {
                op: logical,
                left,
                right,
            })
        }
        _ if touches_field(&left) || touches_field(&right) => {
            Err(LexiqError::unsupported_operator(op.symbol()))
        }
        _ => Ok(Expr::Binary { op, left, right }),
    }
}

fn touches_field(expr: &Expr) -> bool {
    expr.contains(&|e| e.field_operand().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ScalarKind;
    use crate::lowering::Role;

    const CTX: PassContext = PassContext {
        role: Role::Predicate,
    };

    fn year() -> Expr {
        Expr::field("year", ScalarKind::Int64)
    }

    fn predicate_of(expr: Expr) -> Predicate {
        match apply(expr, &CTX).unwrap() {
            Expr::Predicate(predicate) => predicate,
            other => panic!("expected predicate, got {other}"),
        }
    }

    #[test]
    fn test_equality_and_inequality() {
        let eq = predicate_of(year().equal(2000));
        assert_eq!((eq.query_type, eq.occur), (QueryType::Default, Occur::Must));

        let ne = predicate_of(year().not_equal(2000));
        assert_eq!((ne.query_type, ne.occur), (QueryType::Default, Occur::MustNot));
    }

    #[test]
    fn test_constant_on_left_flips_direction() {
        let predicate = predicate_of(Expr::constant(5).greater_than(year()));
        assert_eq!(predicate.query_type, QueryType::LessThan);
        assert_eq!(*predicate.pattern, Expr::constant(5));

        let predicate = predicate_of(Expr::constant(5).less_or_equal(year()));
        assert_eq!(predicate.query_type, QueryType::GreaterOrEqual);
    }

    #[test]
    fn test_arithmetic_on_field_is_unsupported() {
        let expr = Expr::binary(BinaryOp::Add, year(), Expr::constant(1)).greater_than(2000);
        let err = apply(expr, &CTX).unwrap_err();
        assert!(matches!(
            err,
            LexiqError::UnsupportedOperator { ref operator } if operator == "+"
        ));
    }

    #[test]
    fn test_field_against_field_is_left_alone() {
        let expr = year().equal(Expr::field("other", ScalarKind::Int64));
        assert_eq!(apply(expr.clone(), &CTX).unwrap(), expr);
    }

    #[test]
    fn test_closed_arithmetic_is_left_for_evaluation() {
        let pattern = Expr::binary(BinaryOp::Add, Expr::constant(1), Expr::constant(2));
        let predicate = predicate_of(year().equal(pattern.clone()));
        assert_eq!(*predicate.pattern, pattern);
    }
}
