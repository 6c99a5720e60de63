//! Boost attachment.
//!
//! A boost on a field reference is stored on the field and inherited by the
//! predicate built from it. A boost on a predicate, range or boolean compound is
//! attached once that query node exists. Any other target is rejected.

use crate::error::{LexiqError, Result};
use crate::expr::{BinaryOp, Expr, Method, UnaryOp, evaluate};
use crate::lowering::{PassContext, rewrite_nodes};

/// Field stage: `field.boost(n)` sets the field's boost.
pub(crate) fn apply_to_fields(expr: Expr, _ctx: &PassContext) -> Result<Expr> {
    rewrite_nodes(expr, |node| match node {
        Expr::Call {
            target: Some(target),
            method: Method::Boost,
            args,
        } if target.field_operand().is_some() => {
            let amount = boost_amount(&args)?;
            match target.field_operand() {
                Some(field) => Ok(Expr::Field(field.with_boost(amount))),
                None => Err(LexiqError::internal("boost target lost its field")),
            }
        }
        other => Ok(other),
    })
}

/// Query stage: boosts and special-character flags on built query nodes.
pub(crate) fn apply_to_queries(expr: Expr, _ctx: &PassContext) -> Result<Expr> {
    rewrite_nodes(expr, |node| match node {
        Expr::Call {
            target: Some(target),
            method: Method::Boost,
            args,
        } => attach(*target, boost_amount(&args)?),
        Expr::Call {
            target: Some(target),
            method: Method::AllowSpecialCharacters,
            args,
        } if args.is_empty() => allow_special_characters(*target),
        other => Ok(other),
    })
}

fn boost_amount(args: &[Expr]) -> Result<f32> {
    let [amount] = args else {
        return Err(LexiqError::invalid_argument(format!(
            "boost takes one argument, got {}",
            args.len()
        )));
    };
    let value = evaluate(amount)?;
    value.as_float().map(|f| f as f32).ok_or_else(|| {
        LexiqError::invalid_argument(format!("boost must be numeric, got {value}"))
    })
}

fn attach(target: Expr, amount: f32) -> Result<Expr> {
    match target {
        Expr::Predicate(mut predicate) => {
            predicate.boost = amount;
            Ok(Expr::Predicate(predicate))
        }
        Expr::Range(mut range) => {
            range.boost = amount;
            Ok(Expr::Range(range))
        }
        Expr::Boost { target, boost } => Ok(Expr::Boost {
            target,
            boost: boost * amount,
        }),
        compound if is_query_compound(&compound) => Ok(Expr::Boost {
            target: Box::new(compound),
            boost: amount,
        }),
        other => Err(LexiqError::boost_target(other)),
    }
}

/// A boolean combination with at least one query node inside.
fn is_query_compound(expr: &Expr) -> bool {
    let combinator = matches!(
        expr,
        Expr::Binary {
            op: BinaryOp::AndAlso | BinaryOp::OrElse,
            ..
        } | Expr::Unary {
            op: UnaryOp::Not,
            ..
        }
    );
    combinator && expr.contains(&Expr::is_query_node)
}

fn allow_special_characters(target: Expr) -> Result<Expr> {
    match target {
        Expr::Predicate(mut predicate) => {
            predicate.allow_special_characters = true;
            Ok(Expr::Predicate(predicate))
        }
        compound if is_query_compound(&compound) || matches!(compound, Expr::Boost { .. }) => {
            rewrite_nodes(compound, |node| match node {
                Expr::Predicate(mut predicate) => {
                    predicate.allow_special_characters = true;
                    Ok(Expr::Predicate(predicate))
                }
                other => Ok(other),
            })
        }
        other => Err(LexiqError::unsupported_expression(format!(
            "{other}.allow_special_characters()"
        ))),
    }
}
