//! Member access on the query source becomes a field reference.

use crate::data::DataValue;
use crate::error::{LexiqError, Result};
use crate::expr::{Expr, FieldReference, Method, ScalarKind, evaluate};
use crate::lowering::{PassContext, rewrite_nodes};

pub(crate) fn apply(expr: Expr, _ctx: &PassContext) -> Result<Expr> {
    rewrite_nodes(expr, rewrite)
}

fn rewrite(node: Expr) -> Result<Expr> {
    match node {
        Expr::Member { target, name, kind } => match *target {
            Expr::Source(_) => Ok(Expr::field(name, kind)),
            // Nested members address a dotted path.
            Expr::Field(parent) => Ok(Expr::Field(FieldReference::new(
                format!("{}.{name}", parent.name),
                kind,
            ))),
            target => Ok(Expr::Member {
                target: Box::new(target),
                name,
                kind,
            }),
        },
        Expr::Call {
            target: Some(target),
            method: Method::GetField,
            args,
        } if matches!(*target, Expr::Source(_)) => {
            let [name] = args.as_slice() else {
                return Err(LexiqError::invalid_argument(format!(
                    "get_field takes one argument, got {}",
                    args.len()
                )));
            };
            match evaluate(name)? {
                DataValue::Text(name) => Ok(Expr::field(name, ScalarKind::Text)),
                other => Err(LexiqError::invalid_argument(format!(
                    "get_field expects a field name, got {other}"
                ))),
            }
        }
        other => Ok(other),
    }
}
