//! `score()` and `any_field()` on the query source become marker nodes.

use crate::error::Result;
use crate::expr::{Expr, Method};
use crate::lowering::{PassContext, rewrite_nodes};

pub(crate) fn apply(expr: Expr, _ctx: &PassContext) -> Result<Expr> {
    rewrite_nodes(expr, |node| Ok(rewrite(node)))
}

fn marker(method: &Method) -> Option<Expr> {
    match method {
        Method::Score => Some(Expr::Relevance),
        Method::AnyField => Some(Expr::AnyField),
        _ => None,
    }
}

fn rewrite(node: Expr) -> Expr {
    match &node {
        // source.score()
        Expr::Call {
            target: Some(target),
            method,
            args,
        } if args.is_empty() && matches!(**target, Expr::Source(_)) => {
            marker(method).unwrap_or(node)
        }
        // score(source)
        Expr::Call {
            target: None,
            method,
            args,
        } if args.len() == 1 && matches!(args[0], Expr::Source(_)) => {
            marker(method).unwrap_or(node)
        }
        _ => node,
    }
}
