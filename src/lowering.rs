//! Lowering pipeline: rewrites host expression trees into IR.
//!
//! Each pass is a pure `fn(Expr, &PassContext) -> Result<Expr>`. The pipeline
//! runs every pass in a fixed order and repeats the whole sequence until the
//! tree stops changing, so a rewrite that enables an earlier pass is picked up
//! on the next round.
//!
//! # Module Structure
//!
//! - `source_property`: member access on the query source becomes a field reference
//! - `markers`: `score()` and `any_field()` on the source become marker nodes
//! - `no_op`: case folding on fields and `true && x`/`false || x` are removed
//! - `null_guard`: `x != null ? e : null` collapses to `e`
//! - `boost`: boost calls on fields and on built predicates
//! - `method_call`: starts_with/ends_with/contains/similar_to/compare_to become predicates
//! - `boolean_flag`: bare boolean fields become `field == true`
//! - `relational`: field comparisons become predicates
//! - `boolean_result`: `pred == false` and `!pred` flip polarity
//! - `range_merge`: paired bounds on one field become a range predicate

mod boolean_flag;
mod boolean_result;
mod boost;
mod markers;
mod method_call;
mod no_op;
mod null_guard;
mod range_merge;
mod relational;
mod source_property;

use log::{trace, warn};

use crate::config::CompilerConfig;
use crate::error::{LexiqError, Result};
use crate::expr::Expr;

/// Where the expression being lowered is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A where or filter clause: the root is a truth value.
    Predicate,
    /// An order-by key.
    Ordering,
}

/// Read-only state shared by every pass.
#[derive(Debug, Clone, Copy)]
pub struct PassContext {
    pub role: Role,
}

pub type PassFn = fn(Expr, &PassContext) -> Result<Expr>;

/// A named rewrite.
#[derive(Clone, Copy)]
pub struct Pass {
    pub name: &'static str,
    pub apply: PassFn,
}

/// The passes in dependency order.
pub const PIPELINE: &[Pass] = &[
    Pass {
        name: "source_property",
        apply: source_property::apply,
    },
    Pass {
        name: "markers",
        apply: markers::apply,
    },
    Pass {
        name: "no_op",
        apply: no_op::apply,
    },
    Pass {
        name: "null_guard",
        apply: null_guard::apply,
    },
    Pass {
        name: "boost_field",
        apply: boost::apply_to_fields,
    },
    Pass {
        name: "method_call",
        apply: method_call::apply,
    },
    Pass {
        name: "boolean_flag",
        apply: boolean_flag::apply,
    },
    Pass {
        name: "relational",
        apply: relational::apply,
    },
    Pass {
        name: "boolean_result",
        apply: boolean_result::apply,
    },
    Pass {
        name: "boost_query",
        apply: boost::apply_to_queries,
    },
    Pass {
        name: "range_merge",
        apply: range_merge::apply,
    },
];

/// Lower a where/filter expression.
pub fn lower_predicate(expr: Expr, config: &CompilerConfig) -> Result<Expr> {
    lower(expr, Role::Predicate, config)
}

/// Lower an order-by key.
pub fn lower_ordering(expr: Expr, config: &CompilerConfig) -> Result<Expr> {
    lower(expr, Role::Ordering, config)
}

/// Run the pipeline to a fixed point.
pub fn lower(expr: Expr, role: Role, config: &CompilerConfig) -> Result<Expr> {
    let ctx = PassContext { role };
    let mut current = expr;

    for round in 0..config.max_lowering_rounds {
        let before = current.clone();
        for pass in PIPELINE {
            current = (pass.apply)(current, &ctx)?;
            trace!("round {round} {}: {current}", pass.name);
        }
        if current == before {
            return Ok(current);
        }
    }

    warn!(
        "lowering did not converge after {} rounds: {current}",
        config.max_lowering_rounds
    );
    Err(LexiqError::internal(format!(
        "lowering did not converge after {} rounds",
        config.max_lowering_rounds
    )))
}

/// Post-order rewrite of every node with `rewrite`.
pub(crate) fn rewrite_nodes<F>(expr: Expr, mut rewrite: F) -> Result<Expr>
where
    F: FnMut(Expr) -> Result<Expr>,
{
    expr.transform_up(&mut rewrite)
}
