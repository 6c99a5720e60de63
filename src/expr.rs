//! Query expressions: the host tree and the IR nodes lowering produces.
//!
//! # Module Structure
//!
//! - `node`: the [`Expr`] sum type, operators, methods and tree traversal
//! - `ir`: field references, predicates and range predicates
//! - `eval`: evaluation of closed sub-expressions to [`DataValue`](crate::data::DataValue)

pub mod eval;
pub mod ir;
pub mod node;

pub use eval::{evaluate, is_evaluable};
pub use ir::{FieldReference, Predicate, QueryType, RangePredicate, ScalarKind};
pub use node::{BinaryOp, CapturedValue, Expr, Method, UnaryOp};
