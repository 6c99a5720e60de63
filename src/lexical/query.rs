//! Native search-engine query objects produced by translation.
//!
//! These are the boolean trees of term/range/prefix/wildcard/fuzzy queries
//! handed to a [`Searcher`](crate::lexical::search::searcher::Searcher). The
//! engine that executes them lives outside this crate; the objects only carry
//! what it needs to know.

pub mod boolean;
pub mod fuzzy;
pub mod match_all;
pub mod prefix;
pub mod range;
pub mod term;
pub mod wildcard;

use std::any::Any;
use std::fmt::Debug;

/// A node of a native query tree.
pub trait Query: Send + Sync + Debug {
    /// Score multiplier; 1.0 is neutral.
    fn boost(&self) -> f32;

    fn set_boost(&mut self, boost: f32);

    /// Query-syntax rendering, e.g. `(+title:rust -year:[* TO 2000})`.
    fn description(&self) -> String;

    fn clone_box(&self) -> Box<dyn Query>;

    fn as_any(&self) -> &dyn Any;

    /// Field the query targets; `None` for compound queries.
    fn field(&self) -> Option<&str> {
        None
    }
}

impl Clone for Box<dyn Query> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Append the `^boost` suffix used by every description when the boost is not neutral.
pub(crate) fn with_boost_suffix(description: String, boost: f32) -> String {
    if boost == 1.0 {
        description
    } else {
        format!("{description}^{boost}")
    }
}
