//! The query model handed to the translator.
//!
//! A model is a source (an index or a nested model), body clauses in source
//! order, and result-shaping operators applied after the body.

use std::fmt;
use std::sync::Arc;

use crate::expr::Expr;
use crate::lexical::search::searcher::SortOrder;

/// Per-object score multiplier.
pub type BoostFn<T> = Arc<dyn Fn(&T) -> f32 + Send + Sync>;

/// Where a query model reads from.
pub enum QuerySource<T> {
    /// The documents of the named index.
    Index(String),
    /// The output of a nested query.
    SubQuery(Box<QueryModel<T>>),
}

/// One ordering key.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderClause {
    pub expr: Expr,
    pub direction: SortOrder,
}

impl OrderClause {
    pub fn new(expr: Expr, direction: SortOrder) -> Self {
        OrderClause { expr, direction }
    }
}

/// A clause of the query body.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyClause {
    /// Scoring restriction.
    Where(Expr),
    /// Non-scoring restriction.
    Filter(Expr),
    /// Ordering keys, most significant first.
    OrderBy(Vec<OrderClause>),
}

/// An operator shaping the result sequence.
pub enum ResultOperator<T> {
    Skip(usize),
    Take(usize),
    Last,
    First,
    Single,
    Count,
    Any,
    /// Multiply each hit's score by a function of the mapped object.
    Boost(BoostFn<T>),
    /// Anything else, passed through to the caller.
    Other(String),
}

impl<T> ResultOperator<T> {
    pub fn boost<F>(f: F) -> Self
    where
        F: Fn(&T) -> f32 + Send + Sync + 'static,
    {
        ResultOperator::Boost(Arc::new(f))
    }

    pub fn name(&self) -> &str {
        match self {
            ResultOperator::Skip(_) => "skip",
            ResultOperator::Take(_) => "take",
            ResultOperator::Last => "last",
            ResultOperator::First => "first",
            ResultOperator::Single => "single",
            ResultOperator::Count => "count",
            ResultOperator::Any => "any",
            ResultOperator::Boost(_) => "boost",
            ResultOperator::Other(name) => name,
        }
    }
}

impl<T> Clone for ResultOperator<T> {
    fn clone(&self) -> Self {
        match self {
            ResultOperator::Skip(n) => ResultOperator::Skip(*n),
            ResultOperator::Take(n) => ResultOperator::Take(*n),
            ResultOperator::Last => ResultOperator::Last,
            ResultOperator::First => ResultOperator::First,
            ResultOperator::Single => ResultOperator::Single,
            ResultOperator::Count => ResultOperator::Count,
            ResultOperator::Any => ResultOperator::Any,
            ResultOperator::Boost(f) => ResultOperator::Boost(Arc::clone(f)),
            ResultOperator::Other(name) => ResultOperator::Other(name.clone()),
        }
    }
}

impl<T> fmt::Debug for ResultOperator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultOperator::Skip(n) => write!(f, "Skip({n})"),
            ResultOperator::Take(n) => write!(f, "Take({n})"),
            ResultOperator::Other(name) => write!(f, "Other({name})"),
            ResultOperator::Boost(_) => f.write_str("Boost(..)"),
            other => f.write_str(match other {
                ResultOperator::Last => "Last",
                ResultOperator::First => "First",
                ResultOperator::Single => "Single",
                ResultOperator::Count => "Count",
                _ => "Any",
            }),
        }
    }
}

/// A complete query: source, body and result operators.
pub struct QueryModel<T> {
    pub source: QuerySource<T>,
    pub body: Vec<BodyClause>,
    pub result_operators: Vec<ResultOperator<T>>,
}

impl<T> QueryModel<T> {
    /// A query over the named index.
    pub fn from_index(name: impl Into<String>) -> Self {
        QueryModel {
            source: QuerySource::Index(name.into()),
            body: Vec::new(),
            result_operators: Vec::new(),
        }
    }

    /// A query over the results of `inner`.
    pub fn from_query(inner: QueryModel<T>) -> Self {
        QueryModel {
            source: QuerySource::SubQuery(Box::new(inner)),
            body: Vec::new(),
            result_operators: Vec::new(),
        }
    }

    pub fn where_clause(mut self, expr: Expr) -> Self {
        self.body.push(BodyClause::Where(expr));
        self
    }

    pub fn filter(mut self, expr: Expr) -> Self {
        self.body.push(BodyClause::Filter(expr));
        self
    }

    /// Start a new ordering clause.
    pub fn order_by(mut self, expr: Expr, direction: SortOrder) -> Self {
        self.body
            .push(BodyClause::OrderBy(vec![OrderClause::new(expr, direction)]));
        self
    }

    /// Add a secondary key to the last ordering clause.
    pub fn then_by(mut self, expr: Expr, direction: SortOrder) -> Self {
        match self.body.last_mut() {
            Some(BodyClause::OrderBy(keys)) => keys.push(OrderClause::new(expr, direction)),
            _ => return self.order_by(expr, direction),
        }
        self
    }

    pub fn with_operator(mut self, operator: ResultOperator<T>) -> Self {
        self.result_operators.push(operator);
        self
    }

    pub fn skip(self, n: usize) -> Self {
        self.with_operator(ResultOperator::Skip(n))
    }

    pub fn take(self, n: usize) -> Self {
        self.with_operator(ResultOperator::Take(n))
    }

    pub fn last(self) -> Self {
        self.with_operator(ResultOperator::Last)
    }

    pub fn first(self) -> Self {
        self.with_operator(ResultOperator::First)
    }

    pub fn single(self) -> Self {
        self.with_operator(ResultOperator::Single)
    }

    pub fn count(self) -> Self {
        self.with_operator(ResultOperator::Count)
    }

    pub fn any(self) -> Self {
        self.with_operator(ResultOperator::Any)
    }

    pub fn boost_by<F>(self, f: F) -> Self
    where
        F: Fn(&T) -> f32 + Send + Sync + 'static,
    {
        self.with_operator(ResultOperator::boost(f))
    }
}

impl<T> fmt::Debug for QuerySource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuerySource::Index(name) => f.debug_tuple("Index").field(name).finish(),
            QuerySource::SubQuery(inner) => f.debug_tuple("SubQuery").field(inner).finish(),
        }
    }
}

impl<T> fmt::Debug for QueryModel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryModel")
            .field("source", &self.source)
            .field("body", &self.body)
            .field("result_operators", &self.result_operators)
            .finish()
    }
}
