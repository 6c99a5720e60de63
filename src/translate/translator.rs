//! Walks a query model and produces a [`TranslatedQuery`].

use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::config::CompilerConfig;
use crate::error::{LexiqError, Result};
use crate::expr::{Expr, ScalarKind};
use crate::field::{FieldInfo, FieldMappingProvider, KeywordFieldInfo};
use crate::lexical::query::Query;
use crate::lexical::query::boolean::{BooleanQuery, Occur};
use crate::lexical::query::match_all::MatchAllQuery;
use crate::lexical::search::searcher::{SearchRequest, SortField, SortKind};
use crate::lowering::{lower_ordering, lower_predicate};
use crate::translate::builder::{Fragment, QueryBuilder};
use crate::translate::model::{
    BodyClause, BoostFn, OrderClause, QueryModel, QuerySource, ResultOperator,
};

/// A result operator that reduces the sequence to a scalar or single item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    First,
    Single,
    Count,
    Any,
}

/// Everything needed to run a query against a searcher.
pub struct TranslatedQuery<T> {
    query: Box<dyn Query>,
    filter: Option<Box<dyn Query>>,
    sort: Vec<SortField>,
    skip: usize,
    max: Option<usize>,
    take_last: bool,
    boost_fn: Option<BoostFn<T>>,
    aggregate: Option<Aggregate>,
    unsupported: Vec<String>,
}

impl<T> TranslatedQuery<T> {
    pub fn query(&self) -> &dyn Query {
        self.query.as_ref()
    }

    pub fn filter(&self) -> Option<&dyn Query> {
        self.filter.as_deref()
    }

    pub fn sort(&self) -> &[SortField] {
        &self.sort
    }

    pub fn skip(&self) -> usize {
        self.skip
    }

    /// Maximum number of results, `None` for unbounded.
    pub fn max(&self) -> Option<usize> {
        self.max
    }

    pub fn take_last(&self) -> bool {
        self.take_last
    }

    pub fn aggregate(&self) -> Option<Aggregate> {
        self.aggregate
    }

    /// Names of result operators left for the caller.
    pub fn unsupported_operators(&self) -> &[String] {
        &self.unsupported
    }

    pub fn has_boost(&self) -> bool {
        self.boost_fn.is_some()
    }

    /// The composed score multiplier for `item`; 1 without boost functions.
    pub fn boost(&self, item: &T) -> f32 {
        self.boost_fn.as_ref().map_or(1.0, |f| f(item))
    }

    /// Hits the engine must collect before windowing, `None` for all of them.
    ///
    /// `take_last` and boost functions both need the full ranked list.
    pub fn collect_limit(&self) -> Option<usize> {
        if self.take_last || self.boost_fn.is_some() {
            return None;
        }
        self.max.map(|max| self.skip.saturating_add(max))
    }

    pub fn to_search_request(&self, limit: usize) -> SearchRequest {
        let mut request = SearchRequest::new(self.query.clone()).limit(limit);
        if let Some(filter) = &self.filter {
            request = request.filter(filter.clone());
        }
        request.sort = self.sort.clone();
        request
    }
}

impl<T> fmt::Debug for TranslatedQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslatedQuery")
            .field("query", &self.query.description())
            .field("filter", &self.filter.as_ref().map(|q| q.description()))
            .field("sort", &self.sort)
            .field("skip", &self.skip)
            .field("max", &self.max)
            .field("take_last", &self.take_last)
            .field("boost_fn", &self.boost_fn.is_some())
            .field("aggregate", &self.aggregate)
            .field("unsupported", &self.unsupported)
            .finish()
    }
}

/// Translates one query model. Consumed by [`QueryModelTranslator::translate`].
pub struct QueryModelTranslator<'a, T> {
    provider: &'a dyn FieldMappingProvider,
    config: &'a CompilerConfig,
    query: BooleanQuery,
    filter: BooleanQuery,
    sort: Vec<SortField>,
    skip: usize,
    max: Option<usize>,
    take_last: bool,
    boost_fn: Option<BoostFn<T>>,
    aggregate: Option<Aggregate>,
    unsupported: Vec<String>,
}

impl<'a, T: 'static> QueryModelTranslator<'a, T> {
    pub fn new(provider: &'a dyn FieldMappingProvider, config: &'a CompilerConfig) -> Self {
        QueryModelTranslator {
            provider,
            config,
            query: BooleanQuery::new(),
            filter: BooleanQuery::new(),
            sort: Vec::new(),
            skip: 0,
            max: None,
            take_last: false,
            boost_fn: None,
            aggregate: None,
            unsupported: Vec::new(),
        }
    }

    pub fn translate(mut self, model: &QueryModel<T>) -> Result<TranslatedQuery<T>> {
        self.visit(model)?;
        let translated = self.finish();
        debug!("translated query: {translated:?}");
        Ok(translated)
    }

    fn visit(&mut self, model: &QueryModel<T>) -> Result<()> {
        if let QuerySource::SubQuery(inner) = &model.source {
            self.visit(inner)?;
        }
        for clause in &model.body {
            match clause {
                BodyClause::Where(expr) => {
                    let fragment = self.build(expr)?;
                    conjoin(&mut self.query, fragment);
                }
                BodyClause::Filter(expr) => {
                    let fragment = self.build(expr)?;
                    conjoin(&mut self.filter, fragment);
                }
                BodyClause::OrderBy(keys) => {
                    for key in keys {
                        let sort = self.sort_field(key)?;
                        self.sort.push(sort);
                    }
                }
            }
        }
        for operator in &model.result_operators {
            self.apply(operator);
        }
        Ok(())
    }

    fn build(&self, expr: &Expr) -> Result<Fragment> {
        let lowered = lower_predicate(expr.clone(), self.config)?;
        QueryBuilder::new(self.provider, self.config).build(&lowered)
    }

    fn sort_field(&self, key: &OrderClause) -> Result<SortField> {
        let order = key.direction;
        match lower_ordering(key.expr.clone(), self.config)? {
            Expr::Relevance => Ok(SortField::Score { order }),
            Expr::Field(field) if !field.is_any_field() => {
                let (kind, comparator) = match self.provider.field_info(&field.name) {
                    Some(info) => (info.sort_kind(), info),
                    None => (
                        native_sort_kind(field.kind),
                        Arc::new(KeywordFieldInfo::new(field.name.as_str())) as Arc<dyn FieldInfo>,
                    ),
                };
                Ok(match kind {
                    Some(kind) => SortField::Field {
                        name: field.name,
                        kind,
                        order,
                    },
                    None => SortField::Custom {
                        name: field.name,
                        comparator,
                        order,
                    },
                })
            }
            other => Err(LexiqError::unsupported_expression(format!(
                "cannot order by {other}"
            ))),
        }
    }

    fn apply(&mut self, operator: &ResultOperator<T>) {
        match operator {
            ResultOperator::Skip(n) => {
                self.skip = self.skip.saturating_add(*n);
                self.max = self.max.map(|max| max.saturating_sub(*n));
            }
            ResultOperator::Take(n) => self.limit(*n),
            ResultOperator::Last => self.take_last = true,
            ResultOperator::First => self.set_aggregate(Aggregate::First, Some(1)),
            // Two hits are enough to tell "exactly one" from "more than one".
            ResultOperator::Single => self.set_aggregate(Aggregate::Single, Some(2)),
            ResultOperator::Count => self.set_aggregate(Aggregate::Count, None),
            ResultOperator::Any => self.set_aggregate(Aggregate::Any, Some(1)),
            ResultOperator::Boost(f) => {
                let f = Arc::clone(f);
                self.boost_fn = Some(match self.boost_fn.take() {
                    None => f,
                    Some(previous) => {
                        let composed: BoostFn<T> =
                            Arc::new(move |item: &T| previous(item) * f(item));
                        composed
                    }
                });
            }
            ResultOperator::Other(name) => self.unsupported.push(name.clone()),
        }
    }

    fn limit(&mut self, n: usize) {
        self.max = Some(self.max.map_or(n, |max| max.min(n)));
    }

    fn set_aggregate(&mut self, aggregate: Aggregate, limit: Option<usize>) {
        if self.aggregate.is_some() {
            self.unsupported.push(format!("{aggregate:?}").to_lowercase());
            return;
        }
        self.aggregate = Some(aggregate);
        // After Last the window must stay whole so the last hit is still in it.
        if let Some(limit) = limit
            && !self.take_last
        {
            self.limit(limit);
        }
    }

    fn finish(self) -> TranslatedQuery<T> {
        TranslatedQuery {
            query: finish_boolean(self.query).unwrap_or_else(|| Box::new(MatchAllQuery::new())),
            filter: finish_boolean(self.filter),
            sort: self.sort,
            skip: self.skip,
            max: self.max,
            take_last: self.take_last,
            boost_fn: self.boost_fn,
            aggregate: self.aggregate,
            unsupported: self.unsupported,
        }
    }
}

/// Add a clause fragment to the running conjunction, splicing plain conjunctions.
fn conjoin(target: &mut BooleanQuery, fragment: Fragment) {
    if fragment.occur == Occur::Must
        && let Some(inner) = fragment.query.as_any().downcast_ref::<BooleanQuery>()
        && inner.boost() == 1.0
        && inner.clauses_by_occur(Occur::Should).is_empty()
    {
        for clause in inner.clauses() {
            target.add_clause(clause.clone());
        }
        return;
    }
    target.add(fragment.query, fragment.occur.in_conjunction());
}

fn finish_boolean(mut query: BooleanQuery) -> Option<Box<dyn Query>> {
    if query.is_empty() {
        return None;
    }
    query.ensure_positive_clause();
    Some(Box::new(query))
}

fn native_sort_kind(kind: ScalarKind) -> Option<SortKind> {
    match kind {
        ScalarKind::Text | ScalarKind::Bool => Some(SortKind::String),
        ScalarKind::Int64 => Some(SortKind::Int64),
        ScalarKind::Float64 => Some(SortKind::Float64),
        ScalarKind::DateTime => Some(SortKind::DateTime),
        ScalarKind::Other => None,
    }
}
