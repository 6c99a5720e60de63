//! Runs translated queries against a checked-out snapshot.
//!
//! The executor translates first, then checks out a snapshot, searches,
//! maps hits to objects through a [`DocumentMapper`] and applies the parts of
//! the translated query the engine does not: boost functions, the result
//! window, `take_last` and aggregates.

use std::sync::Arc;

use log::debug;

use crate::config::CompilerConfig;
use crate::context::{Context, SnapshotHandle};
use crate::error::{LexiqError, Result};
use crate::field::FieldMappingProvider;
use crate::lexical::search::searcher::{ScoreDoc, Searcher, TopDocs};
use crate::translate::{Aggregate, QueryModel, TranslatedQuery, translate};

/// Converts a hit into a result object.
pub trait DocumentMapper<T>: Send + Sync {
    fn to_object(&self, searcher: &dyn Searcher, hit: &ScoreDoc) -> Result<T>;
}

impl<T, F> DocumentMapper<T> for F
where
    F: Fn(&dyn Searcher, &ScoreDoc) -> Result<T> + Send + Sync,
{
    fn to_object(&self, searcher: &dyn Searcher, hit: &ScoreDoc) -> Result<T> {
        self(searcher, hit)
    }
}

/// The outcome of one query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult<T> {
    /// The windowed sequence.
    Items(Vec<T>),
    /// `First`, `Single` or `Last`.
    Item(T),
    Count(u64),
    Any(bool),
}

impl<T> QueryResult<T> {
    /// The sequence, or the single item as a one-element sequence.
    pub fn into_items(self) -> Option<Vec<T>> {
        match self {
            QueryResult::Items(items) => Some(items),
            QueryResult::Item(item) => Some(vec![item]),
            QueryResult::Count(_) | QueryResult::Any(_) => None,
        }
    }

    pub fn into_item(self) -> Option<T> {
        match self {
            QueryResult::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn count(&self) -> Option<u64> {
        match self {
            QueryResult::Count(n) => Some(*n),
            _ => None,
        }
    }

    pub fn any(&self) -> Option<bool> {
        match self {
            QueryResult::Any(any) => Some(*any),
            _ => None,
        }
    }
}

/// Executes query models for one context.
pub struct QueryExecutor<T> {
    context: Arc<Context>,
    provider: Arc<dyn FieldMappingProvider>,
    mapper: Arc<dyn DocumentMapper<T>>,
    config: CompilerConfig,
}

impl<T: 'static> QueryExecutor<T> {
    pub fn new(
        context: Arc<Context>,
        provider: Arc<dyn FieldMappingProvider>,
        mapper: Arc<dyn DocumentMapper<T>>,
    ) -> Self {
        QueryExecutor {
            context,
            provider,
            mapper,
            config: CompilerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    /// Translate `model` without running it.
    pub fn translate(&self, model: &QueryModel<T>) -> Result<TranslatedQuery<T>> {
        translate(model, self.provider.as_ref(), &self.config)
    }

    /// Translate and run `model`.
    pub fn execute(&self, model: &QueryModel<T>) -> Result<QueryResult<T>> {
        let translated = self.translate(model)?;
        if let Some(operator) = translated.unsupported_operators().first() {
            return Err(LexiqError::unsupported_result_operator(operator.as_str()));
        }

        let handle = self.context.checkout()?;
        let result = self.run(&translated, &handle);
        handle.release()?;
        result
    }

    fn run(
        &self,
        translated: &TranslatedQuery<T>,
        handle: &SnapshotHandle,
    ) -> Result<QueryResult<T>> {
        let searcher = handle.searcher();
        let limit = translated.collect_limit().unwrap_or(usize::MAX);
        let request = translated.to_search_request(limit);
        let top_docs = searcher.search(&request)?;
        debug!(
            "generation {}: {} of {} hits collected",
            handle.generation(),
            top_docs.len(),
            top_docs.total_hits
        );

        if translated.aggregate() == Some(Aggregate::Count) && !translated.take_last() {
            return Ok(QueryResult::Count(window_count(translated, &top_docs)));
        }

        let mut scored = Vec::with_capacity(top_docs.len());
        for hit in &top_docs.hits {
            let item = self.mapper.to_object(&**searcher, hit)?;
            let score = hit.score * translated.boost(&item);
            scored.push((score, item));
        }
        if translated.has_boost() && request.sorts_by_relevance() {
            scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        }

        let mut items: Vec<T> = scored
            .into_iter()
            .map(|(_, item)| item)
            .skip(translated.skip())
            .take(translated.max().unwrap_or(usize::MAX))
            .collect();
        if translated.take_last() {
            items = items.pop().into_iter().collect();
        }

        match translated.aggregate() {
            None if translated.take_last() => items
                .pop()
                .map(QueryResult::Item)
                .ok_or(LexiqError::NoResults),
            None => Ok(QueryResult::Items(items)),
            Some(Aggregate::First) => items
                .into_iter()
                .next()
                .map(QueryResult::Item)
                .ok_or(LexiqError::NoResults),
            Some(Aggregate::Single) => {
                if items.len() > 1 {
                    return Err(LexiqError::MoreThanOneResult);
                }
                items.pop().map(QueryResult::Item).ok_or(LexiqError::NoResults)
            }
            Some(Aggregate::Count) => Ok(QueryResult::Count(items.len() as u64)),
            Some(Aggregate::Any) => Ok(QueryResult::Any(!items.is_empty())),
        }
    }
}

/// Matches inside the skip/max window, from the engine's total.
fn window_count<T>(translated: &TranslatedQuery<T>, top_docs: &TopDocs) -> u64 {
    let skipped = top_docs.total_hits.saturating_sub(translated.skip() as u64);
    match translated.max() {
        Some(max) => skipped.min(max as u64),
        None => skipped,
    }
}
