//! The boundary between compiled queries and the engine that runs them.
//!
//! The search engine itself lives outside this crate. These types are the
//! shape of a compiled request going in and ranked hits coming out.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::field::FieldInfo;
use crate::lexical::query::Query;
use crate::lexical::query::match_all::MatchAllQuery;

/// Sort order for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending order (lowest to highest).
    #[default]
    Asc,
    /// Descending order (highest to lowest).
    Desc,
}

impl SortOrder {
    pub fn is_descending(self) -> bool {
        self == SortOrder::Desc
    }
}

/// Native value types the engine can sort on directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortKind {
    String,
    Int64,
    Float64,
    DateTime,
}

/// One entry of a sort specification.
#[derive(Clone)]
pub enum SortField {
    /// Sort by relevance score.
    Score {
        /// Sort order.
        order: SortOrder,
    },
    /// Sort by a field the engine can compare natively.
    Field {
        /// Field name to sort by.
        name: String,
        /// Native value type of the field.
        kind: SortKind,
        /// Sort order.
        order: SortOrder,
    },
    /// Sort by a field through the mapping's own comparison.
    Custom {
        name: String,
        comparator: Arc<dyn FieldInfo>,
        order: SortOrder,
    },
}

impl SortField {
    pub fn order(&self) -> SortOrder {
        match self {
            SortField::Score { order }
            | SortField::Field { order, .. }
            | SortField::Custom { order, .. } => *order,
        }
    }

    pub fn is_score(&self) -> bool {
        matches!(self, SortField::Score { .. })
    }

    /// The field name sorted on, `None` for relevance.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            SortField::Score { .. } => None,
            SortField::Field { name, .. } | SortField::Custom { name, .. } => Some(name),
        }
    }
}

impl fmt::Debug for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortField::Score { order } => f.debug_struct("Score").field("order", order).finish(),
            SortField::Field { name, kind, order } => f
                .debug_struct("Field")
                .field("name", name)
                .field("kind", kind)
                .field("order", order)
                .finish(),
            SortField::Custom { name, order, .. } => f
                .debug_struct("Custom")
                .field("name", name)
                .field("order", order)
                .finish_non_exhaustive(),
        }
    }
}

/// A compiled request handed to a [`Searcher`].
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// The scoring query.
    pub query: Box<dyn Query>,
    /// Non-scoring restriction applied on top of the query.
    pub filter: Option<Box<dyn Query>>,
    /// Sort specification; empty means relevance order.
    pub sort: Vec<SortField>,
    /// Maximum number of hits to collect.
    pub limit: usize,
}

impl SearchRequest {
    /// Request for `query` collecting the default ten hits.
    pub fn new(query: Box<dyn Query>) -> Self {
        SearchRequest {
            query,
            filter: None,
            sort: Vec::new(),
            limit: 10,
        }
    }

    /// A request matching every document.
    pub fn match_all() -> Self {
        Self::new(Box::new(MatchAllQuery::new()))
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn filter(mut self, filter: Box<dyn Query>) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Append a sort entry.
    pub fn sort_by(mut self, sort: SortField) -> Self {
        self.sort.push(sort);
        self
    }

    /// True when hits come back in relevance order.
    pub fn sorts_by_relevance(&self) -> bool {
        self.sort.first().is_none_or(SortField::is_score)
    }
}

/// A single hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreDoc {
    pub doc_id: u64,
    pub score: f32,
}

impl ScoreDoc {
    pub fn new(doc_id: u64, score: f32) -> Self {
        ScoreDoc { doc_id, score }
    }
}

/// Ranked hits plus the total number of matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopDocs {
    pub total_hits: u64,
    pub hits: Vec<ScoreDoc>,
}

impl TopDocs {
    pub fn new(total_hits: u64, hits: Vec<ScoreDoc>) -> Self {
        TopDocs { total_hits, hits }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// A point-in-time view of an index.
pub trait IndexReader: Send + Sync + fmt::Debug {
    /// Version of the index this reader sees.
    fn version(&self) -> u64;

    /// Number of live documents.
    fn num_docs(&self) -> u64;

    fn as_any(&self) -> &dyn Any;
}

/// Runs requests against one reader snapshot.
pub trait Searcher: Send + Sync + fmt::Debug {
    /// The reader this searcher runs against.
    fn reader(&self) -> &Arc<dyn IndexReader>;

    fn search(&self, request: &SearchRequest) -> Result<TopDocs>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::query::term::TermQuery;

    #[test]
    fn test_request_builder() {
        let request = SearchRequest::new(Box::new(TermQuery::new("title", "rust")))
            .limit(5)
            .sort_by(SortField::Field {
                name: "year".to_string(),
                kind: SortKind::Int64,
                order: SortOrder::Desc,
            });

        assert_eq!(request.limit, 5);
        assert!(!request.sorts_by_relevance());
        assert_eq!(request.sort[0].field_name(), Some("year"));
        assert!(request.sort[0].order().is_descending());
    }

    #[test]
    fn test_empty_sort_is_relevance() {
        let request = SearchRequest::match_all();
        assert!(request.sorts_by_relevance());
        assert_eq!(request.query.description(), "*:*");
    }
}
