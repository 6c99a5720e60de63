//! Lexical query objects and the search boundary they are executed through.
//!
//! # Module Structure
//!
//! - `query`: native query objects (term, prefix, wildcard, fuzzy, range, boolean)
//! - `search`: sort specification, search requests and the searcher/reader traits

pub mod query;
pub mod search;

// Re-exports
pub use query::Query;
pub use query::boolean::{BooleanClause, BooleanQuery, Occur};
pub use query::fuzzy::FuzzyQuery;
pub use query::match_all::MatchAllQuery;
pub use query::prefix::PrefixQuery;
pub use query::range::RangeQuery;
pub use query::term::TermQuery;
pub use query::wildcard::WildcardQuery;
pub use search::searcher::{
    IndexReader, ScoreDoc, SearchRequest, Searcher, SortField, SortKind, SortOrder, TopDocs,
};
