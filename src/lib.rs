//! # Lexiq
//!
//! A declarative query compiler and snapshot lifecycle manager for full-text
//! search indexes.
//!
//! ## Features
//!
//! - Host expression trees lowered to field predicates by an ordered pass pipeline
//! - Range merging, polarity folding and boost attachment
//! - Query models translated to boolean queries, filters, sorts and result windows
//! - Reference-counted index snapshots with non-blocking reload
//! - A thin executor composing translation and snapshot checkout

pub mod config;
pub mod context;
mod data;
mod error;
pub mod executor;
pub mod expr;
pub mod field;
pub mod lexical;
pub mod lowering;
pub mod translate;

// Re-exports for the public API
pub use config::{CompilerConfig, ContextConfig};
pub use context::{
    Context, DisposeOutcome, LiveTrackers, ReloadOutcome, SnapshotHandle, SnapshotPrimitives,
    TrackerObserver,
};
pub use data::DataValue;
pub use error::{LexiqError, Result};
pub use executor::{DocumentMapper, QueryExecutor, QueryResult};
pub use expr::{Expr, FieldReference, Predicate, QueryType, RangePredicate, ScalarKind};
pub use field::{FieldInfo, FieldMappingProvider, KeywordFieldInfo, StaticFieldMappings};
pub use translate::{QueryModel, ResultOperator, TranslatedQuery, translate};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
