//! The snapshot operations a [`Context`](crate::context::Context) needs from the engine.

use std::fmt::Debug;
use std::sync::Arc;

use crate::error::Result;
use crate::lexical::search::searcher::{IndexReader, Searcher};

/// Opens, refreshes and closes point-in-time views of one index.
///
/// All calls may block on I/O. The context never holds its pointer lock while
/// calling them.
pub trait SnapshotPrimitives: Send + Sync + Debug {
    /// Open the first snapshot.
    fn open(&self) -> Result<(Arc<dyn IndexReader>, Arc<dyn Searcher>)>;

    /// Reopen `reader`, returning the same instance (by pointer) when the index
    /// has not changed.
    fn reopen(&self, reader: &Arc<dyn IndexReader>) -> Result<Arc<dyn IndexReader>>;

    /// Build a searcher over a reopened reader.
    fn searcher(&self, reader: &Arc<dyn IndexReader>) -> Result<Arc<dyn Searcher>>;

    /// Release the resources of a snapshot. Called exactly once per snapshot.
    fn close(&self, reader: &Arc<dyn IndexReader>, searcher: &Arc<dyn Searcher>) -> Result<()>;

    /// Release a reopened reader that never got a searcher.
    fn close_reader(&self, reader: &Arc<dyn IndexReader>) -> Result<()>;
}
