//! Checkout handles.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::warn;

use crate::context::tracker::SearcherTracker;
use crate::error::{LexiqError, Result};
use crate::lexical::search::searcher::{IndexReader, Searcher};

/// A claim on one snapshot, obtained from [`Context::checkout`](crate::context::Context::checkout).
///
/// The snapshot stays open until every handle on it is released. Release
/// explicitly with [`SnapshotHandle::release`]; a handle dropped unreleased is
/// released on drop.
pub struct SnapshotHandle {
    tracker: Arc<SearcherTracker>,
    released: AtomicBool,
}

impl SnapshotHandle {
    pub(crate) fn new(tracker: Arc<SearcherTracker>) -> Self {
        SnapshotHandle {
            tracker,
            released: AtomicBool::new(false),
        }
    }

    /// The searcher of the snapshot this handle was issued on.
    pub fn searcher(&self) -> &Arc<dyn Searcher> {
        self.tracker.searcher()
    }

    pub fn reader(&self) -> &Arc<dyn IndexReader> {
        self.tracker.reader()
    }

    pub fn generation(&self) -> u64 {
        self.tracker.generation()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Give up the claim. Fails with [`LexiqError::AlreadyReleased`] on every
    /// call after the first.
    pub fn release(&self) -> Result<()> {
        if self.released.swap(true, Ordering::AcqRel) {
            return Err(LexiqError::AlreadyReleased);
        }
        self.tracker.remove_client()
    }
}

impl Drop for SnapshotHandle {
    fn drop(&mut self) {
        if !self.released.swap(true, Ordering::AcqRel)
            && let Err(e) = self.tracker.remove_client()
        {
            warn!(
                "failed to release snapshot generation {} on drop: {e}",
                self.tracker.generation()
            );
        }
    }
}

impl fmt::Debug for SnapshotHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotHandle")
            .field("generation", &self.tracker.generation())
            .field("released", &self.is_released())
            .finish()
    }
}
