//! Reference-counted bookkeeping around one snapshot.

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;

use crate::context::observer::TrackerObserver;
use crate::context::primitives::SnapshotPrimitives;
use crate::error::{LexiqError, Result};
use crate::lexical::search::searcher::{IndexReader, Searcher};

#[derive(Debug, Default)]
struct TrackerState {
    clients: usize,
    pending_release: bool,
    released: bool,
}

/// What retiring a tracker did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetireOutcome {
    /// No handle held the snapshot; it was closed.
    Released,
    /// Handles still hold the snapshot; the last release closes it.
    Deferred { outstanding: usize },
    /// The tracker had already been retired.
    AlreadyRetired,
}

/// One snapshot plus the number of handles depending on it.
///
/// The snapshot is closed exactly once: when the tracker has been retired and
/// its client count is zero.
pub struct SearcherTracker {
    generation: u64,
    reader: Arc<dyn IndexReader>,
    searcher: Arc<dyn Searcher>,
    state: Mutex<TrackerState>,
    primitives: Arc<dyn SnapshotPrimitives>,
    observer: Arc<dyn TrackerObserver>,
}

impl SearcherTracker {
    pub(crate) fn new(
        generation: u64,
        reader: Arc<dyn IndexReader>,
        searcher: Arc<dyn Searcher>,
        primitives: Arc<dyn SnapshotPrimitives>,
        observer: Arc<dyn TrackerObserver>,
    ) -> Self {
        observer.tracker_created(generation);
        SearcherTracker {
            generation,
            reader,
            searcher,
            state: Mutex::new(TrackerState::default()),
            primitives,
            observer,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn reader(&self) -> &Arc<dyn IndexReader> {
        &self.reader
    }

    pub fn searcher(&self) -> &Arc<dyn Searcher> {
        &self.searcher
    }

    /// Handles currently holding this tracker.
    pub fn clients(&self) -> usize {
        self.state.lock().clients
    }

    /// True once the tracker is no longer current.
    pub fn is_retired(&self) -> bool {
        self.state.lock().pending_release
    }

    /// True once the snapshot has been closed.
    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }

    pub(crate) fn add_client(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.released {
            return Err(LexiqError::internal(format!(
                "checkout on released snapshot generation {}",
                self.generation
            )));
        }
        state.clients += 1;
        Ok(())
    }

    /// Drop one client, closing the snapshot if it was the last one of a retired tracker.
    pub(crate) fn remove_client(&self) -> Result<()> {
        let close = {
            let mut state = self.state.lock();
            if state.clients == 0 {
                return Err(LexiqError::internal(format!(
                    "client count underflow on snapshot generation {}",
                    self.generation
                )));
            }
            state.clients -= 1;
            take_release(&mut state)
        };
        if close {
            self.close()?;
        }
        Ok(())
    }

    /// Mark the tracker as no longer current and close it if nothing holds it.
    ///
    /// A failed close is logged; the tracker still counts as released.
    pub(crate) fn retire(&self) -> RetireOutcome {
        let (close, outstanding) = {
            let mut state = self.state.lock();
            if state.pending_release {
                return RetireOutcome::AlreadyRetired;
            }
            state.pending_release = true;
            (take_release(&mut state), state.clients)
        };
        if !close {
            return RetireOutcome::Deferred { outstanding };
        }
        if let Err(e) = self.close() {
            warn!(
                "failed to close snapshot generation {}: {e}",
                self.generation
            );
        }
        RetireOutcome::Released
    }

    fn close(&self) -> Result<()> {
        debug!("closing snapshot generation {}", self.generation);
        let result = self.primitives.close(&self.reader, &self.searcher);
        self.observer.tracker_released(self.generation);
        result
    }
}

/// Claim the single physical release if the tracker is retired and idle.
fn take_release(state: &mut TrackerState) -> bool {
    if state.pending_release && state.clients == 0 && !state.released {
        state.released = true;
        true
    } else {
        false
    }
}

impl fmt::Debug for SearcherTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SearcherTracker")
            .field("generation", &self.generation)
            .field("clients", &state.clients)
            .field("pending_release", &state.pending_release)
            .field("released", &state.released)
            .finish_non_exhaustive()
    }
}
