//! Snapshot lifecycle management.
//!
//! A [`Context`] owns at most one current snapshot of an index and hands out
//! [`SnapshotHandle`]s on it. [`Context::reload`] publishes a newer snapshot
//! without disturbing handles already issued: each handle keeps seeing the
//! snapshot it was issued on, and a superseded snapshot is closed when its last
//! handle is released.
//!
//! Two locks are involved. The pointer lock guards which tracker is current and
//! is held only for pointer reads and the publish swap. Each tracker has its own
//! lock for its client count. Reloads are serialized by a third lock, so a slow
//! reopen or pre-warm callback never blocks checkouts or releases.
//!
//! # Module Structure
//!
//! - `primitives`: the open/reopen/close operations supplied by the engine
//! - `tracker`: per-snapshot reference counting
//! - `handle`: checkout handles
//! - `observer`: lifecycle notifications and the [`LiveTrackers`] diagnostic

pub mod handle;
pub mod observer;
pub mod primitives;
pub mod tracker;

pub use handle::SnapshotHandle;
pub use observer::{LiveTrackers, NoopObserver, TrackerObserver};
pub use primitives::SnapshotPrimitives;
pub use tracker::{RetireOutcome, SearcherTracker};

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use log::{debug, warn};
use parking_lot::{Mutex, RwLock};

use crate::config::ContextConfig;
use crate::error::{LexiqError, Result};
use crate::lexical::search::searcher::Searcher;

/// Callback run on a freshly loaded searcher before it is published.
pub type SnapshotLoadingFn = Arc<dyn Fn(&Arc<dyn Searcher>) -> Result<()> + Send + Sync>;

/// What a reload did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// Nothing had been checked out yet; the next checkout opens the index.
    NoSnapshot,
    /// The index has not changed since the current snapshot was opened.
    Unchanged,
    /// A new snapshot was published.
    Published { generation: u64 },
}

/// What disposing a context did with the current snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisposeOutcome {
    /// Closed, or there was none.
    Released,
    /// Handles still hold it; the last release closes it.
    Deferred { outstanding: usize },
    /// The context had already been disposed.
    AlreadyDisposed,
}

/// Shares one index snapshot between concurrent queries.
pub struct Context {
    config: ContextConfig,
    primitives: Arc<dyn SnapshotPrimitives>,
    observer: Arc<dyn TrackerObserver>,
    current: Mutex<Option<Arc<SearcherTracker>>>,
    reload_lock: Mutex<()>,
    loading_callbacks: RwLock<Vec<SnapshotLoadingFn>>,
    disposed: AtomicBool,
    next_generation: AtomicU64,
}

impl Context {
    pub fn new(primitives: Arc<dyn SnapshotPrimitives>) -> Self {
        Self::with_config(ContextConfig::default(), primitives)
    }

    pub fn with_config(config: ContextConfig, primitives: Arc<dyn SnapshotPrimitives>) -> Self {
        Context {
            config,
            primitives,
            observer: Arc::new(NoopObserver),
            current: Mutex::new(None),
            reload_lock: Mutex::new(()),
            loading_callbacks: RwLock::new(Vec::new()),
            disposed: AtomicBool::new(false),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Report tracker lifecycle events to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn TrackerObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Generation of the current snapshot, if one is open.
    pub fn current_generation(&self) -> Option<u64> {
        self.current.lock().as_ref().map(|t| t.generation())
    }

    /// Handles outstanding on the current snapshot.
    pub fn outstanding_handles(&self) -> usize {
        self.current.lock().as_ref().map_or(0, |t| t.clients())
    }

    /// Register a callback run on every reloaded searcher before it is published.
    ///
    /// An error from the callback aborts the reload and keeps the previous
    /// snapshot current.
    pub fn on_snapshot_loading<F>(&self, callback: F)
    where
        F: Fn(&Arc<dyn Searcher>) -> Result<()> + Send + Sync + 'static,
    {
        self.loading_callbacks.write().push(Arc::new(callback));
    }

    /// Claim the current snapshot, opening the index on first use.
    pub fn checkout(&self) -> Result<SnapshotHandle> {
        if let Some(handle) = self.checkout_current()? {
            return Ok(handle);
        }

        // Opening may block, so it happens outside the pointer lock. The reload
        // lock keeps two first checkouts from both opening the index.
        let _reload = self.reload_lock.lock();
        if let Some(handle) = self.checkout_current()? {
            return Ok(handle);
        }

        let (reader, searcher) = self.primitives.open()?;
        let tracker = Arc::new(self.new_tracker(reader, searcher));

        let mut current = self.current.lock();
        if self.is_disposed() {
            drop(current);
            tracker.retire();
            return Err(LexiqError::ManagerDisposed);
        }
        tracker.add_client()?;
        *current = Some(Arc::clone(&tracker));
        debug!(
            "[{}] opened snapshot generation {}",
            self.config.name,
            tracker.generation()
        );
        Ok(SnapshotHandle::new(tracker))
    }

    fn checkout_current(&self) -> Result<Option<SnapshotHandle>> {
        let current = self.current.lock();
        if self.is_disposed() {
            return Err(LexiqError::ManagerDisposed);
        }
        match current.as_ref() {
            Some(tracker) => {
                tracker.add_client()?;
                Ok(Some(SnapshotHandle::new(Arc::clone(tracker))))
            }
            None => Ok(None),
        }
    }

    fn new_tracker(
        &self,
        reader: Arc<dyn crate::lexical::search::searcher::IndexReader>,
        searcher: Arc<dyn Searcher>,
    ) -> SearcherTracker {
        let generation = self.next_generation.fetch_add(1, Ordering::AcqRel);
        SearcherTracker::new(
            generation,
            reader,
            searcher,
            Arc::clone(&self.primitives),
            Arc::clone(&self.observer),
        )
    }

    /// Publish a newer snapshot if the index changed.
    ///
    /// Handles issued before the call keep their snapshot. Once this returns
    /// `Published`, every later checkout sees the new snapshot. A failing reopen
    /// or pre-warm callback leaves the current snapshot in place.
    pub fn reload(&self) -> Result<ReloadOutcome> {
        let _reload = self.reload_lock.lock();

        let old = {
            let current = self.current.lock();
            if self.is_disposed() {
                return Err(LexiqError::ManagerDisposed);
            }
            current.clone()
        };
        let Some(old) = old else {
            debug!("[{}] reload before first checkout", self.config.name);
            return Ok(ReloadOutcome::NoSnapshot);
        };

        let reader = self.primitives.reopen(old.reader())?;
        if Arc::ptr_eq(&reader, old.reader()) {
            debug!(
                "[{}] index unchanged, keeping generation {}",
                self.config.name,
                old.generation()
            );
            return Ok(ReloadOutcome::Unchanged);
        }

        let searcher = match self.primitives.searcher(&reader) {
            Ok(searcher) => searcher,
            Err(e) => {
                if let Err(close_err) = self.primitives.close_reader(&reader) {
                    warn!(
                        "[{}] failed to close reopened reader: {close_err}",
                        self.config.name
                    );
                }
                return Err(e);
            }
        };
        let tracker = Arc::new(self.new_tracker(reader, searcher));

        if self.config.prewarm {
            let callbacks = self.loading_callbacks.read().clone();
            for callback in &callbacks {
                if let Err(e) = callback(tracker.searcher()) {
                    warn!(
                        "[{}] snapshot loading callback failed, discarding generation {}: {e}",
                        self.config.name,
                        tracker.generation()
                    );
                    tracker.retire();
                    return Err(e);
                }
            }
        }

        let previous = {
            let mut current = self.current.lock();
            if self.is_disposed() {
                drop(current);
                tracker.retire();
                return Err(LexiqError::ManagerDisposed);
            }
            current.replace(Arc::clone(&tracker))
        };
        let generation = tracker.generation();
        debug!("[{}] published snapshot generation {generation}", self.config.name);

        if let Some(previous) = previous
            && let RetireOutcome::Deferred { outstanding } = previous.retire()
        {
            debug!(
                "[{}] generation {} stays open for {outstanding} handle(s)",
                self.config.name,
                previous.generation()
            );
        }
        Ok(ReloadOutcome::Published { generation })
    }

    /// Stop issuing handles and close the current snapshot.
    ///
    /// If handles are still outstanding the snapshot stays open until they are
    /// released; this is logged and reported to the observer.
    pub fn dispose(&self) -> DisposeOutcome {
        let tracker = {
            let mut current = self.current.lock();
            if self.disposed.swap(true, Ordering::AcqRel) {
                return DisposeOutcome::AlreadyDisposed;
            }
            current.take()
        };
        let Some(tracker) = tracker else {
            return DisposeOutcome::Released;
        };

        match tracker.retire() {
            RetireOutcome::Deferred { outstanding } => {
                warn!(
                    "[{}] disposed with {outstanding} outstanding handle(s) on generation {}",
                    self.config.name,
                    tracker.generation()
                );
                self.observer
                    .release_deferred(tracker.generation(), outstanding);
                DisposeOutcome::Deferred { outstanding }
            }
            RetireOutcome::Released | RetireOutcome::AlreadyRetired => DisposeOutcome::Released,
        }
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("name", &self.config.name)
            .field("current", &*self.current.lock())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}
