//! Tracker lifecycle notifications.

use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use parking_lot::Mutex;

/// Receives tracker lifecycle events from a context.
///
/// Every method defaults to doing nothing.
pub trait TrackerObserver: Send + Sync {
    /// A snapshot was opened and wrapped in a tracker.
    fn tracker_created(&self, _generation: u64) {}

    /// A tracker's snapshot was physically closed.
    fn tracker_released(&self, _generation: u64) {}

    /// The context was disposed while `outstanding` handles still held the
    /// tracker; it stays open until they are released.
    fn release_deferred(&self, _generation: u64, _outstanding: usize) {}
}

/// Ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TrackerObserver for NoopObserver {}

/// Keeps count of live trackers, for diagnostics and tests.
#[derive(Debug, Default)]
pub struct LiveTrackers {
    live: Mutex<AHashMap<u64, Option<usize>>>,
    created: AtomicU64,
    released: AtomicU64,
}

impl LiveTrackers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trackers created and not yet released.
    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }

    /// Generations of the live trackers, ascending.
    pub fn live_generations(&self) -> Vec<u64> {
        let mut generations: Vec<u64> = self.live.lock().keys().copied().collect();
        generations.sort_unstable();
        generations
    }

    /// Live trackers whose release was deferred at dispose, with the number of
    /// handles outstanding at that time.
    pub fn deferred(&self) -> Vec<(u64, usize)> {
        let mut deferred: Vec<(u64, usize)> = self
            .live
            .lock()
            .iter()
            .filter_map(|(generation, outstanding)| outstanding.map(|n| (*generation, n)))
            .collect();
        deferred.sort_unstable();
        deferred
    }

    pub fn created_count(&self) -> u64 {
        self.created.load(Ordering::Acquire)
    }

    pub fn released_count(&self) -> u64 {
        self.released.load(Ordering::Acquire)
    }
}

impl TrackerObserver for LiveTrackers {
    fn tracker_created(&self, generation: u64) {
        self.live.lock().insert(generation, None);
        self.created.fetch_add(1, Ordering::AcqRel);
    }

    fn tracker_released(&self, generation: u64) {
        self.live.lock().remove(&generation);
        self.released.fetch_add(1, Ordering::AcqRel);
    }

    fn release_deferred(&self, generation: u64, outstanding: usize) {
        if let Some(entry) = self.live.lock().get_mut(&generation) {
            *entry = Some(outstanding);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_trackers_counts() {
        let trackers = LiveTrackers::new();
        trackers.tracker_created(1);
        trackers.tracker_created(2);
        trackers.release_deferred(2, 3);
        trackers.tracker_released(1);

        assert_eq!(trackers.live_generations(), vec![2]);
        assert_eq!(trackers.deferred(), vec![(2, 3)]);
        assert_eq!(trackers.created_count(), 2);
        assert_eq!(trackers.released_count(), 1);

        trackers.tracker_released(2);
        assert_eq!(trackers.live_count(), 0);
        assert!(trackers.deferred().is_empty());
    }
}
