//! `TripFeed` — the time-ordered source of live customer requests.
//!
//! Trips are bucketed by `announce_ms`.  Each simulation tick drains the
//! half-open window `[tick_start_ms, tick_end_ms)`; trips announced before
//! the simulation start are dropped the first time a window is drained.
//!
//! `BTreeMap` keeps draining O(log B + k) where B = number of distinct
//! announcement instants still queued and k = trips in the window.

use std::collections::BTreeMap;

use crate::Trip;

/// Trips waiting to be announced, ordered by announcement time.
#[derive(Debug, Default)]
pub struct TripFeed {
    inner: BTreeMap<i64, Vec<Trip>>,
    /// Cached total trip count for O(1) `len()`.
    total: usize,
}

impl TripFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a feed from trips in any order.  Trips sharing an instant keep
    /// their input order.
    pub fn from_trips(trips: impl IntoIterator<Item = Trip>) -> Self {
        let mut feed = Self::new();
        for trip in trips {
            feed.push(trip);
        }
        feed
    }

    pub fn push(&mut self, trip: Trip) {
        self.inner.entry(trip.announce_ms).or_default().push(trip);
        self.total += 1;
    }

    /// Remove and return every trip with `announce_ms < end_ms`, keeping only
    /// those with `announce_ms >= start_ms`.  Earlier trips are discarded.
    pub fn drain_window(&mut self, start_ms: i64, end_ms: i64) -> Vec<Trip> {
        let later = self.inner.split_off(&end_ms);
        let due = std::mem::replace(&mut self.inner, later);

        let mut out = Vec::new();
        for (ms, trips) in due {
            self.total -= trips.len();
            if ms >= start_ms {
                out.extend(trips);
            }
        }
        out
    }

    /// Earliest announcement instant still queued.
    pub fn next_ms(&self) -> Option<i64> {
        self.inner.keys().next().copied()
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
