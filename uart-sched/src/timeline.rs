/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Busy timeline: the link's allocated intervals over one horizon.
//!
//! Intervals are pairwise non-overlapping (they may touch at endpoints) and
//! kept sorted by `start`.  Because they never overlap, they are also sorted
//! by `end`, which lets [`BusyTimeline::free_intervals`] binary-search past
//! everything that finished before the query window.

use serde::Serialize;

use crate::capacity::EPSILON;

/// One occupied span of the link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
    pub message_id: String,
    pub instance_index: usize,
}

impl Interval {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Sorted, non-overlapping set of [`Interval`]s within `[0, horizon]`.
///
/// Owned by exactly one scheduling run.
#[derive(Debug, Clone, Default)]
pub struct BusyTimeline {
    horizon: f64,
    intervals: Vec<Interval>,
}

impl BusyTimeline {
    pub fn new(horizon: f64) -> Self {
        Self {
            horizon,
            intervals: Vec::new(),
        }
    }

    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Total occupied time.
    pub fn busy_time(&self) -> f64 {
        self.intervals.iter().map(Interval::duration).sum()
    }

    /// Free gaps inside `[window_start, window_end)`, in ascending order.
    ///
    /// The returned gaps are disjoint, non-empty, and together with the busy
    /// intervals cover the window exactly.  Returns an empty list for an empty
    /// window.
    pub fn free_intervals(&self, window_start: f64, window_end: f64) -> Vec<(f64, f64)> {
        let mut free = Vec::new();
        if window_start >= window_end {
            return free;
        }

        // Skip intervals that end at or before the window
        let first = self.intervals.partition_point(|iv| iv.end <= window_start);

        let mut current = window_start;
        for iv in &self.intervals[first..] {
            if iv.start > current {
                free.push((current, iv.start.min(window_end)));
            }
            current = current.max(iv.end);
            if current >= window_end {
                break;
            }
        }

        if current < window_end {
            free.push((current, window_end));
        }
        free
    }

    /// Insert `interval`, keeping the collection sorted by start time.
    ///
    /// The caller guarantees `interval` does not overlap anything already
    /// stored; the scheduler only inserts spans carved out of gaps returned by
    /// [`free_intervals`](Self::free_intervals).  Equal start times keep
    /// insertion order.
    pub fn insert(&mut self, interval: Interval) {
        debug_assert!(interval.start < interval.end, "empty interval {interval:?}");
        debug_assert!(
            interval.start >= -EPSILON && interval.end <= self.horizon + EPSILON,
            "interval {interval:?} outside horizon {}",
            self.horizon
        );

        let pos = self
            .intervals
            .partition_point(|iv| iv.start <= interval.start);

        debug_assert!(
            pos == 0 || self.intervals[pos - 1].end <= interval.start + EPSILON,
            "interval {interval:?} overlaps its predecessor"
        );
        debug_assert!(
            pos == self.intervals.len() || interval.end <= self.intervals[pos].start + EPSILON,
            "interval {interval:?} overlaps its successor"
        );

        self.intervals.insert(pos, interval);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
