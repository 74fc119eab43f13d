//! Bounded per-job history of index grids.

use std::collections::VecDeque;

use bloom_common::Grid;
use chrono::NaiveDate;

/// Ring buffer of `(date, index grid)` in insertion order.
///
/// Once more than `capacity` dates are held the oldest is evicted.
/// Inserting a date that is already present replaces its grid in place.
#[derive(Debug)]
pub struct IndexHistory {
    entries: VecDeque<(NaiveDate, Grid)>,
    capacity: usize,
}

impl IndexHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, date: NaiveDate, grid: Grid) {
        if let Some(slot) = self.entries.iter_mut().find(|(d, _)| *d == date) {
            slot.1 = grid;
            return;
        }

        self.entries.push_back((date, grid));
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&Grid> {
        self.entries
            .iter()
            .find(|(d, _)| *d == date)
            .map(|(_, grid)| grid)
    }

    /// Held grids, oldest first.
    pub fn grids(&self) -> Vec<&Grid> {
        self.entries.iter().map(|(_, grid)| grid).collect()
    }

    /// Held grids with the given `(width, height)`, oldest first.
    pub fn matching(&self, shape: (usize, usize)) -> Vec<&Grid> {
        self.entries
            .iter()
            .map(|(_, grid)| grid)
            .filter(|grid| grid.shape() == shape)
            .collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.entries.iter().map(|(date, _)| *date).collect()
    }
}
