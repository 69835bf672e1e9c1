//! Trailing moving sum over the most recent per-step totals.

use std::collections::VecDeque;

/// Fixed-capacity window, newest value at the front.
///
/// The sum is recomputed from the held values on every push, O(capacity).
#[derive(Clone, Debug)]
pub struct SlidingWindow {
    values:   VecDeque<f64>,
    capacity: usize,
    sum:      f64,
}

impl SlidingWindow {
    /// `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { values: VecDeque::with_capacity(capacity + 1), capacity, sum: 0.0 }
    }

    /// Add the newest value, evicting the oldest when full.
    pub fn push(&mut self, value: f64) {
        self.values.push_front(value);
        if self.values.len() > self.capacity {
            self.values.pop_back();
        }
        self.sum = self.values.iter().sum();
    }

    /// Sum of the values currently held; fewer than `capacity` during warm-up.
    #[inline]
    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }
}
