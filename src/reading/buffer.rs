//! Bounded, time-ordered store of accepted readings.
//!
//! Keeps the most recent `capacity` readings; pushing past capacity evicts
//! from the head.  [`ReadingBuffer::window`] hands out a lazy view of the
//! tail that can be cloned and walked again, which is what the chart
//! consumers need.

use std::collections::VecDeque;
use std::iter::Skip;

use super::Reading;

/// Lazy, finite, restartable view over the newest readings, oldest first.
pub type Window<'a> = Skip<std::collections::vec_deque::Iter<'a, Reading>>;

#[derive(Debug, Clone)]
pub struct ReadingBuffer {
    readings: VecDeque<Reading>,
    capacity: usize,
}

impl ReadingBuffer {
    /// `capacity` is clamped to at least one slot.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            readings: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append to the tail, evicting the oldest readings past capacity.
    pub fn push(&mut self, reading: Reading) {
        while self.readings.len() >= self.capacity {
            self.readings.pop_front();
        }
        self.readings.push_back(reading);
    }

    /// Most recent reading, `None` when nothing has been accepted yet.
    pub fn latest(&self) -> Option<&Reading> {
        self.readings.back()
    }

    /// The last `n` readings (fewer if the buffer is shorter), chronological.
    pub fn window(&self, n: usize) -> Window<'_> {
        let skip = self.readings.len().saturating_sub(n);
        self.readings.iter().skip(skip)
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
