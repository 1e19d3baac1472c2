//! Bounded notification log.
//!
//! Every state transition, override and failure leaves one entry here.  The
//! log keeps the newest `capacity` entries; ids keep counting across
//! evictions so they stay unique for the life of the engine.

use std::collections::VecDeque;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// What an entry is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    WaterIntake,
    Overflow,
    PhControl,
    Nutrition,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: u64,
    pub category: Category,
    pub severity: Severity,
    pub message: String,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone)]
pub struct NotificationLog {
    entries: VecDeque<Notification>,
    capacity: usize,
    next_id: u64,
}

impl NotificationLog {
    /// `capacity` is clamped to at least one entry.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_id: 1,
        }
    }

    /// Append an entry, evicting the oldest past capacity.  Returns the id.
    pub fn append(
        &mut self,
        category: Category,
        severity: Severity,
        message: impl Into<String>,
        timestamp_ms: u64,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(Notification {
            id,
            category,
            severity,
            message: message.into(),
            timestamp_ms,
        });
        id
    }

    /// Up to `n` entries, newest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Notification> {
        self.entries.iter().rev().take(n)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total entries ever appended, evicted ones included.
    pub fn total_appended(&self) -> u64 {
        self.next_id - 1
    }
}
