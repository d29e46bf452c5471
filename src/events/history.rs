// ABOUTME: Bounded most-recent-first log of received event envelopes
// ABOUTME: Evicts the oldest entry once capacity is reached
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::envelope::EventEnvelope;
use std::collections::VecDeque;

/// Rolling log of envelopes, newest first
#[derive(Debug, Clone)]
pub struct EventHistory {
    entries: VecDeque<EventEnvelope>,
    capacity: usize,
}

impl EventHistory {
    /// Create an empty history holding at most `capacity` envelopes
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepend an envelope, dropping the oldest beyond capacity
    pub fn push(&mut self, envelope: EventEnvelope) {
        self.entries.push_front(envelope);
        self.entries.truncate(self.capacity);
    }

    /// Drop every entry, keeping the capacity
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Most recent envelope
    #[must_use]
    pub fn latest(&self) -> Option<&EventEnvelope> {
        self.entries.front()
    }

    /// Iterate newest to oldest
    pub fn iter(&self) -> impl Iterator<Item = &EventEnvelope> {
        self.entries.iter()
    }

    /// Copy of the current sequence, newest first
    #[must_use]
    pub fn snapshot(&self) -> Vec<EventEnvelope> {
        self.entries.iter().cloned().collect()
    }

    /// Number of retained envelopes
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been received
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured capacity
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
