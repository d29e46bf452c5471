// ABOUTME: Notification projector keeping a bounded rolling list of notification.* envelopes
// ABOUTME: Supports clearing and removal of every entry sharing a timestamp key
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::VecDeque;

use tracing::debug;

use super::{ProjectionHandle, Projector};
use crate::events::EventEnvelope;

/// Rolling list of notification envelopes, newest first
#[derive(Debug, Clone)]
pub struct NotificationFeed {
    entries: VecDeque<EventEnvelope>,
    capacity: usize,
}

impl NotificationFeed {
    /// Create an empty feed holding at most `capacity` notifications
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Newest notification
    #[must_use]
    pub fn head(&self) -> Option<&EventEnvelope> {
        self.entries.front()
    }

    /// Iterate newest to oldest
    pub fn iter(&self) -> impl Iterator<Item = &EventEnvelope> {
        self.entries.iter()
    }

    /// Copy of the list, newest first
    #[must_use]
    pub fn snapshot(&self) -> Vec<EventEnvelope> {
        self.entries.iter().cloned().collect()
    }

    /// Number of retained notifications
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empty the list
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove every entry whose timestamp equals `timestamp`
    ///
    /// Timestamps are not guaranteed unique, so all matches go. Returns the
    /// number removed; zero when absent.
    pub fn remove_by_timestamp(&mut self, timestamp: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.timestamp != timestamp);
        before - self.entries.len()
    }
}

impl Projector for NotificationFeed {
    fn apply(&mut self, envelope: &EventEnvelope) -> bool {
        if !envelope.kind.is_notification() {
            return false;
        }
        self.entries.push_front(envelope.clone());
        self.entries.truncate(self.capacity);
        true
    }
}

impl ProjectionHandle<NotificationFeed> {
    /// Current notifications, newest first
    pub async fn notifications(&self) -> Vec<EventEnvelope> {
        self.read(NotificationFeed::snapshot).await
    }

    /// Newest notification
    pub async fn head(&self) -> Option<EventEnvelope> {
        self.read(|feed| feed.head().cloned()).await
    }

    /// Empty the list
    pub async fn clear(&self) {
        self.modify(|feed| {
            let had_entries = !feed.is_empty();
            feed.clear();
            had_entries
        })
        .await;
    }

    /// Remove every notification carrying `timestamp`
    pub async fn remove_by_timestamp(&self, timestamp: &str) -> usize {
        let mut removed = 0;
        self.modify(|feed| {
            removed = feed.remove_by_timestamp(timestamp);
            removed > 0
        })
        .await;
        if removed > 0 {
            debug!(timestamp, removed, "Removed notifications by timestamp");
        }
        removed
    }
}
