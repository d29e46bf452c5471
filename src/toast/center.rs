// ABOUTME: Toast state: visible list, dwell deadlines, and deduplication of presented events
// ABOUTME: Pure state driven by the presenter task; no timers or I/O of its own
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::config::ToastConfig;
use crate::constants::{event_types, payload_fields, stream_defaults};
use crate::events::{EventEnvelope, EventKind};

/// Visual severity of a toast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Neutral information
    Info,
    /// Something finished well
    Success,
    /// Something failed
    Error,
    /// Needs attention
    Warning,
}

impl Severity {
    /// Severity for an event type
    ///
    /// Notifications use their sub-kind; unrecognized sub-kinds are `Info`.
    #[must_use]
    pub fn for_kind(kind: &EventKind) -> Self {
        match kind {
            EventKind::WorkflowCompleted => Self::Success,
            EventKind::WorkflowFailed => Self::Error,
            _ if kind.is_notification() => {
                match kind
                    .as_str()
                    .strip_prefix(event_types::NOTIFICATION_PREFIX)
                    .unwrap_or_default()
                {
                    "success" => Self::Success,
                    "error" => Self::Error,
                    "warning" => Self::Warning,
                    _ => Self::Info,
                }
            }
            _ => Self::Info,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
        };
        f.write_str(label)
    }
}

/// One transient alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    /// Identifier for dismissal
    pub id: u64,
    /// Visual severity
    pub severity: Severity,
    /// Short heading
    pub title: String,
    /// Body text, possibly empty
    pub message: String,
    /// Timestamp of the originating envelope
    pub key: String,
    /// Type of the originating envelope
    pub source: EventKind,
    /// Creation instant
    #[serde(skip)]
    pub created_at: Instant,
    /// Auto-expiry instant
    #[serde(skip)]
    pub expires_at: Instant,
}

impl Toast {
    /// True when the toast mirrors an entry of the notification feed
    #[must_use]
    pub fn from_notification(&self) -> bool {
        self.source.is_notification()
    }
}

/// Heading for an envelope
///
/// Workflow lifecycle types have fixed titles; anything else uses the payload
/// `title`, then a generic label for its category.
#[must_use]
pub fn title_for(envelope: &EventEnvelope) -> String {
    let fixed = match envelope.kind {
        EventKind::WorkflowStarted => Some("Workflow started"),
        EventKind::WorkflowCompleted => Some("Workflow completed"),
        EventKind::WorkflowFailed => Some("Workflow failed"),
        _ => None,
    };
    if let Some(title) = fixed {
        return title.to_owned();
    }
    if let Some(title) = envelope
        .data_str(payload_fields::TITLE)
        .filter(|title| !title.is_empty())
    {
        return title.to_owned();
    }
    match envelope.kind.category() {
        "notification" => "Notification",
        "workflow" => "Workflow update",
        "agent" => "Agent activity",
        _ => "Update",
    }
    .to_owned()
}

/// Body text for an envelope
#[must_use]
pub fn message_for(envelope: &EventEnvelope) -> String {
    let message = envelope.data_str(payload_fields::MESSAGE);
    let message = if envelope.kind == EventKind::WorkflowFailed {
        message.or_else(|| envelope.data_str(payload_fields::ERROR))
    } else {
        message
    };
    message.unwrap_or_default().to_owned()
}

/// Visible toasts and the bookkeeping that decides when to create them
#[derive(Debug)]
pub struct ToastCenter {
    visible: VecDeque<Toast>,
    max_visible: usize,
    dwell: Duration,
    presented: HashSet<String>,
    presented_order: VecDeque<String>,
    next_id: u64,
}

impl ToastCenter {
    /// Create an empty center
    #[must_use]
    pub fn new(config: &ToastConfig) -> Self {
        Self {
            visible: VecDeque::with_capacity(config.max_visible),
            max_visible: config.max_visible,
            dwell: config.dwell(),
            presented: HashSet::new(),
            presented_order: VecDeque::new(),
            next_id: 1,
        }
    }

    /// Create toasts for notification feed entries not seen before
    ///
    /// `entries` is the feed, newest first. Every entry whose key has not been
    /// presented is toasted, oldest first so the newest ends up on top. A
    /// redelivered or resurfacing entry was presented earlier and is skipped
    /// wherever it sits in the feed.
    pub fn observe_feed(&mut self, entries: &[EventEnvelope], now: Instant) -> usize {
        let mut count = 0;
        for envelope in entries.iter().rev() {
            if self.presented.contains(&dedup_key(envelope)) {
                continue;
            }
            self.present(envelope, now);
            count += 1;
        }
        count
    }

    /// Create a toast for a workflow lifecycle envelope
    ///
    /// Step completions and non-workflow types are ignored.
    pub fn observe_workflow(&mut self, envelope: &EventEnvelope, now: Instant) -> Option<&Toast> {
        if !envelope.kind.is_workflow_lifecycle()
            || self.presented.contains(&dedup_key(envelope))
        {
            return None;
        }
        self.present(envelope, now);
        self.visible.front()
    }

    fn present(&mut self, envelope: &EventEnvelope, now: Instant) {
        self.remember(dedup_key(envelope));
        let toast = Toast {
            id: self.next_id,
            severity: Severity::for_kind(&envelope.kind),
            title: title_for(envelope),
            message: message_for(envelope),
            key: envelope.timestamp.clone(),
            source: envelope.kind.clone(),
            created_at: now,
            expires_at: now + self.dwell,
        };
        self.next_id += 1;
        self.visible.push_front(toast);
        self.visible.truncate(self.max_visible);
    }

    fn remember(&mut self, key: String) {
        if self.presented.insert(key.clone()) {
            self.presented_order.push_back(key);
        }
        while self.presented_order.len() > stream_defaults::TOAST_DEDUP_MEMORY {
            if let Some(oldest) = self.presented_order.pop_front() {
                self.presented.remove(&oldest);
            }
        }
    }

    /// Remove and return every toast whose dwell time has elapsed at `now`
    pub fn expire(&mut self, now: Instant) -> Vec<Toast> {
        let (expired, kept): (Vec<Toast>, Vec<Toast>) = self
            .visible
            .drain(..)
            .partition(|toast| toast.expires_at <= now);
        self.visible = kept.into();
        expired
    }

    /// Remove the toast with `id`
    pub fn dismiss(&mut self, id: u64) -> Option<Toast> {
        let index = self.visible.iter().position(|toast| toast.id == id)?;
        self.visible.remove(index)
    }

    /// Earliest pending expiry
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.visible.iter().map(|toast| toast.expires_at).min()
    }

    /// Visible toasts, newest first
    #[must_use]
    pub fn visible(&self) -> Vec<Toast> {
        self.visible.iter().cloned().collect()
    }

    /// Number of visible toasts
    #[must_use]
    pub fn len(&self) -> usize {
        self.visible.len()
    }

    /// True when nothing is shown
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }
}

fn dedup_key(envelope: &EventEnvelope) -> String {
    format!("{}@{}", envelope.kind, envelope.timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn notification(suffix: &str, timestamp: &str) -> EventEnvelope {
        EventEnvelope::new(
            EventKind::from_name(&format!("notification.{suffix}")),
            "t1",
            json!({"message": format!("body {timestamp}")}),
            timestamp,
        )
    }

    fn center() -> ToastCenter {
        ToastCenter::new(&ToastConfig::default())
    }

    #[test]
    fn severity_follows_notification_suffix() {
        assert_eq!(
            Severity::for_kind(&EventKind::NotificationSuccess),
            Severity::Success
        );
        assert_eq!(
            Severity::for_kind(&EventKind::from_name("notification.warning")),
            Severity::Warning
        );
        assert_eq!(
            Severity::for_kind(&EventKind::from_name("notification.custom")),
            Severity::Info
        );
        assert_eq!(Severity::for_kind(&EventKind::WorkflowFailed), Severity::Error);
    }

    #[test]
    fn titles_fall_back_from_table_to_payload_to_category() {
        let started = EventEnvelope::new(
            EventKind::WorkflowStarted,
            "t1",
            json!({"title": "ignored"}),
            "1",
        );
        assert_eq!(title_for(&started), "Workflow started");

        let titled = EventEnvelope::new(
            EventKind::NotificationInfo,
            "t1",
            json!({"title": "Quota"}),
            "2",
        );
        assert_eq!(title_for(&titled), "Quota");
        assert_eq!(title_for(&notification("info", "3")), "Notification");

        let unknown = EventEnvelope::new(EventKind::from_name("chat.message"), "t1", json!({}), "4");
        assert_eq!(title_for(&unknown), "Update");
    }

    #[test]
    fn failed_workflow_message_falls_back_to_error() {
        let failed = EventEnvelope::new(
            EventKind::WorkflowFailed,
            "t1",
            json!({"workflow_id": "W", "error": "timeout"}),
            "1",
        );
        assert_eq!(message_for(&failed), "timeout");
        assert_eq!(message_for(&notification("info", "2")), "body 2");
    }

    #[test]
    fn caps_visible_toasts_newest_first() {
        let mut center = center();
        let now = Instant::now();
        let mut feed = Vec::new();
        for i in 0..7 {
            feed.insert(0, notification("info", &i.to_string()));
            assert_eq!(center.observe_feed(&feed, now), 1);
        }
        let keys: Vec<String> = center.visible().into_iter().map(|t| t.key).collect();
        assert_eq!(keys, vec!["6", "5", "4", "3", "2"]);
    }

    #[test]
    fn burst_of_entries_is_toasted_oldest_first() {
        let mut center = center();
        let feed = vec![notification("error", "b"), notification("info", "a")];
        assert_eq!(center.observe_feed(&feed, Instant::now()), 2);
        let keys: Vec<String> = center.visible().into_iter().map(|t| t.key).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn resurfacing_head_is_not_toasted_twice() {
        let mut center = center();
        let now = Instant::now();
        let older = notification("info", "1");
        let newer = notification("info", "2");
        center.observe_feed(&[older.clone()], now);
        center.observe_feed(&[newer, older.clone()], now);
        assert_eq!(center.len(), 2);

        // head removed by expiry elsewhere; the older entry becomes head again
        assert_eq!(center.observe_feed(&[older], now), 0);
        assert_eq!(center.len(), 2);
    }

    #[test]
    fn redelivered_head_does_not_hide_newer_entry() {
        let mut center = center();
        let now = Instant::now();
        let first = notification("info", "ts-b");
        let second = notification("success", "ts-c");
        assert_eq!(center.observe_feed(&[first.clone()], now), 1);

        // second arrives, then first is delivered again before the next scan
        let feed = [first.clone(), second, first];
        assert_eq!(center.observe_feed(&feed, now), 1);
        let keys: Vec<String> = center.visible().into_iter().map(|t| t.key).collect();
        assert_eq!(keys, vec!["ts-c", "ts-b"]);
        assert_eq!(center.observe_feed(&feed, now), 0);
    }

    #[test]
    fn expiry_and_dismissal() {
        let mut center = center();
        let start = Instant::now();
        center.observe_feed(&[notification("info", "1")], start);
        let later = start + Duration::from_millis(1000);
        center.observe_feed(
            &[notification("info", "2"), notification("info", "1")],
            later,
        );

        assert_eq!(center.next_deadline(), Some(start + Duration::from_millis(5000)));
        assert!(center.expire(start + Duration::from_millis(4999)).is_empty());

        let expired = center.expire(start + Duration::from_millis(5000));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].key, "1");

        let remaining_id = center.visible()[0].id;
        assert!(center.dismiss(remaining_id).is_some());
        assert!(center.dismiss(remaining_id).is_none());
        assert!(center.is_empty());
        assert_eq!(center.next_deadline(), None);
    }

    #[test]
    fn workflow_lifecycle_only() {
        let mut center = center();
        let now = Instant::now();
        let step = EventEnvelope::new(
            EventKind::WorkflowStepCompleted,
            "t1",
            json!({"workflow_id": "W", "step_index": 1}),
            "1",
        );
        assert!(center.observe_workflow(&step, now).is_none());

        let done = EventEnvelope::new(
            EventKind::WorkflowCompleted,
            "t1",
            json!({"workflow_id": "W", "message": "All steps done"}),
            "2",
        );
        let toast = center.observe_workflow(&done, now).cloned().unwrap();
        assert_eq!(toast.severity, Severity::Success);
        assert_eq!(toast.message, "All steps done");
        assert!(!toast.from_notification());
        assert!(center.observe_workflow(&done, now).is_none());
    }
}
