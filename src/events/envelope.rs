// ABOUTME: Wire model for one tenant-scoped event and its closed-plus-open type tag
// ABOUTME: Parses JSON envelopes and exposes typed accessors for payload fields
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::constants::event_types;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Event type tag
///
/// The registered types have their own variants; anything else the server
/// sends still flows through as [`EventKind::Other`] with its raw name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// Server handshake on subscribe
    Connected,
    /// `workflow.started`
    WorkflowStarted,
    /// `workflow.step_completed`
    WorkflowStepCompleted,
    /// `workflow.completed`
    WorkflowCompleted,
    /// `workflow.failed`
    WorkflowFailed,
    /// `agent.response`
    AgentResponse,
    /// `agent.thinking`
    AgentThinking,
    /// `agent.tool_called`
    AgentToolCalled,
    /// `notification.info`
    NotificationInfo,
    /// `notification.success`
    NotificationSuccess,
    /// `notification.error`
    NotificationError,
    /// Any type not registered above
    Other(String),
}

impl EventKind {
    /// Every type the client registers a dedicated listener for
    pub const REGISTERED: [Self; 11] = [
        Self::Connected,
        Self::WorkflowStarted,
        Self::WorkflowStepCompleted,
        Self::WorkflowCompleted,
        Self::WorkflowFailed,
        Self::AgentResponse,
        Self::AgentThinking,
        Self::AgentToolCalled,
        Self::NotificationInfo,
        Self::NotificationSuccess,
        Self::NotificationError,
    ];

    /// Resolve a wire name, falling back to [`EventKind::Other`]
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            event_types::CONNECTED => Self::Connected,
            event_types::WORKFLOW_STARTED => Self::WorkflowStarted,
            event_types::WORKFLOW_STEP_COMPLETED => Self::WorkflowStepCompleted,
            event_types::WORKFLOW_COMPLETED => Self::WorkflowCompleted,
            event_types::WORKFLOW_FAILED => Self::WorkflowFailed,
            event_types::AGENT_RESPONSE => Self::AgentResponse,
            event_types::AGENT_THINKING => Self::AgentThinking,
            event_types::AGENT_TOOL_CALLED => Self::AgentToolCalled,
            event_types::NOTIFICATION_INFO => Self::NotificationInfo,
            event_types::NOTIFICATION_SUCCESS => Self::NotificationSuccess,
            event_types::NOTIFICATION_ERROR => Self::NotificationError,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Wire name of this type
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Connected => event_types::CONNECTED,
            Self::WorkflowStarted => event_types::WORKFLOW_STARTED,
            Self::WorkflowStepCompleted => event_types::WORKFLOW_STEP_COMPLETED,
            Self::WorkflowCompleted => event_types::WORKFLOW_COMPLETED,
            Self::WorkflowFailed => event_types::WORKFLOW_FAILED,
            Self::AgentResponse => event_types::AGENT_RESPONSE,
            Self::AgentThinking => event_types::AGENT_THINKING,
            Self::AgentToolCalled => event_types::AGENT_TOOL_CALLED,
            Self::NotificationInfo => event_types::NOTIFICATION_INFO,
            Self::NotificationSuccess => event_types::NOTIFICATION_SUCCESS,
            Self::NotificationError => event_types::NOTIFICATION_ERROR,
            Self::Other(name) => name,
        }
    }

    /// Domain part of the dotted name (`workflow`, `agent`, `notification`, ...)
    #[must_use]
    pub fn category(&self) -> &str {
        let name = self.as_str();
        name.split_once('.').map_or(name, |(category, _)| category)
    }

    /// Sub-kind part of the dotted name, if any
    #[must_use]
    pub fn subkind(&self) -> Option<&str> {
        self.as_str().split_once('.').map(|(_, subkind)| subkind)
    }

    /// True for registered types, false for the fallback arm
    #[must_use]
    pub const fn is_registered(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// True for every `notification.*` type, registered or not
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.as_str().starts_with(event_types::NOTIFICATION_PREFIX)
    }

    /// True for the workflow run lifecycle (start and terminal events)
    #[must_use]
    pub const fn is_workflow_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::WorkflowStarted | Self::WorkflowCompleted | Self::WorkflowFailed
        )
    }
}

impl From<String> for EventKind {
    fn from(name: String) -> Self {
        match Self::from_name(&name) {
            Self::Other(_) => Self::Other(name),
            registered => registered,
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Other(name) => name,
            registered => registered.as_str().to_owned(),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tenant-scoped event as delivered by the stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Event category and sub-kind
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Owning tenant
    pub tenant_id: String,
    /// Originating user, when the event is user-specific
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Type-dependent payload
    #[serde(default)]
    pub data: Value,
    /// Opaque, per-connection increasing identifier; also the removal key
    pub timestamp: String,
}

impl EventEnvelope {
    /// Build an envelope in memory
    pub fn new(
        kind: EventKind,
        tenant_id: impl Into<String>,
        data: Value,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            tenant_id: tenant_id.into(),
            user_id: None,
            data,
            timestamp: timestamp.into(),
        }
    }

    /// Attach an originating user
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Parse one envelope from its JSON wire form
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not valid JSON or lacks a required field
    pub fn parse(raw: &str) -> AppResult<Self> {
        serde_json::from_str(raw).map_err(|e| {
            AppError::invalid_format(format!("malformed event envelope: {e}")).with_source(e)
        })
    }

    /// String field of the payload
    #[must_use]
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Unsigned integer field of the payload
    #[must_use]
    pub fn data_u64(&self, key: &str) -> Option<u64> {
        self.data.get(key).and_then(Value::as_u64)
    }

    /// Raw field of the payload
    #[must_use]
    pub fn data_field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use serde_json::json;

    #[test]
    fn registered_names_round_trip_through_from_name() {
        for kind in EventKind::REGISTERED {
            assert_eq!(EventKind::from_name(kind.as_str()), kind);
            assert!(kind.is_registered());
        }
    }

    #[test]
    fn unknown_type_uses_fallback_arm() {
        let kind = EventKind::from_name("chat.message");
        assert_eq!(kind, EventKind::Other("chat.message".to_owned()));
        assert_eq!(kind.category(), "chat");
        assert_eq!(kind.subkind(), Some("message"));
        assert!(!kind.is_registered());
    }

    #[test]
    fn unregistered_notification_still_counts_as_notification() {
        assert!(EventKind::from_name("notification.warning").is_notification());
        assert!(EventKind::NotificationError.is_notification());
        assert!(!EventKind::WorkflowFailed.is_notification());
        assert!(!EventKind::Other("notifications".to_owned()).is_notification());
    }

    #[test]
    fn connected_event_without_data_parses() {
        let raw = r#"{"type":"connected","tenant_id":"t1","timestamp":"2025-01-01T00:00:00"}"#;
        let envelope = EventEnvelope::parse(raw).unwrap();
        assert_eq!(envelope.kind, EventKind::Connected);
        assert_eq!(envelope.data, Value::Null);
        assert_eq!(envelope.user_id, None);
    }

    #[test]
    fn null_user_id_parses_as_none() {
        let raw = json!({
            "type": "workflow.started",
            "tenant_id": "t1",
            "user_id": null,
            "data": {"workflow_id": "W", "execution_id": "e1"},
            "timestamp": "2025-01-01T00:00:01"
        })
        .to_string();
        let envelope = EventEnvelope::parse(&raw).unwrap();
        assert_eq!(envelope.user_id, None);
        assert_eq!(envelope.data_str("workflow_id"), Some("W"));
    }

    #[test]
    fn missing_type_is_rejected() {
        let error = EventEnvelope::parse(r#"{"tenant_id":"t1","timestamp":"x"}"#).unwrap_err();
        assert_eq!(error.code, ErrorCode::InvalidFormat);
    }

    #[test]
    fn serializes_type_as_wire_name() {
        let envelope = EventEnvelope::new(
            EventKind::Other("chat.message".to_owned()),
            "t1",
            json!({"content": "hi"}),
            "ts-1",
        );
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["type"], "chat.message");
        assert!(value.get("user_id").is_none());
    }
}
