// ABOUTME: System-wide constants and reference defaults for the real-time stream client
// ABOUTME: Contains event type names, buffer capacities, backoff limits, and env var names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Constants Module
//!
//! Reference values for the stream client. Runtime overrides go through
//! [`crate::config`]; nothing here reads the environment.

/// Service identity used by logging
pub mod service_names {
    /// Service name reported in structured logs
    pub const SAAS_REALTIME: &str = "saas_realtime";
}

/// Wire names of the event types the client registers listeners for
pub mod event_types {
    /// Initial handshake event sent by the server on subscribe
    pub const CONNECTED: &str = "connected";
    /// A workflow run began
    pub const WORKFLOW_STARTED: &str = "workflow.started";
    /// A workflow step finished
    pub const WORKFLOW_STEP_COMPLETED: &str = "workflow.step_completed";
    /// A workflow run finished successfully
    pub const WORKFLOW_COMPLETED: &str = "workflow.completed";
    /// A workflow run failed
    pub const WORKFLOW_FAILED: &str = "workflow.failed";
    /// An agent produced a response
    pub const AGENT_RESPONSE: &str = "agent.response";
    /// An agent is reasoning
    pub const AGENT_THINKING: &str = "agent.thinking";
    /// An agent invoked a tool
    pub const AGENT_TOOL_CALLED: &str = "agent.tool_called";
    /// Informational notification
    pub const NOTIFICATION_INFO: &str = "notification.info";
    /// Success notification
    pub const NOTIFICATION_SUCCESS: &str = "notification.success";
    /// Error notification
    pub const NOTIFICATION_ERROR: &str = "notification.error";

    /// Category prefix shared by every notification type
    pub const NOTIFICATION_PREFIX: &str = "notification.";
    /// SSE event name used when a frame carries no `event:` field
    pub const DEFAULT_SSE_EVENT: &str = "message";
}

/// Payload field names read by projectors
pub mod payload_fields {
    /// Workflow correlation key
    pub const WORKFLOW_ID: &str = "workflow_id";
    /// Workflow run identifier
    pub const EXECUTION_ID: &str = "execution_id";
    /// Index of the step that completed
    pub const STEP_INDEX: &str = "step_index";
    /// Number of steps in the workflow definition
    pub const TOTAL_STEPS: &str = "total_steps";
    /// Failure reason on `workflow.failed`
    pub const ERROR: &str = "error";
    /// Final output on `workflow.completed`
    pub const OUTPUT_DATA: &str = "output_data";
    /// Human-readable message
    pub const MESSAGE: &str = "message";
    /// Human-readable title
    pub const TITLE: &str = "title";
    /// Agent conversation correlation key
    pub const CONVERSATION_ID: &str = "conversation_id";
    /// Agent response text
    pub const CONTENT: &str = "content";
}

/// Reference defaults for buffers and timers
pub mod stream_defaults {
    /// Default event server base URL
    pub const BASE_URL: &str = "http://localhost:8000";
    /// Default stream endpoint path
    pub const STREAM_PATH: &str = "/api/events/stream";
    /// Query parameter carrying the bearer credential
    pub const CREDENTIAL_PARAM: &str = "token";
    /// Connect timeout for the streaming request in seconds
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
    /// Capacity of the global event history
    pub const HISTORY_CAPACITY: usize = 50;
    /// Capacity of the in-process fan-out channel
    pub const BROADCAST_CAPACITY: usize = 256;
    /// Capacity of the notification rolling list
    pub const NOTIFICATION_CAPACITY: usize = 20;
    /// Tool calls and responses kept per watched conversation
    pub const CONVERSATION_CAPACITY: usize = 50;
    /// Delay before the first reconnection attempt
    pub const RECONNECT_INITIAL_DELAY_MS: u64 = 1000;
    /// Upper bound on the reconnection delay
    pub const RECONNECT_MAX_DELAY_MS: u64 = 30_000;
    /// Consecutive failures tolerated before giving up
    pub const RECONNECT_MAX_ATTEMPTS: u32 = 5;
    /// Maximum number of toasts visible at once
    pub const TOAST_MAX_VISIBLE: usize = 5;
    /// Toast dwell time before auto-expiry
    pub const TOAST_DWELL_MS: u64 = 5000;
    /// Number of presented toast keys remembered for deduplication
    pub const TOAST_DEDUP_MEMORY: usize = 256;
}

/// Environment variable names read by [`crate::config`]
pub mod env_vars {
    /// Event server base URL
    pub const BASE_URL: &str = "SAAS_EVENTS_BASE_URL";
    /// Stream endpoint path
    pub const STREAM_PATH: &str = "SAAS_EVENTS_STREAM_PATH";
    /// Credential query parameter name
    pub const CREDENTIAL_PARAM: &str = "SAAS_EVENTS_CREDENTIAL_PARAM";
    /// Bearer credential (read by the CLI only)
    pub const TOKEN: &str = "SAAS_EVENTS_TOKEN";
    /// Connect timeout in seconds
    pub const CONNECT_TIMEOUT_SECS: &str = "SAAS_EVENTS_CONNECT_TIMEOUT_SECS";
    /// History capacity
    pub const HISTORY_CAPACITY: &str = "SAAS_EVENTS_HISTORY_CAPACITY";
    /// Fan-out channel capacity
    pub const BROADCAST_CAPACITY: &str = "SAAS_EVENTS_BROADCAST_CAPACITY";
    /// Notification list capacity
    pub const NOTIFICATION_CAPACITY: &str = "SAAS_EVENTS_NOTIFICATION_CAPACITY";
    /// Initial reconnection delay
    pub const RECONNECT_INITIAL_DELAY_MS: &str = "SAAS_EVENTS_RECONNECT_INITIAL_DELAY_MS";
    /// Maximum reconnection delay
    pub const RECONNECT_MAX_DELAY_MS: &str = "SAAS_EVENTS_RECONNECT_MAX_DELAY_MS";
    /// Maximum reconnection attempts
    pub const RECONNECT_MAX_ATTEMPTS: &str = "SAAS_EVENTS_RECONNECT_MAX_ATTEMPTS";
    /// Maximum visible toasts
    pub const TOAST_MAX_VISIBLE: &str = "SAAS_EVENTS_TOAST_MAX_VISIBLE";
    /// Toast dwell time
    pub const TOAST_DWELL_MS: &str = "SAAS_EVENTS_TOAST_DWELL_MS";
}
