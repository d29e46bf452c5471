// ABOUTME: Agent activity projector for one conversation
// ABOUTME: Tracks whether the agent is thinking, tools it called, and responses it produced
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::Serialize;
use serde_json::Value;

use super::{ProjectionHandle, Projector};
use crate::constants::{payload_fields, stream_defaults};
use crate::events::{EventEnvelope, EventKind};

/// Folded agent activity
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ConversationState {
    /// Agent is reasoning and has not yet responded
    pub thinking: bool,
    /// Payloads of the most recent `agent.tool_called` events, in arrival order
    pub tool_calls: Vec<Value>,
    /// `content` of the most recent `agent.response` events, in arrival order
    pub responses: Vec<String>,
    /// Timestamp of the last applied envelope
    pub last_timestamp: Option<String>,
}

/// Agent activity projector bound to one conversation id
#[derive(Debug, Clone)]
pub struct ConversationActivity {
    conversation_id: Option<String>,
    capacity: usize,
    state: ConversationState,
}

impl ConversationActivity {
    /// Observe the conversation with id `conversation_id`
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self::with_capacity(conversation_id, stream_defaults::CONVERSATION_CAPACITY)
    }

    /// Observe `conversation_id`, keeping at most `capacity` tool calls and
    /// `capacity` responses
    pub fn with_capacity(conversation_id: impl Into<String>, capacity: usize) -> Self {
        Self {
            conversation_id: Some(conversation_id.into()),
            capacity: capacity.max(1),
            state: ConversationState::default(),
        }
    }

    /// Target conversation id
    #[must_use]
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// Current folded state
    #[must_use]
    pub const fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Forget all observed activity
    pub fn reset(&mut self) {
        self.state = ConversationState::default();
    }
}

impl Projector for ConversationActivity {
    fn apply(&mut self, envelope: &EventEnvelope) -> bool {
        let Some(target) = self.conversation_id.as_deref() else {
            return false;
        };
        if envelope.data_str(payload_fields::CONVERSATION_ID) != Some(target) {
            return false;
        }

        let state = &mut self.state;
        match envelope.kind {
            EventKind::AgentThinking => state.thinking = true,
            EventKind::AgentToolCalled => {
                push_capped(&mut state.tool_calls, envelope.data.clone(), self.capacity);
            }
            EventKind::AgentResponse => {
                state.thinking = false;
                if let Some(content) = envelope.data_str(payload_fields::CONTENT) {
                    push_capped(&mut state.responses, content.to_owned(), self.capacity);
                }
            }
            _ => return false,
        }
        state.last_timestamp = Some(envelope.timestamp.clone());
        true
    }
}

/// Append `item`, dropping the oldest entries beyond `capacity`
fn push_capped<T>(list: &mut Vec<T>, item: T, capacity: usize) {
    list.push(item);
    if list.len() > capacity {
        let overflow = list.len() - capacity;
        list.drain(..overflow);
    }
}

impl ProjectionHandle<ConversationActivity> {
    /// Current folded state
    pub async fn activity(&self) -> ConversationState {
        self.read(|projector| projector.state().clone()).await
    }

    /// Forget all observed activity
    pub async fn reset(&self) {
        self.modify(|projector| {
            projector.reset();
            true
        })
        .await;
    }
}
