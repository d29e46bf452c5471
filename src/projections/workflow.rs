// ABOUTME: Workflow progress projector folding one workflow's lifecycle events into a state machine
// ABOUTME: Tracks status, current step, accumulated step results, and failure reason
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Workflow Progress
//!
//! `idle → running → completed | failed`, keyed by the envelope type and
//! correlated by the payload's `workflow_id`. Envelopes for any other workflow
//! are ignored entirely, and a projector with no target observes nothing.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::{ProjectionHandle, Projector};
use crate::constants::payload_fields;
use crate::events::{EventEnvelope, EventKind};

/// Failure reason used when `workflow.failed` carries none
const UNKNOWN_ERROR: &str = "Unknown error";

/// Run status of the observed workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// No run observed since creation or reset
    #[default]
    Idle,
    /// Started and not yet terminal
    Running,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
}

impl WorkflowStatus {
    /// True for `Completed` and `Failed`
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Folded state of one workflow run
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct WorkflowProgressState {
    /// Run status
    pub status: WorkflowStatus,
    /// Index of the last completed step
    pub current_step: u64,
    /// Payloads of every `workflow.step_completed`, in arrival order
    pub step_results: Vec<Value>,
    /// Failure reason on `Failed`
    pub error: Option<String>,
    /// Run identifier from `workflow.started`
    pub execution_id: Option<String>,
    /// Step count, when any payload announced it
    pub total_steps: Option<u64>,
    /// `output_data` of `workflow.completed`
    pub output: Option<Value>,
}

/// Progress projector bound to one workflow id
#[derive(Debug, Clone, Default)]
pub struct WorkflowProgress {
    workflow_id: Option<String>,
    state: WorkflowProgressState,
}

impl WorkflowProgress {
    /// Observe the workflow with id `workflow_id`
    pub fn new(workflow_id: impl Into<String>) -> Self {
        Self {
            workflow_id: Some(workflow_id.into()),
            state: WorkflowProgressState::default(),
        }
    }

    /// A projector that observes nothing
    #[must_use]
    pub fn unbound() -> Self {
        Self::default()
    }

    /// Target workflow id
    #[must_use]
    pub fn workflow_id(&self) -> Option<&str> {
        self.workflow_id.as_deref()
    }

    /// Current folded state
    #[must_use]
    pub const fn state(&self) -> &WorkflowProgressState {
        &self.state
    }

    /// Back to `Idle` to observe a new run of the same workflow
    pub fn reset(&mut self) {
        self.state = WorkflowProgressState::default();
    }

    /// True when `envelope` carries this projector's workflow id
    #[must_use]
    pub fn matches(&self, envelope: &EventEnvelope) -> bool {
        self.workflow_id.as_deref().is_some_and(|target| {
            envelope.data_str(payload_fields::WORKFLOW_ID) == Some(target)
        })
    }
}

impl Projector for WorkflowProgress {
    fn apply(&mut self, envelope: &EventEnvelope) -> bool {
        if !self.matches(envelope) {
            return false;
        }

        let state = &mut self.state;
        match envelope.kind {
            EventKind::WorkflowStarted => {
                *state = WorkflowProgressState {
                    status: WorkflowStatus::Running,
                    execution_id: envelope
                        .data_str(payload_fields::EXECUTION_ID)
                        .map(str::to_owned),
                    ..WorkflowProgressState::default()
                };
            }
            EventKind::WorkflowStepCompleted => {
                state.current_step = envelope.data_u64(payload_fields::STEP_INDEX).unwrap_or(0);
                state.step_results.push(envelope.data.clone());
            }
            EventKind::WorkflowCompleted => {
                state.status = WorkflowStatus::Completed;
                state.output = envelope.data_field(payload_fields::OUTPUT_DATA).cloned();
            }
            EventKind::WorkflowFailed => {
                state.status = WorkflowStatus::Failed;
                state.error = Some(
                    envelope
                        .data_str(payload_fields::ERROR)
                        .unwrap_or(UNKNOWN_ERROR)
                        .to_owned(),
                );
            }
            _ => return false,
        }

        if let Some(total) = envelope.data_u64(payload_fields::TOTAL_STEPS) {
            state.total_steps = Some(total);
        }
        true
    }
}

impl ProjectionHandle<WorkflowProgress> {
    /// Current folded state
    pub async fn progress(&self) -> WorkflowProgressState {
        self.read(|projector| projector.state().clone()).await
    }

    /// Back to `Idle` without tearing down the subscription
    pub async fn reset(&self) {
        self.modify(|projector| {
            let was_idle = projector.state() == &WorkflowProgressState::default();
            projector.reset();
            !was_idle
        })
        .await;
    }

    /// Global history entries for this workflow, newest first
    pub async fn history(&self) -> Vec<EventEnvelope> {
        let projector = self.read(Clone::clone).await;
        if projector.workflow_id().is_none() {
            return Vec::new();
        }
        self.stream()
            .history_filtered(|envelope| projector.matches(envelope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(kind: EventKind, data: Value, timestamp: &str) -> EventEnvelope {
        EventEnvelope::new(kind, "t1", data, timestamp)
    }

    #[test]
    fn folds_a_successful_run() {
        let mut progress = WorkflowProgress::new("W");
        let step1 = json!({"workflow_id": "W", "step_index": 1, "step_name": "fetch"});
        let step2 = json!({"workflow_id": "W", "step_index": 2, "step_name": "send"});

        progress.apply(&event(
            EventKind::WorkflowStarted,
            json!({"workflow_id": "W", "execution_id": "e1"}),
            "1",
        ));
        progress.apply(&event(EventKind::WorkflowStepCompleted, step1.clone(), "2"));
        progress.apply(&event(EventKind::WorkflowStepCompleted, step2.clone(), "3"));
        progress.apply(&event(
            EventKind::WorkflowCompleted,
            json!({"workflow_id": "W", "steps_completed": 2, "output_data": {"ok": true}}),
            "4",
        ));

        let state = progress.state();
        assert_eq!(state.status, WorkflowStatus::Completed);
        assert_eq!(state.current_step, 2);
        assert_eq!(state.step_results, vec![step1, step2]);
        assert_eq!(state.execution_id.as_deref(), Some("e1"));
        assert_eq!(state.output, Some(json!({"ok": true})));
    }

    #[test]
    fn ignores_other_workflows() {
        let mut progress = WorkflowProgress::new("W");
        let before = progress.state().clone();
        assert!(!progress.apply(&event(
            EventKind::WorkflowStarted,
            json!({"workflow_id": "X"}),
            "1",
        )));
        assert!(!progress.apply(&event(EventKind::WorkflowFailed, json!({}), "2")));
        assert_eq!(progress.state(), &before);
    }

    #[test]
    fn unbound_projector_observes_nothing() {
        let mut progress = WorkflowProgress::unbound();
        assert!(!progress.apply(&event(
            EventKind::WorkflowStarted,
            json!({"workflow_id": "W"}),
            "1",
        )));
        assert_eq!(progress.state().status, WorkflowStatus::Idle);
    }

    #[test]
    fn failure_defaults_reason_and_step_index() {
        let mut progress = WorkflowProgress::new("W");
        progress.apply(&event(
            EventKind::WorkflowStarted,
            json!({"workflow_id": "W"}),
            "1",
        ));
        progress.apply(&event(
            EventKind::WorkflowStepCompleted,
            json!({"workflow_id": "W"}),
            "2",
        ));
        assert_eq!(progress.state().current_step, 0);

        progress.apply(&event(
            EventKind::WorkflowFailed,
            json!({"workflow_id": "W"}),
            "3",
        ));
        assert_eq!(progress.state().status, WorkflowStatus::Failed);
        assert_eq!(progress.state().error.as_deref(), Some(UNKNOWN_ERROR));
    }

    #[test]
    fn restart_clears_previous_run() {
        let mut progress = WorkflowProgress::new("W");
        progress.apply(&event(
            EventKind::WorkflowFailed,
            json!({"workflow_id": "W", "error": "boom"}),
            "1",
        ));
        progress.apply(&event(
            EventKind::WorkflowStarted,
            json!({"workflow_id": "W", "total_steps": 4}),
            "2",
        ));
        let state = progress.state();
        assert_eq!(state.status, WorkflowStatus::Running);
        assert_eq!(state.error, None);
        assert_eq!(state.total_steps, Some(4));

        progress.reset();
        assert_eq!(progress.state(), &WorkflowProgressState::default());
    }
}
