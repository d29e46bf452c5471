// ABOUTME: Step counter and proportional bar derived from workflow progress state
// ABOUTME: Stateless view recomputed from the projector on every render
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;

use crate::projections::{WorkflowProgressState, WorkflowStatus};

/// Progress view of one workflow run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressBar {
    /// Last completed step index
    pub current: u64,
    /// Step count, when known
    pub total: Option<u64>,
    /// Run status
    pub status: WorkflowStatus,
}

impl ProgressBar {
    /// Build from projector state
    ///
    /// An explicit `total_steps` wins over one announced by the stream.
    #[must_use]
    pub fn from_progress(state: &WorkflowProgressState, total_steps: Option<u64>) -> Self {
        Self {
            current: state.current_step,
            total: total_steps.or(state.total_steps).filter(|total| *total > 0),
            status: state.status,
        }
    }

    /// Completed fraction in `0.0..=1.0`
    ///
    /// Without a known total only a completed run counts as full.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        match self.total {
            Some(total) => (self.current as f64 / total as f64).clamp(0.0, 1.0),
            None if self.status == WorkflowStatus::Completed => 1.0,
            None => 0.0,
        }
    }

    /// Step counter text
    #[must_use]
    pub fn label(&self) -> String {
        match self.total {
            Some(total) => format!("Step {} / {total}", self.current.min(total)),
            None => format!("Step {}", self.current),
        }
    }

    /// Text bar `width` cells wide followed by the counter
    #[must_use]
    pub fn render(&self, width: usize) -> String {
        let filled = match self.total {
            Some(total) => {
                let done = self.current.min(total);
                usize::try_from(done.saturating_mul(width as u64) / total).unwrap_or(width)
            }
            None if self.status == WorkflowStatus::Completed => width,
            None => 0,
        };
        let filled = filled.min(width);
        format!(
            "[{}{}] {} ({})",
            "#".repeat(filled),
            "-".repeat(width - filled),
            self.label(),
            self.status
        )
    }
}

impl fmt::Display for ProgressBar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(20))
    }
}
