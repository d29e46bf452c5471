// ABOUTME: Toast presentation layer: transient, auto-expiring alerts and the workflow progress bar
// ABOUTME: Derived from the notification feed and workflow lifecycle events
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Toast state, deduplication, titles and severities
pub mod center;
/// Background task driving toasts and dwell timers
pub mod presenter;
/// Workflow step counter and bar
pub mod progress;

pub use center::{Severity, Toast, ToastCenter};
pub use presenter::ToastPresenter;
pub use progress::ProgressBar;
