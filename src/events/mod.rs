// ABOUTME: Event data model shared by the connection manager and every projector
// ABOUTME: Envelope wire shape, type tag, and the bounded history buffer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Envelope wire model and event type tag
pub mod envelope;
/// Bounded most-recent-first envelope log
pub mod history;

pub use envelope::{EventEnvelope, EventKind};
pub use history::EventHistory;
