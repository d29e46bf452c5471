// ABOUTME: Main library entry point for the tenant real-time event client
// ABOUTME: Stream connection management, event projections, and toast presentation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

// Crate-level attributes:
// - deny(unsafe_code): Zero-tolerance unsafe policy.
#![deny(unsafe_code)]

//! # SaaS Realtime
//!
//! Client for one tenant-scoped Server-Sent Events stream per session. It keeps
//! a long-lived connection alive with capped exponential backoff, records a
//! bounded history, and derives application state from the stream: a
//! notification feed, per-workflow progress, agent conversation activity,
//! and auto-expiring toasts.
//!
//! ## Architecture
//!
//! - **Events**: envelope wire model and bounded history
//! - **SSE**: framing, transport seam, reconnection policy, connection manager
//! - **Projections**: passive consumers folding the stream into narrower state
//! - **Toast**: transient alerts and the workflow progress bar
//! - **Session**: owner of all of the above for one credential
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use saas_realtime::config::StreamConfig;
//! use saas_realtime::errors::AppResult;
//! use saas_realtime::session::RealtimeSession;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = StreamConfig::load()?;
//!     let session = RealtimeSession::from_config(&config)?;
//!     session.connect("tenant-bearer-token");
//!
//!     let workflow = session.watch_workflow("wf-42");
//!     let mut changes = workflow.watch();
//!     while changes.changed().await.is_ok() {
//!         println!("{:?}", workflow.progress().await.status);
//!     }
//!     Ok(())
//! }
//! ```

/// Configuration management for the stream client
pub mod config;

/// Reference defaults, event type names, and environment variable names
pub mod constants;

/// Unified error handling
pub mod errors;

/// Event envelope model and history buffer
pub mod events;

/// Structured logging setup
pub mod logging;

/// Projectors deriving state from the event stream
pub mod projections;

/// Session-scoped owner of the real-time subsystem
pub mod session;

/// Server-Sent Events client and connection manager
pub mod sse;

/// Toast presentation layer
pub mod toast;
