// ABOUTME: Configuration module for the real-time stream client
// ABOUTME: Stream endpoint, buffer capacities, reconnection schedule, and toast presentation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//! Configuration module
//!
//! - **Stream**: endpoint, credential parameter, capacities, reconnection policy
//! - **Presentation**: toast visible cap and dwell time
//!
//! Every value has a reference default and an `SAAS_EVENTS_*` override.

/// Toast presentation settings
pub mod presentation;
/// Stream connection settings
pub mod stream;

pub use presentation::ToastConfig;
pub use stream::StreamConfig;
