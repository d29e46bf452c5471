// ABOUTME: Server-Sent Events client for the tenant-scoped real-time event stream
// ABOUTME: Framing, transport, reconnection policy, connection manager, and subscriptions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Capped exponential reconnection schedule
pub mod backoff;
/// Connection lifecycle owner and envelope fan-out
pub mod manager;
/// SSE line protocol framing
pub mod parser;
/// Cancelable envelope subscriptions
pub mod subscription;
/// Transport seam and HTTP implementation
pub mod transport;

pub use backoff::ReconnectPolicy;
pub use manager::{
    ConnectionManager, ConnectionState, ConnectionStatus, HealthIndicator, StreamHandle,
};
pub use parser::{FrameStream, SseFrame};
pub use subscription::Subscription;
pub use transport::{EventTransport, HttpSseTransport};
