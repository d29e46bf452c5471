// ABOUTME: Shared test utilities for integration tests
// ABOUTME: Scripted event transport, envelope builders, and quiet logging setup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `saas_realtime`
//!
//! [`ScriptedTransport`] stands in for the event server: each `open()` call
//! consumes the next scripted outcome (refusal or an accepted stream whose
//! frames the test pushes through a [`ServerStream`]). When the script is
//! exhausted every further open is refused.

use std::collections::VecDeque;
use std::env;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use saas_realtime::config::StreamConfig;
use saas_realtime::errors::{AppError, AppResult};
use saas_realtime::events::{EventEnvelope, EventKind};
use saas_realtime::sse::{EventTransport, FrameStream, SseFrame};
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::Level;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Default configuration with the reference capacities and timers
pub fn test_config() -> StreamConfig {
    StreamConfig {
        base_url: "https://events.test".to_owned(),
        ..StreamConfig::default()
    }
}

// ============================================================================
// Scripted transport
// ============================================================================

/// Outcome of one `open()` call
enum Script {
    Refuse(String),
    Accept(mpsc::UnboundedReceiver<AppResult<SseFrame>>),
}

/// Record of one `open()` call
#[derive(Debug, Clone)]
pub struct OpenRecord {
    pub credential: String,
    pub at: Instant,
}

/// Server side of an accepted scripted stream
pub struct ServerStream {
    sender: Option<mpsc::UnboundedSender<AppResult<SseFrame>>>,
}

impl ServerStream {
    /// Send an envelope on its named SSE channel; false once the client is gone
    pub fn send(&self, envelope: &EventEnvelope) -> bool {
        let data = serde_json::to_string(envelope).unwrap();
        self.send_frame(SseFrame::named(envelope.kind.as_str(), data))
    }

    /// Send raw frame data on the default channel
    pub fn send_raw(&self, data: &str) -> bool {
        self.send_frame(SseFrame::data(data))
    }

    /// Send one frame
    pub fn send_frame(&self, frame: SseFrame) -> bool {
        self.sender
            .as_ref()
            .is_some_and(|sender| sender.send(Ok(frame)).is_ok())
    }

    /// Fail the stream with a transport error
    pub fn fail(&mut self, message: &str) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(Err(AppError::transport(message)));
        }
    }

    /// Close the stream cleanly from the server side
    pub fn close(&mut self) {
        self.sender = None;
    }
}

/// Event transport replaying a script
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Script>>,
    opens: Mutex<Vec<OpenRecord>>,
    open_count: Arc<watch::Sender<usize>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        let (open_count, _) = watch::channel(0);
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            opens: Mutex::new(Vec::new()),
            open_count: Arc::new(open_count),
        })
    }

    /// Script the next open to be refused
    pub fn refuse_next(&self, message: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Script::Refuse(message.to_owned()));
    }

    /// Script the next open to be accepted; frames are pushed via the result
    pub fn accept_next(&self) -> ServerStream {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.script
            .lock()
            .unwrap()
            .push_back(Script::Accept(receiver));
        ServerStream {
            sender: Some(sender),
        }
    }

    /// Every open so far
    pub fn opens(&self) -> Vec<OpenRecord> {
        self.opens.lock().unwrap().clone()
    }

    /// Number of opens so far
    pub fn open_count(&self) -> usize {
        *self.open_count.borrow()
    }

    /// Gaps between consecutive opens
    pub fn open_gaps(&self) -> Vec<Duration> {
        self.opens()
            .windows(2)
            .map(|pair| pair[1].at - pair[0].at)
            .collect()
    }

    /// Wait until at least `count` opens happened
    pub async fn wait_for_opens(&self, count: usize) {
        let mut receiver = self.open_count.subscribe();
        receiver.wait_for(|opened| *opened >= count).await.unwrap();
    }
}

#[async_trait]
impl EventTransport for ScriptedTransport {
    async fn open(&self, credential: &str) -> AppResult<FrameStream> {
        self.opens.lock().unwrap().push(OpenRecord {
            credential: credential.to_owned(),
            at: Instant::now(),
        });
        self.open_count.send_modify(|count| *count += 1);

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Script::Accept(receiver)) => {
                Ok(Box::pin(UnboundedReceiverStream::new(receiver)))
            }
            Some(Script::Refuse(message)) => Err(AppError::transport(message)),
            None => Err(AppError::transport("connection refused")),
        }
    }
}

// ============================================================================
// Envelope builders
// ============================================================================

/// Envelope with a given wire type name
pub fn envelope(kind: &str, tenant_id: &str, data: Value, timestamp: &str) -> EventEnvelope {
    EventEnvelope::new(EventKind::from_name(kind), tenant_id, data, timestamp)
}

/// The server handshake for `tenant_id`
pub fn connected(tenant_id: &str) -> EventEnvelope {
    envelope("connected", tenant_id, Value::Null, "0")
}
