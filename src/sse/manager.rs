// ABOUTME: Connection manager owning the single tenant event stream of one session
// ABOUTME: Opens, reconnects with capped exponential backoff, records history, and fans out envelopes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Connection Manager
//!
//! One [`ConnectionManager`] owns at most one live stream at a time. The
//! connection runs on a background worker task; every teardown (disconnect,
//! credential change, reconnect, drop) bumps a generation counter before
//! aborting the worker, and every status update or delivery from a worker is
//! checked against that counter. A stale worker therefore cannot resurrect a
//! torn-down connection even if it is mid-step when aborted.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::backoff::ReconnectPolicy;
use super::parser::{FrameStream, SseFrame};
use super::subscription::Subscription;
use super::transport::{EventTransport, HttpSseTransport};
use crate::config::StreamConfig;
use crate::errors::{AppError, AppResult};
use crate::events::{EventEnvelope, EventHistory, EventKind};

/// Lifecycle state of the stream connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection and no pending attempt
    Disconnected,
    /// Opening a connection
    Connecting,
    /// Stream accepted and delivering
    Connected,
    /// Waiting for the backoff timer before the next attempt
    Reconnecting,
}

/// Health badge derived from the connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthIndicator {
    /// Connected and receiving
    Live,
    /// Transient: opening or waiting to retry
    Reconnecting,
    /// Retry budget exhausted; needs an explicit reconnect
    Offline,
    /// Not configured to connect
    Idle,
}

impl fmt::Display for HealthIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Live => "live",
            Self::Reconnecting => "reconnecting",
            Self::Offline => "offline",
            Self::Idle => "idle",
        };
        f.write_str(label)
    }
}

/// Observable connection health
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionStatus {
    /// Current lifecycle state
    pub state: ConnectionState,
    /// Consecutive failed attempts since the last successful open
    pub attempt: u32,
    /// Most recent failure, cleared on successful open
    pub error: Option<String>,
    /// Delay of the pending retry while `Reconnecting`
    pub retry_in: Option<Duration>,
    /// When the current connection was accepted
    pub connected_since: Option<DateTime<Utc>>,
    /// Retry budget exhausted
    pub gave_up: bool,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            attempt: 0,
            error: None,
            retry_in: None,
            connected_since: None,
            gave_up: false,
        }
    }
}

impl ConnectionStatus {
    /// True while the stream is accepted and delivering
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Badge shown to the user
    #[must_use]
    pub fn indicator(&self) -> HealthIndicator {
        match self.state {
            ConnectionState::Connected => HealthIndicator::Live,
            ConnectionState::Connecting | ConnectionState::Reconnecting => {
                HealthIndicator::Reconnecting
            }
            ConnectionState::Disconnected if self.gave_up || self.error.is_some() => {
                HealthIndicator::Offline
            }
            ConnectionState::Disconnected => HealthIndicator::Idle,
        }
    }
}

/// State shared between the manager, its handles, and the worker
struct Shared {
    status: watch::Sender<ConnectionStatus>,
    history: RwLock<EventHistory>,
    last_event: RwLock<Option<EventEnvelope>>,
    events: broadcast::Sender<EventEnvelope>,
    generation: AtomicU64,
}

impl Shared {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Apply `update` unless the worker that issued it has been superseded
    fn update_status(&self, generation: u64, update: impl FnOnce(&mut ConnectionStatus)) {
        self.status.send_if_modified(|status| {
            if !self.is_current(generation) {
                return false;
            }
            update(status);
            true
        });
    }

    /// Record and fan out `envelope` unless its worker has been superseded
    ///
    /// The generation is checked under the history write lock, which
    /// `clear_received` also takes after a teardown bumps the generation. A
    /// stale worker either lands before the clear or is dropped.
    fn deliver(&self, generation: u64, envelope: EventEnvelope) {
        let mut history = self.history.write().unwrap_or_else(PoisonError::into_inner);
        if !self.is_current(generation) {
            return;
        }
        history.push(envelope.clone());
        *self
            .last_event
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(envelope.clone());

        if let Err(unsent) = self.events.send(envelope) {
            debug!(event_type = %unsent.0.kind, "No active subscribers for event");
        }
        drop(history);
    }

    fn clear_received(&self) {
        self.history
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        *self
            .last_event
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Cheap, cloneable read access to a connection manager's outputs
///
/// Projectors hold one of these; it never drives the connection.
#[derive(Clone)]
pub struct StreamHandle {
    shared: Arc<Shared>,
}

impl fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandle")
            .field("status", &*self.shared.status.borrow())
            .finish_non_exhaustive()
    }
}

impl StreamHandle {
    /// Subscribe to envelopes received from now on
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription::new(self.shared.events.subscribe())
    }

    /// Watch connection status changes
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status.subscribe()
    }

    /// Current connection status
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.shared.status.borrow().clone()
    }

    /// True while the stream is accepted and delivering
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.shared.status.borrow().is_connected()
    }

    /// Most recent failure, if any
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.shared.status.borrow().error.clone()
    }

    /// Snapshot of the history, newest first
    #[must_use]
    pub fn history(&self) -> Vec<EventEnvelope> {
        self.shared
            .history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    /// History entries matching `predicate`, newest first
    #[must_use]
    pub fn history_filtered(
        &self,
        predicate: impl Fn(&EventEnvelope) -> bool,
    ) -> Vec<EventEnvelope> {
        self.shared
            .history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|envelope| predicate(envelope))
            .cloned()
            .collect()
    }

    /// Most recently received envelope
    #[must_use]
    pub fn last_event(&self) -> Option<EventEnvelope> {
        self.shared
            .last_event
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Caller-controlled inputs and the running worker
#[derive(Default)]
struct Control {
    credential: Option<String>,
    enabled: bool,
    worker: Option<JoinHandle<()>>,
}

/// Owner of one tenant stream connection
pub struct ConnectionManager {
    handle: StreamHandle,
    transport: Arc<dyn EventTransport>,
    policy: ReconnectPolicy,
    control: Mutex<Control>,
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("policy", &self.policy)
            .field("status", &self.handle.status())
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    /// Create an idle manager over `transport`
    #[must_use]
    pub fn new(config: &StreamConfig, transport: Arc<dyn EventTransport>) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::default());
        let (events, _) = broadcast::channel(config.broadcast_capacity.max(1));
        let shared = Arc::new(Shared {
            status,
            history: RwLock::new(EventHistory::new(config.history_capacity)),
            last_event: RwLock::new(None),
            events,
            generation: AtomicU64::new(0),
        });

        Self {
            handle: StreamHandle { shared },
            transport,
            policy: config.reconnect.clone(),
            control: Mutex::new(Control::default()),
        }
    }

    /// Create an idle manager over the HTTP SSE transport
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn from_config(config: &StreamConfig) -> AppResult<Self> {
        config.validate()?;
        let transport = HttpSseTransport::new(config)?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    fn control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply caller inputs
    ///
    /// Connects when enabled with a non-empty credential. Any change of either
    /// input tears the old connection down before a new one is opened; calling
    /// again with unchanged inputs leaves a running connection alone.
    pub fn configure(&self, credential: Option<String>, enabled: bool) {
        let credential = credential.filter(|c| !c.trim().is_empty());
        let mut control = self.control();

        let unchanged = control.credential == credential && control.enabled == enabled;
        if unchanged && control.worker.is_some() {
            return;
        }

        let credential_changed = control.credential != credential;
        self.teardown(&mut control);
        if credential_changed {
            self.handle.shared.clear_received();
        }
        control.credential = credential;
        control.enabled = enabled;
        self.start(&mut control);
    }

    /// Enable and connect with `credential`
    pub fn connect(&self, credential: impl Into<String>) {
        self.configure(Some(credential.into()), true);
    }

    /// Replace the credential, keeping the enabled flag
    pub fn set_credential(&self, credential: Option<String>) {
        let enabled = self.control().enabled;
        self.configure(credential, enabled);
    }

    /// Enable or disable, keeping the credential
    pub fn set_enabled(&self, enabled: bool) {
        let credential = self.control().credential.clone();
        self.configure(credential, enabled);
    }

    /// Cancel any pending retry, reset the attempt budget, and connect now
    pub fn reconnect(&self) {
        let mut control = self.control();
        self.teardown(&mut control);
        self.start(&mut control);
    }

    /// Close the connection and cancel any pending retry
    ///
    /// Idempotent. The credential and enabled flag are kept, so a later
    /// [`reconnect`](Self::reconnect) resumes with them.
    pub fn disconnect(&self) {
        let mut control = self.control();
        if control.worker.is_some() {
            info!("Disconnecting event stream");
        }
        self.teardown(&mut control);
    }

    /// Read handle for projectors and observers
    #[must_use]
    pub fn handle(&self) -> StreamHandle {
        self.handle.clone()
    }

    /// Subscribe to envelopes received from now on
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        self.handle.subscribe()
    }

    /// Watch connection status changes
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.handle.watch_status()
    }

    /// Current connection status
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.handle.status()
    }

    /// True while the stream is accepted and delivering
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.handle.is_connected()
    }

    /// Most recent failure, if any
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.handle.last_error()
    }

    /// Snapshot of the history, newest first
    #[must_use]
    pub fn history(&self) -> Vec<EventEnvelope> {
        self.handle.history()
    }

    /// Most recently received envelope
    #[must_use]
    pub fn last_event(&self) -> Option<EventEnvelope> {
        self.handle.last_event()
    }

    /// Invalidate and stop the current worker, then reset status
    fn teardown(&self, control: &mut Control) {
        let shared = &self.handle.shared;
        shared.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(worker) = control.worker.take() {
            worker.abort();
        }
        shared.status.send_replace(ConnectionStatus::default());
    }

    fn start(&self, control: &mut Control) {
        if !control.enabled {
            return;
        }
        let Some(credential) = control.credential.clone() else {
            return;
        };

        let shared = &self.handle.shared;
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = %e, "Cannot start event stream outside an async runtime");
                shared.status.send_modify(|status| {
                    status.error = Some(format!("no async runtime: {e}"));
                });
                return;
            }
        };

        let generation = shared.generation.load(Ordering::SeqCst);
        let worker = StreamWorker {
            shared: Arc::clone(shared),
            transport: Arc::clone(&self.transport),
            policy: self.policy.clone(),
            credential,
            generation,
        };
        control.worker = Some(runtime.spawn(worker.run()));
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        let control = self
            .control
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        self.handle
            .shared
            .generation
            .fetch_add(1, Ordering::SeqCst);
        if let Some(worker) = control.worker.take() {
            worker.abort();
        }
    }
}

/// Background task driving one credential's connection
struct StreamWorker {
    shared: Arc<Shared>,
    transport: Arc<dyn EventTransport>,
    policy: ReconnectPolicy,
    credential: String,
    generation: u64,
}

impl StreamWorker {
    async fn run(self) {
        let mut attempt: u32 = 0;
        // Tenant named by the server's handshake; lives as long as this worker
        let mut tenant_scope: Option<String> = None;

        loop {
            self.shared.update_status(self.generation, |status| {
                status.state = ConnectionState::Connecting;
                status.retry_in = None;
            });
            debug!(attempt, "Opening event stream connection");

            let failure = match self.transport.open(&self.credential).await {
                Ok(frames) => {
                    attempt = 0;
                    self.shared.update_status(self.generation, |status| {
                        status.state = ConnectionState::Connected;
                        status.attempt = 0;
                        status.error = None;
                        status.gave_up = false;
                        status.connected_since = Some(Utc::now());
                    });
                    info!("Event stream connected");
                    self.pump(frames, &mut tenant_scope).await
                }
                Err(e) => e,
            };

            if !self.shared.is_current(self.generation) {
                return;
            }

            let message = failure.to_string();
            if !self.policy.should_retry(attempt) {
                warn!(
                    attempt,
                    error = %message,
                    "Event stream retry budget exhausted, giving up"
                );
                self.shared.update_status(self.generation, |status| {
                    status.state = ConnectionState::Disconnected;
                    status.attempt = attempt;
                    status.error = Some(message);
                    status.retry_in = None;
                    status.connected_since = None;
                    status.gave_up = true;
                });
                return;
            }

            let delay = self.policy.delay_for_attempt(attempt);
            attempt += 1;
            warn!(
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %message,
                "Event stream lost, scheduling reconnect"
            );
            self.shared.update_status(self.generation, |status| {
                status.state = ConnectionState::Reconnecting;
                status.attempt = attempt;
                status.error = Some(message);
                status.retry_in = Some(delay);
                status.connected_since = None;
            });

            sleep(delay).await;
        }
    }

    /// Deliver frames until the stream ends, returning why it ended
    async fn pump(&self, mut frames: FrameStream, tenant_scope: &mut Option<String>) -> AppError {
        while let Some(item) = frames.next().await {
            match item {
                Ok(frame) => self.dispatch(&frame, tenant_scope),
                Err(e) => return e,
            }
        }
        AppError::transport("event stream closed by server")
    }

    fn dispatch(&self, frame: &SseFrame, tenant_scope: &mut Option<String>) {
        let envelope = match EventEnvelope::parse(&frame.data) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(
                    sse_event = frame.event_name(),
                    error = %e,
                    "Dropping malformed event envelope"
                );
                return;
            }
        };

        if EventKind::from_name(frame.event_name()).is_registered() {
            debug!(event_type = %envelope.kind, "Event received");
        } else {
            debug!(
                sse_event = frame.event_name(),
                event_type = %envelope.kind,
                "Event received on fallback channel"
            );
        }

        if envelope.kind == EventKind::Connected {
            info!(tenant_id = %envelope.tenant_id, "Event stream handshake received");
            *tenant_scope = Some(envelope.tenant_id.clone());
        } else if let Some(tenant) = tenant_scope.as_deref() {
            if envelope.tenant_id != tenant {
                warn!(
                    tenant_id = %envelope.tenant_id,
                    expected_tenant_id = %tenant,
                    event_type = %envelope.kind,
                    "Dropping event from foreign tenant scope"
                );
                return;
            }
        }

        self.shared.deliver(self.generation, envelope);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shared() -> Shared {
        let (status, _) = watch::channel(ConnectionStatus::default());
        let (events, _) = broadcast::channel(8);
        Shared {
            status,
            history: RwLock::new(EventHistory::new(4)),
            last_event: RwLock::new(None),
            events,
            generation: AtomicU64::new(1),
        }
    }

    fn notification(timestamp: &str) -> EventEnvelope {
        EventEnvelope::new(EventKind::NotificationInfo, "t1", json!({}), timestamp)
    }

    #[test]
    fn superseded_worker_delivers_nothing() {
        let shared = shared();
        let mut receiver = shared.events.subscribe();

        shared.deliver(1, notification("1"));
        shared.generation.fetch_add(1, Ordering::SeqCst);
        shared.clear_received();
        shared.deliver(1, notification("2"));

        assert_eq!(shared.history.read().unwrap().len(), 0);
        assert!(shared.last_event.read().unwrap().is_none());
        assert_eq!(receiver.try_recv().unwrap().timestamp, "1");
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn current_worker_records_and_broadcasts() {
        let shared = shared();
        let mut receiver = shared.events.subscribe();

        shared.deliver(1, notification("1"));
        shared.deliver(1, notification("2"));

        let history = shared.history.read().unwrap().snapshot();
        let timestamps: Vec<&str> = history.iter().map(|e| e.timestamp.as_str()).collect();
        assert_eq!(timestamps, vec!["2", "1"]);
        assert_eq!(
            shared.last_event.read().unwrap().as_ref().map(|e| e.timestamp.as_str()),
            Some("2")
        );
        assert_eq!(receiver.try_recv().unwrap().timestamp, "1");
        assert_eq!(receiver.try_recv().unwrap().timestamp, "2");
    }

    #[test]
    fn stale_status_updates_are_ignored() {
        let shared = shared();
        shared.update_status(0, |status| status.state = ConnectionState::Connected);
        assert_eq!(shared.status.borrow().state, ConnectionState::Disconnected);

        shared.update_status(1, |status| status.state = ConnectionState::Connecting);
        assert_eq!(shared.status.borrow().state, ConnectionState::Connecting);
    }
}
