// ABOUTME: Session-scoped owner of one tenant stream and everything derived from it
// ABOUTME: Construct to start, drop or shut down to cancel the connection, projectors, and toast timers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Realtime Session
//!
//! Replaces a process-wide stream singleton with an explicitly owned value.
//! Consumers hold handles obtained from the session; nothing is looked up
//! globally. Tearing the session down stops every background task it started.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::config::StreamConfig;
use crate::errors::AppResult;
use crate::projections::{
    ConversationActivity, NotificationFeed, Projection, ProjectionHandle, WorkflowProgress,
};
use crate::sse::{ConnectionManager, ConnectionStatus, EventTransport, StreamHandle};
use crate::toast::{Toast, ToastPresenter};

/// One user session's real-time subsystem
pub struct RealtimeSession {
    id: Uuid,
    manager: ConnectionManager,
    notifications: Projection<NotificationFeed>,
    toasts: ToastPresenter,
}

impl RealtimeSession {
    /// Build an idle session over `transport`
    ///
    /// Nothing connects until [`connect`](Self::connect) or
    /// [`configure`](Self::configure) supplies a credential.
    #[must_use]
    pub fn new(config: &StreamConfig, transport: Arc<dyn EventTransport>) -> Self {
        let manager = ConnectionManager::new(config, transport);
        Self::assemble(config, manager)
    }

    /// Build an idle session over the HTTP SSE transport
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn from_config(config: &StreamConfig) -> AppResult<Self> {
        let manager = ConnectionManager::from_config(config)?;
        Ok(Self::assemble(config, manager))
    }

    fn assemble(config: &StreamConfig, manager: ConnectionManager) -> Self {
        let notifications = Projection::attach(
            &manager.handle(),
            NotificationFeed::new(config.notification_capacity),
        );
        let toasts = ToastPresenter::spawn(notifications.handle(), &config.toasts);
        let id = Uuid::new_v4();
        info!(session_id = %id, "Realtime session created");

        Self {
            id,
            manager,
            notifications,
            toasts,
        }
    }

    /// Session identifier used in logs
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Enable and connect with `credential`
    pub fn connect(&self, credential: impl Into<String>) {
        self.manager.connect(credential);
    }

    /// Apply credential and enabled flag
    pub fn configure(&self, credential: Option<String>, enabled: bool) {
        self.manager.configure(credential, enabled);
    }

    /// The connection manager
    #[must_use]
    pub const fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Read handle on the stream
    #[must_use]
    pub fn stream(&self) -> StreamHandle {
        self.manager.handle()
    }

    /// Current connection status
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.manager.status()
    }

    /// The session's notification feed
    #[must_use]
    pub fn notifications(&self) -> ProjectionHandle<NotificationFeed> {
        self.notifications.handle()
    }

    /// The session's toast presenter
    #[must_use]
    pub const fn toasts(&self) -> &ToastPresenter {
        &self.toasts
    }

    /// Visible toasts, newest first
    pub async fn visible_toasts(&self) -> Vec<Toast> {
        self.toasts.visible().await
    }

    /// Observe one workflow; the caller owns the returned projection
    #[must_use]
    pub fn watch_workflow(&self, workflow_id: impl Into<String>) -> Projection<WorkflowProgress> {
        Projection::attach(&self.manager.handle(), WorkflowProgress::new(workflow_id))
    }

    /// Observe one agent conversation; the caller owns the returned projection
    #[must_use]
    pub fn watch_conversation(
        &self,
        conversation_id: impl Into<String>,
    ) -> Projection<ConversationActivity> {
        Projection::attach(
            &self.manager.handle(),
            ConversationActivity::new(conversation_id),
        )
    }

    /// Cancel the connection, the notification projector, and toast timers
    ///
    /// Caller-owned projections stay readable but receive nothing further.
    pub fn shutdown(&mut self) {
        self.manager.disconnect();
        self.notifications.detach();
        self.toasts.shutdown();
        info!(session_id = %self.id, "Realtime session shut down");
    }
}

impl Drop for RealtimeSession {
    fn drop(&mut self) {
        self.manager.disconnect();
        self.notifications.detach();
        self.toasts.shutdown();
    }
}
