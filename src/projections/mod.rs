// ABOUTME: Projector seam: folds the live envelope stream into narrower per-purpose state
// ABOUTME: Drives each projector on its own cancelable task and exposes change notifications
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Projections
//!
//! A [`Projector`] is pure state plus a fold function. [`Projection`] attaches
//! one to a [`StreamHandle`]: it subscribes, spawns a task that applies each
//! envelope in arrival order, and bumps a version counter whenever the fold
//! reports a change. Dropping the `Projection` (or calling
//! [`Projection::detach`]) cancels the task, so nothing is dispatched into a
//! projector after its owner is gone.

/// Agent conversation activity
pub mod conversation;
/// Notification rolling list
pub mod notifications;
/// Workflow run progress state machine
pub mod workflow;

use std::ops::Deref;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::events::EventEnvelope;
use crate::sse::StreamHandle;

pub use conversation::{ConversationActivity, ConversationState};
pub use notifications::NotificationFeed;
pub use workflow::{WorkflowProgress, WorkflowProgressState, WorkflowStatus};

/// Folds envelopes into derived state
pub trait Projector: Send + Sync + 'static {
    /// Apply one envelope, returning whether the state changed
    ///
    /// Envelopes the projector does not recognize or whose correlation key
    /// does not match must leave the state untouched and return `false`.
    fn apply(&mut self, envelope: &EventEnvelope) -> bool;
}

/// Shared access to an attached projector's state
pub struct ProjectionHandle<P> {
    state: Arc<RwLock<P>>,
    version: Arc<watch::Sender<u64>>,
    stream: StreamHandle,
}

impl<P> Clone for ProjectionHandle<P> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            version: Arc::clone(&self.version),
            stream: self.stream.clone(),
        }
    }
}

impl<P: Projector> ProjectionHandle<P> {
    /// Read the projector state
    pub async fn read<R>(&self, f: impl FnOnce(&P) -> R) -> R {
        let state = self.state.read().await;
        f(&state)
    }

    /// Mutate the projector state; a `true` result notifies watchers
    pub async fn modify(&self, f: impl FnOnce(&mut P) -> bool) -> bool {
        let changed = {
            let mut state = self.state.write().await;
            f(&mut state)
        };
        if changed {
            self.bump();
        }
        changed
    }

    /// Receiver that changes whenever the state changes
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Number of state changes so far
    #[must_use]
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Pass-through of the connection's health
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.stream.is_connected()
    }

    /// The stream this projection reads from
    #[must_use]
    pub const fn stream(&self) -> &StreamHandle {
        &self.stream
    }

    fn bump(&self) {
        self.version.send_modify(|version| *version += 1);
    }
}

/// A projector attached to a live stream
pub struct Projection<P> {
    handle: ProjectionHandle<P>,
    task: Option<JoinHandle<()>>,
}

impl<P: Projector> Projection<P> {
    /// Subscribe `projector` to `stream` and start folding
    ///
    /// Only envelopes received after this call are applied. Outside an async
    /// runtime nothing is spawned and the projection starts detached.
    #[must_use]
    pub fn attach(stream: &StreamHandle, projector: P) -> Self {
        let (version, _) = watch::channel(0_u64);
        let handle = ProjectionHandle {
            state: Arc::new(RwLock::new(projector)),
            version: Arc::new(version),
            stream: stream.clone(),
        };

        let mut subscription = stream.subscribe();
        let task_handle = handle.clone();
        let fold = async move {
            while let Some(envelope) = subscription.recv().await {
                let changed = task_handle.state.write().await.apply(&envelope);
                if changed {
                    task_handle.bump();
                }
            }
            debug!("Projection source closed");
        };
        let task = match Handle::try_current() {
            Ok(runtime) => Some(runtime.spawn(fold)),
            Err(e) => {
                error!(error = %e, "Cannot attach projection outside an async runtime");
                None
            }
        };

        Self { handle, task }
    }

    /// Clone of the shared state handle
    #[must_use]
    pub fn handle(&self) -> ProjectionHandle<P> {
        self.handle.clone()
    }

    /// Stop receiving envelopes; the current state remains readable
    pub fn detach(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// True while envelopes are still being applied
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl<P> Deref for Projection<P> {
    type Target = ProjectionHandle<P>;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl<P> Drop for Projection<P> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
