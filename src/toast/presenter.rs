// ABOUTME: Background presenter turning notification feed changes and workflow events into toasts
// ABOUTME: Owns the dwell timers and keeps the notification feed consistent on expiry and dismissal
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Toast Presenter
//!
//! One task per presenter waits on three things at once: a change of the
//! notification feed, the next workflow envelope, and the earliest toast
//! deadline. Expired toasts that mirror a feed entry are removed from the feed
//! by timestamp, so the feed and the visible toasts never disagree.

use std::future::pending;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info};

use super::center::{Toast, ToastCenter};
use crate::config::ToastConfig;
use crate::projections::{NotificationFeed, ProjectionHandle};
use crate::sse::Subscription;

/// Running toast presenter
pub struct ToastPresenter {
    center: Arc<Mutex<ToastCenter>>,
    feed: ProjectionHandle<NotificationFeed>,
    changes: Arc<watch::Sender<u64>>,
    task: Option<JoinHandle<()>>,
}

impl ToastPresenter {
    /// Start presenting toasts for `feed` and its stream's workflow events
    ///
    /// Outside an async runtime nothing is spawned and the presenter stays
    /// idle; [`is_running`](Self::is_running) reports `false`.
    #[must_use]
    pub fn spawn(feed: ProjectionHandle<NotificationFeed>, config: &ToastConfig) -> Self {
        let center = Arc::new(Mutex::new(ToastCenter::new(config)));
        let (changes, _) = watch::channel(0_u64);
        let changes = Arc::new(changes);

        let worker = PresenterTask {
            center: Arc::clone(&center),
            feed: feed.clone(),
            changes: Arc::clone(&changes),
            feed_changes: feed.watch(),
            workflow_events: feed.stream().subscribe(),
        };
        let task = match Handle::try_current() {
            Ok(runtime) => Some(runtime.spawn(worker.run())),
            Err(e) => {
                error!(error = %e, "Cannot start toast presenter outside an async runtime");
                None
            }
        };

        Self {
            center,
            feed,
            changes,
            task,
        }
    }

    /// Visible toasts, newest first
    pub async fn visible(&self) -> Vec<Toast> {
        self.center.lock().await.visible()
    }

    /// Dismiss a toast before its dwell time ends
    ///
    /// A notification toast also removes its feed entry. Returns `false` if no
    /// visible toast has `id`.
    pub async fn dismiss(&self, id: u64) -> bool {
        let dismissed = self.center.lock().await.dismiss(id);
        let Some(toast) = dismissed else {
            return false;
        };
        debug!(toast_id = id, key = %toast.key, "Toast dismissed");
        if toast.from_notification() {
            self.feed.remove_by_timestamp(&toast.key).await;
        }
        self.changes.send_modify(|version| *version += 1);
        true
    }

    /// Receiver that changes whenever the visible list changes
    #[must_use]
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Stop presenting and cancel pending dwell timers
    pub fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// True while the presenter task runs
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for ToastPresenter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct PresenterTask {
    center: Arc<Mutex<ToastCenter>>,
    feed: ProjectionHandle<NotificationFeed>,
    changes: Arc<watch::Sender<u64>>,
    feed_changes: watch::Receiver<u64>,
    workflow_events: Subscription,
}

impl PresenterTask {
    async fn run(mut self) {
        loop {
            let deadline = self.center.lock().await.next_deadline();
            let expiry = async move {
                match deadline {
                    Some(deadline) => sleep_until(deadline).await,
                    None => pending::<()>().await,
                }
            };

            tokio::select! {
                changed = self.feed_changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.on_feed_change().await;
                }
                envelope = self.workflow_events.recv() => {
                    let Some(envelope) = envelope else {
                        break;
                    };
                    if envelope.kind.is_workflow_lifecycle() {
                        let created = self
                            .center
                            .lock()
                            .await
                            .observe_workflow(&envelope, Instant::now())
                            .is_some();
                        if created {
                            debug!(event_type = %envelope.kind, "Workflow toast shown");
                            self.notify();
                        }
                    }
                }
                () = expiry => {
                    self.on_expiry().await;
                }
            }
        }
        info!("Toast presenter stopped");
    }

    async fn on_feed_change(&self) {
        let entries = self.feed.notifications().await;
        let created = self
            .center
            .lock()
            .await
            .observe_feed(&entries, Instant::now());
        if created > 0 {
            debug!(created, "Notification toasts shown");
            self.notify();
        }
    }

    async fn on_expiry(&self) {
        let expired = self.center.lock().await.expire(Instant::now());
        if expired.is_empty() {
            return;
        }
        for toast in expired.iter().filter(|toast| toast.from_notification()) {
            self.feed.remove_by_timestamp(&toast.key).await;
        }
        debug!(expired = expired.len(), "Toasts expired");
        self.notify();
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version += 1);
    }
}
