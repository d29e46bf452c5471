// ABOUTME: Cancelable subscription handle over the connection manager's envelope fan-out
// ABOUTME: Dropping the handle unsubscribes; lagging receivers skip ahead instead of failing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use crate::events::EventEnvelope;

/// One consumer's view of the live envelope stream
///
/// Envelopes arrive in transport order. A subscriber that falls more than the
/// channel capacity behind loses the overflowed envelopes and continues from
/// the oldest one still buffered.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<EventEnvelope>,
}

impl Subscription {
    pub(crate) const fn new(receiver: broadcast::Receiver<EventEnvelope>) -> Self {
        Self { receiver }
    }

    /// Wait for the next envelope
    ///
    /// Returns `None` once the owning connection manager is gone.
    pub async fn recv(&mut self) -> Option<EventEnvelope> {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) => return Some(envelope),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Subscriber lagged behind event stream");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
