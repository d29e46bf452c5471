// ABOUTME: Server-Sent Events framing for the inbound tenant event stream
// ABOUTME: Adapts the HTTP byte stream through eventsource-stream into dispatchable frames
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # SSE Framing
//!
//! Line protocol handling (partial lines across chunks, multi-line `data:`,
//! comment keep-alives, blank-line dispatch) is done by `eventsource-stream`.
//! This module maps its events into [`SseFrame`] and its errors into
//! [`AppError`]. `retry:` is ignored because the reconnection schedule is owned
//! by [`super::backoff::ReconnectPolicy`].

use std::pin::Pin;

use bytes::Bytes;
use eventsource_stream::{Event, EventStreamError, Eventsource};
use futures_util::{future, Stream, StreamExt};

use crate::constants::event_types::DEFAULT_SSE_EVENT;
use crate::errors::{AppError, AppResult};

/// Stream of parsed frames handed to the connection manager
pub type FrameStream = Pin<Box<dyn Stream<Item = AppResult<SseFrame>> + Send>>;

/// One dispatched SSE frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the `event:` field, if present
    pub event: Option<String>,
    /// Concatenated `data:` lines
    pub data: String,
    /// Value of the `id:` field, if present
    pub id: Option<String>,
}

impl SseFrame {
    /// Frame carrying only data, dispatched on the default channel
    #[must_use]
    pub fn data(data: impl Into<String>) -> Self {
        Self {
            event: None,
            data: data.into(),
            id: None,
        }
    }

    /// Frame carrying a named event
    #[must_use]
    pub fn named(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: Some(event.into()),
            data: data.into(),
            id: None,
        }
    }

    /// Channel name used for dispatch (`message` when unnamed)
    #[must_use]
    pub fn event_name(&self) -> &str {
        self.event.as_deref().unwrap_or(DEFAULT_SSE_EVENT)
    }
}

impl From<Event> for SseFrame {
    fn from(event: Event) -> Self {
        Self {
            event: Some(event.event).filter(|name| !name.is_empty()),
            data: event.data,
            id: Some(event.id).filter(|id| !id.is_empty()),
        }
    }
}

fn frame_error(error: EventStreamError<reqwest::Error>) -> AppError {
    match error {
        EventStreamError::Transport(e) => AppError::from(e),
        EventStreamError::Utf8(e) => {
            AppError::invalid_format(format!("event stream is not valid UTF-8: {e}"))
                .with_source(e)
        }
        EventStreamError::Parser(e) => {
            AppError::invalid_format(format!("malformed event stream: {e}"))
        }
    }
}

/// Wrap a raw byte stream with SSE framing
///
/// Frames without data are dropped. A read error is yielded once and ends the
/// stream.
#[must_use]
pub fn frame_stream<S>(byte_stream: S) -> FrameStream
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    let frames = byte_stream
        .eventsource()
        .filter_map(|item| {
            future::ready(match item {
                Ok(event) if event.data.is_empty() => None,
                Ok(event) => Some(Ok(SseFrame::from(event))),
                Err(e) => Some(Err(frame_error(e))),
            })
        })
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            *failed = item.is_err();
            future::ready(Some(item))
        });

    Box::pin(frames)
}
