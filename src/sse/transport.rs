// ABOUTME: Transport seam that opens one streaming connection for a bearer credential
// ABOUTME: HTTP implementation sends the credential in the query string and frames the body as SSE
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Stream Transport
//!
//! The event endpoint is consumed with the same constraints as a browser
//! `EventSource`: no custom request headers. The bearer credential therefore
//! travels in the request URL. Operators should treat proxy and access logs on
//! that path as credential-bearing.

use std::sync::Once;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use super::parser::{frame_stream, FrameStream};
use crate::config::StreamConfig;
use crate::errors::{AppError, AppResult};

static CREDENTIAL_IN_URL_WARNING: Once = Once::new();

/// Opens streaming connections to the event server
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Open one connection scoped to `credential`
    ///
    /// Resolves once the server has accepted the stream; the returned frames
    /// end when the server closes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is refused, times out, or the server
    /// answers with a non-success status
    async fn open(&self, credential: &str) -> AppResult<FrameStream>;
}

/// SSE over HTTP via `reqwest`
#[derive(Clone)]
pub struct HttpSseTransport {
    client: Client,
    endpoint: Url,
    credential_param: String,
}

impl HttpSseTransport {
    /// Build a transport for the configured endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URL is invalid or the HTTP client
    /// cannot be constructed
    pub fn new(config: &StreamConfig) -> AppResult<Self> {
        let endpoint = config.endpoint_url()?;
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| AppError::config(format!("failed to build HTTP client: {e}")))?;

        CREDENTIAL_IN_URL_WARNING.call_once(|| {
            warn!(
                endpoint = %endpoint,
                param = %config.credential_param,
                "Stream credential is sent in the request URL; it may appear in proxy and access logs"
            );
        });

        Ok(Self {
            client,
            endpoint,
            credential_param: config.credential_param.clone(),
        })
    }

    /// Full request URL for a credential
    #[must_use]
    pub fn request_url(&self, credential: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair(&self.credential_param, credential);
        url
    }
}

#[async_trait]
impl EventTransport for HttpSseTransport {
    async fn open(&self, credential: &str) -> AppResult<FrameStream> {
        let url = self.request_url(credential);
        let redacted = redact_credential(&url, &self.credential_param);
        debug!(url = %redacted, "Opening event stream");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::from_status(status.as_u16(), &body));
        }

        info!(url = %redacted, status = %status, "Event stream accepted");
        Ok(frame_stream(response.bytes_stream()))
    }
}

/// Copy of `url` with the credential parameter value masked, for logging
#[must_use]
pub fn redact_credential(url: &Url, credential_param: &str) -> String {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == credential_param {
                "[REDACTED]".to_owned()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();

    let mut redacted = url.clone();
    if pairs.is_empty() {
        return redacted.to_string();
    }
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_is_appended_as_query_parameter() {
        let config = StreamConfig {
            base_url: "https://events.example.com".to_owned(),
            ..StreamConfig::default()
        };
        let transport = HttpSseTransport::new(&config).unwrap();
        let url = transport.request_url("abc def");
        assert_eq!(
            url.as_str(),
            "https://events.example.com/api/events/stream?token=abc+def"
        );
    }

    #[test]
    fn redaction_masks_only_the_credential() {
        let url = Url::parse("https://h/api/events/stream?v=2&token=secret").unwrap();
        let redacted = redact_credential(&url, "token");
        assert!(!redacted.contains("secret"));
        assert!(redacted.contains("v=2"));
        assert!(redacted.contains("token=%5BREDACTED%5D"));
    }
}
