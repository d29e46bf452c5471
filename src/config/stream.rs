// ABOUTME: Stream connection configuration: endpoint, capacities, and reconnection policy
// ABOUTME: Loaded from SAAS_EVENTS_* environment variables with reference defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::env;

use serde::{Deserialize, Serialize};
use url::Url;

use super::presentation::ToastConfig;
use crate::constants::{env_vars, stream_defaults};
use crate::errors::{AppError, AppResult};
use crate::sse::backoff::ReconnectPolicy;

/// Configuration for one tenant stream session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Event server base URL (scheme, host, optional path prefix)
    pub base_url: String,
    /// Path of the streaming endpoint below `base_url`
    pub stream_path: String,
    /// Query parameter that carries the bearer credential
    pub credential_param: String,
    /// Connect timeout for the streaming request in seconds
    pub connect_timeout_secs: u64,
    /// Capacity of the global event history
    pub history_capacity: usize,
    /// Capacity of the in-process fan-out channel to projectors
    pub broadcast_capacity: usize,
    /// Capacity of the notification rolling list
    pub notification_capacity: usize,
    /// Reconnection schedule
    pub reconnect: ReconnectPolicy,
    /// Toast presentation settings
    pub toasts: ToastConfig,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            base_url: stream_defaults::BASE_URL.to_owned(),
            stream_path: stream_defaults::STREAM_PATH.to_owned(),
            credential_param: stream_defaults::CREDENTIAL_PARAM.to_owned(),
            connect_timeout_secs: stream_defaults::CONNECT_TIMEOUT_SECS,
            history_capacity: stream_defaults::HISTORY_CAPACITY,
            broadcast_capacity: stream_defaults::BROADCAST_CAPACITY,
            notification_capacity: stream_defaults::NOTIFICATION_CAPACITY,
            reconnect: ReconnectPolicy::default(),
            toasts: ToastConfig::default(),
        }
    }
}

impl StreamConfig {
    /// Load configuration from environment
    ///
    /// Unset or unparsable values fall back to the reference defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            base_url: env_var_or(env_vars::BASE_URL, stream_defaults::BASE_URL),
            stream_path: env_var_or(env_vars::STREAM_PATH, stream_defaults::STREAM_PATH),
            credential_param: env_var_or(
                env_vars::CREDENTIAL_PARAM,
                stream_defaults::CREDENTIAL_PARAM,
            ),
            connect_timeout_secs: env::var(env_vars::CONNECT_TIMEOUT_SECS)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(stream_defaults::CONNECT_TIMEOUT_SECS),
            history_capacity: env::var(env_vars::HISTORY_CAPACITY)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(stream_defaults::HISTORY_CAPACITY),
            broadcast_capacity: env::var(env_vars::BROADCAST_CAPACITY)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(stream_defaults::BROADCAST_CAPACITY),
            notification_capacity: env::var(env_vars::NOTIFICATION_CAPACITY)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(stream_defaults::NOTIFICATION_CAPACITY),
            reconnect: ReconnectPolicy::from_env(),
            toasts: ToastConfig::from_env(),
        }
    }

    /// Load from environment and validate
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting configuration is invalid
    pub fn load() -> AppResult<Self> {
        let config = Self::from_env();
        config.validate()?;
        Ok(config)
    }

    /// Full URL of the streaming endpoint, without credential
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` and `stream_path` do not form a valid URL
    pub fn endpoint_url(&self) -> AppResult<Url> {
        let base = self.base_url.trim_end_matches('/');
        let path = self.stream_path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting
    pub fn validate(&self) -> AppResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(AppError::config_missing(env_vars::BASE_URL));
        }
        let endpoint = self.endpoint_url()?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(AppError::config(format!(
                "unsupported stream URL scheme: {}",
                endpoint.scheme()
            )));
        }
        if self.credential_param.trim().is_empty() {
            return Err(AppError::config("credential parameter name cannot be empty"));
        }
        if self.history_capacity == 0 {
            return Err(AppError::config("history capacity must be greater than 0"));
        }
        if self.broadcast_capacity == 0 {
            return Err(AppError::config("broadcast capacity must be greater than 0"));
        }
        if self.notification_capacity == 0 {
            return Err(AppError::config(
                "notification capacity must be greater than 0",
            ));
        }
        self.reconnect.validate()?;
        self.toasts.validate()
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}
