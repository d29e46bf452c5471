// ABOUTME: Toast presentation settings: visible cap and dwell time
// ABOUTME: Loaded from environment with reference defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{env_vars, stream_defaults};
use crate::errors::{AppError, AppResult};

/// Toast presentation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastConfig {
    /// Maximum number of toasts shown at once
    pub max_visible: usize,
    /// Time a toast stays visible unless dismissed (milliseconds)
    pub dwell_ms: u64,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            max_visible: stream_defaults::TOAST_MAX_VISIBLE,
            dwell_ms: stream_defaults::TOAST_DWELL_MS,
        }
    }
}

impl ToastConfig {
    /// Load toast settings from environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            max_visible: env::var(env_vars::TOAST_MAX_VISIBLE)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(stream_defaults::TOAST_MAX_VISIBLE),
            dwell_ms: env::var(env_vars::TOAST_DWELL_MS)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(stream_defaults::TOAST_DWELL_MS),
        }
    }

    /// Dwell time as a `Duration`
    #[must_use]
    pub const fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }

    /// Validate toast settings
    ///
    /// # Errors
    ///
    /// Returns an error if either value is zero
    pub fn validate(&self) -> AppResult<()> {
        if self.max_visible == 0 {
            return Err(AppError::config("toast visible cap must be greater than 0"));
        }
        if self.dwell_ms == 0 {
            return Err(AppError::config("toast dwell time must be greater than 0"));
        }
        Ok(())
    }
}
