// ABOUTME: Exponential reconnection schedule for the tenant event stream
// ABOUTME: Computes capped per-attempt delays and the give-up threshold
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{env_vars, stream_defaults};
use crate::errors::{AppError, AppResult};

/// Reconnection policy applied after transport failures
///
/// `delay = min(initial_delay_ms * 2^attempt, max_delay_ms)`; once `attempt`
/// reaches `max_attempts` no further attempt is scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectPolicy {
    /// Delay before the first retry (milliseconds)
    pub initial_delay_ms: u64,
    /// Maximum delay cap for exponential backoff (milliseconds)
    pub max_delay_ms: u64,
    /// Consecutive failures tolerated before giving up
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: stream_defaults::RECONNECT_INITIAL_DELAY_MS,
            max_delay_ms: stream_defaults::RECONNECT_MAX_DELAY_MS,
            max_attempts: stream_defaults::RECONNECT_MAX_ATTEMPTS,
        }
    }
}

impl ReconnectPolicy {
    /// Load the policy from environment, falling back to reference defaults
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            initial_delay_ms: env::var(env_vars::RECONNECT_INITIAL_DELAY_MS)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.initial_delay_ms),
            max_delay_ms: env::var(env_vars::RECONNECT_MAX_DELAY_MS)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_delay_ms),
            max_attempts: env::var(env_vars::RECONNECT_MAX_ATTEMPTS)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_attempts),
        }
    }

    /// Delay to wait before the retry following failure number `attempt + 1`
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1_u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let base_delay = self.initial_delay_ms.saturating_mul(factor);
        Duration::from_millis(base_delay.min(self.max_delay_ms))
    }

    /// Whether a failure observed at `attempt` may still schedule a retry
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Check the policy is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if the initial delay is zero or exceeds the cap
    pub fn validate(&self) -> AppResult<()> {
        if self.initial_delay_ms == 0 {
            return Err(AppError::config(
                "reconnect initial delay must be greater than 0",
            ));
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(AppError::config(format!(
                "reconnect initial delay ({}ms) exceeds max delay ({}ms)",
                self.initial_delay_ms, self.max_delay_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_double_until_capped() {
        let policy = ReconnectPolicy::default();
        let delays: Vec<u128> = (0..7)
            .map(|attempt| policy.delay_for_attempt(attempt).as_millis())
            .collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16_000, 30_000, 30_000]);
    }

    #[test]
    fn huge_attempt_numbers_saturate() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for_attempt(200), Duration::from_millis(30_000));
    }

    #[test]
    fn gives_up_at_max_attempts() {
        let policy = ReconnectPolicy::default();
        assert!(policy.should_retry(0));
        assert!(policy.should_retry(4));
        assert!(!policy.should_retry(5));
    }

    #[test]
    fn rejects_inverted_bounds() {
        let policy = ReconnectPolicy {
            initial_delay_ms: 5000,
            max_delay_ms: 1000,
            max_attempts: 3,
        };
        assert!(policy.validate().is_err());
        assert!(ReconnectPolicy::default().validate().is_ok());
    }
}
