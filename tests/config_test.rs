// ABOUTME: Tests for environment-driven stream configuration
// ABOUTME: Defaults, SAAS_EVENTS_* overrides, endpoint URL joining, and validation errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::env;
use std::time::Duration;

use saas_realtime::config::StreamConfig;
use saas_realtime::constants::env_vars;
use saas_realtime::errors::ErrorCode;
use serial_test::serial;

const ALL_VARS: &[&str] = &[
    env_vars::BASE_URL,
    env_vars::STREAM_PATH,
    env_vars::CREDENTIAL_PARAM,
    env_vars::CONNECT_TIMEOUT_SECS,
    env_vars::HISTORY_CAPACITY,
    env_vars::BROADCAST_CAPACITY,
    env_vars::NOTIFICATION_CAPACITY,
    env_vars::RECONNECT_INITIAL_DELAY_MS,
    env_vars::RECONNECT_MAX_DELAY_MS,
    env_vars::RECONNECT_MAX_ATTEMPTS,
    env_vars::TOAST_MAX_VISIBLE,
    env_vars::TOAST_DWELL_MS,
];

fn clear_env() {
    for var in ALL_VARS {
        env::remove_var(var);
    }
}

// ============================================================================
// Environment loading
// ============================================================================

#[test]
#[serial]
fn test_defaults_match_reference_values() {
    clear_env();
    let config = StreamConfig::from_env();

    assert_eq!(config.history_capacity, 50);
    assert_eq!(config.notification_capacity, 20);
    assert_eq!(config.reconnect.initial_delay_ms, 1000);
    assert_eq!(config.reconnect.max_delay_ms, 30_000);
    assert_eq!(config.reconnect.max_attempts, 5);
    assert_eq!(config.toasts.max_visible, 5);
    assert_eq!(config.toasts.dwell(), Duration::from_secs(5));
    config.validate().unwrap();
}

#[test]
#[serial]
fn test_env_overrides() {
    clear_env();
    env::set_var(env_vars::BASE_URL, "https://events.example.com");
    env::set_var(env_vars::HISTORY_CAPACITY, "10");
    env::set_var(env_vars::RECONNECT_MAX_ATTEMPTS, "8");
    env::set_var(env_vars::TOAST_DWELL_MS, "2500");

    let config = StreamConfig::load().unwrap();
    assert_eq!(config.base_url, "https://events.example.com");
    assert_eq!(config.history_capacity, 10);
    assert_eq!(config.reconnect.max_attempts, 8);
    assert_eq!(config.toasts.dwell(), Duration::from_millis(2500));

    clear_env();
}

#[test]
#[serial]
fn test_unparsable_values_fall_back_to_defaults() {
    clear_env();
    env::set_var(env_vars::NOTIFICATION_CAPACITY, "lots");
    env::set_var(env_vars::RECONNECT_INITIAL_DELAY_MS, "-1");

    let config = StreamConfig::from_env();
    assert_eq!(config.notification_capacity, 20);
    assert_eq!(config.reconnect.initial_delay_ms, 1000);

    clear_env();
}

#[test]
#[serial]
fn test_load_rejects_invalid_env() {
    clear_env();
    env::set_var(env_vars::TOAST_MAX_VISIBLE, "0");

    let error = StreamConfig::load().unwrap_err();
    assert_eq!(error.code, ErrorCode::ConfigInvalid);

    clear_env();
}

// ============================================================================
// Endpoint and validation
// ============================================================================

#[test]
fn test_endpoint_url_keeps_path_prefix() {
    let config = StreamConfig {
        base_url: "https://app.example.com/api/".to_owned(),
        stream_path: "/events/stream".to_owned(),
        ..StreamConfig::default()
    };
    assert_eq!(
        config.endpoint_url().unwrap().as_str(),
        "https://app.example.com/api/events/stream"
    );
}

#[test]
fn test_validate_rejects_bad_values() {
    let empty_url = StreamConfig {
        base_url: "  ".to_owned(),
        ..StreamConfig::default()
    };
    assert_eq!(
        empty_url.validate().unwrap_err().code,
        ErrorCode::ConfigMissing
    );

    let bad_scheme = StreamConfig {
        base_url: "ftp://events.example.com".to_owned(),
        ..StreamConfig::default()
    };
    assert_eq!(
        bad_scheme.validate().unwrap_err().code,
        ErrorCode::ConfigInvalid
    );

    let mut zero_history = StreamConfig::default();
    zero_history.history_capacity = 0;
    assert!(zero_history.validate().is_err());

    let mut inverted_backoff = StreamConfig::default();
    inverted_backoff.reconnect.initial_delay_ms = 60_000;
    let error = inverted_backoff.validate().unwrap_err();
    assert!(error.message.contains("exceeds max delay"));
}
