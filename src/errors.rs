// ABOUTME: Unified error type and error codes for the real-time stream client
// ABOUTME: Maps transport, configuration, and payload failures onto a single AppError
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling
//!
//! Every fallible operation in this crate returns [`AppResult`]. Errors never
//! cross the connection manager boundary as panics: the worker converts them
//! into the `error` field of the observable connection status instead.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Authentication (1000-1999)
    /// The stream endpoint rejected the credential
    #[serde(rename = "AUTH_INVALID")]
    AuthInvalid = 1001,

    // Validation (3000-3999)
    /// Payload could not be understood
    #[serde(rename = "INVALID_FORMAT")]
    InvalidFormat = 3002,

    // Resource Management (4000-4999)
    /// The stream endpoint does not exist
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound = 4000,

    // External Services (5000-5999)
    /// The event server answered with an unexpected status
    #[serde(rename = "EXTERNAL_SERVICE_ERROR")]
    ExternalServiceError = 5000,
    /// Connection refused, dropped, or timed out
    #[serde(rename = "EXTERNAL_SERVICE_UNAVAILABLE")]
    ExternalServiceUnavailable = 5001,
    /// The event server is rate limiting this client
    #[serde(rename = "EXTERNAL_RATE_LIMITED")]
    ExternalRateLimited = 5003,

    // Configuration (6000-6999)
    /// Required configuration is missing
    #[serde(rename = "CONFIG_MISSING")]
    ConfigMissing = 6001,
    /// Configuration is present but unusable
    #[serde(rename = "CONFIG_INVALID")]
    ConfigInvalid = 6002,

    // Internal Errors (9000-9999)
    /// JSON encoding or decoding failed
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError = 9003,
}

impl ErrorCode {
    /// Classify an HTTP status returned by the stream endpoint
    #[must_use]
    pub const fn from_http_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::AuthInvalid,
            404 => Self::ResourceNotFound,
            429 => Self::ExternalRateLimited,
            500..=599 => Self::ExternalServiceUnavailable,
            _ => Self::ExternalServiceError,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AuthInvalid => "The stream credential was rejected",
            Self::InvalidFormat => "The data format is invalid",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::ExternalServiceError => "The event server returned an error",
            Self::ExternalServiceUnavailable => "The event server is unavailable",
            Self::ExternalRateLimited => "The event server is rate limiting this client",
            Self::ConfigMissing => "Required configuration is missing",
            Self::ConfigInvalid => "Configuration is invalid",
            Self::SerializationError => "Data serialization/deserialization failed",
        }
    }
}

/// Additional context that can be attached to errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Additional key-value context
    pub details: serde_json::Value,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            details: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

/// Unified error type for the client
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    pub context: ErrorContext,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add details to the error context
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.context.details = details;
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Convenience functions for creating common errors
impl AppError {
    /// Malformed payload
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFormat, message)
    }

    /// Configuration value present but unusable
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalid, message)
    }

    /// Required configuration value missing
    pub fn config_missing(key: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ConfigMissing,
            format!("{} is not set", key.into()),
        )
    }

    /// Connection-level failure (refused, dropped, closed by the server)
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExternalServiceUnavailable, message)
    }

    /// Non-success HTTP status from the stream endpoint
    pub fn from_status(status: u16, body: &str) -> Self {
        let body = body.trim();
        let message = if body.is_empty() {
            format!("stream endpoint returned HTTP {status}")
        } else {
            format!("stream endpoint returned HTTP {status}: {body}")
        };
        Self::new(ErrorCode::from_http_status(status), message)
            .with_details(serde_json::json!({ "status": status }))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(ErrorCode::SerializationError, error.to_string()).with_source(error)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        let message = if error.is_connect() {
            format!("connection failed: {error}")
        } else if error.is_timeout() {
            format!("connection timed out: {error}")
        } else {
            format!("stream read failed: {error}")
        };
        Self::new(ErrorCode::ExternalServiceUnavailable, message).with_source(error)
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::new(ErrorCode::ConfigInvalid, format!("invalid URL: {error}")).with_source(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_from_http_status() {
        assert_eq!(ErrorCode::from_http_status(401), ErrorCode::AuthInvalid);
        assert_eq!(ErrorCode::from_http_status(403), ErrorCode::AuthInvalid);
        assert_eq!(ErrorCode::from_http_status(404), ErrorCode::ResourceNotFound);
        assert_eq!(
            ErrorCode::from_http_status(429),
            ErrorCode::ExternalRateLimited
        );
        assert_eq!(
            ErrorCode::from_http_status(503),
            ErrorCode::ExternalServiceUnavailable
        );
        assert_eq!(
            ErrorCode::from_http_status(418),
            ErrorCode::ExternalServiceError
        );
    }

    #[test]
    fn test_from_status_message() {
        let error = AppError::from_status(401, "  token expired ");
        assert_eq!(error.code, ErrorCode::AuthInvalid);
        assert!(error.message.ends_with("HTTP 401: token expired"));
        assert_eq!(error.context.details["status"], 401);

        let bare = AppError::from_status(500, "");
        assert_eq!(bare.message, "stream endpoint returned HTTP 500");
    }

    #[test]
    fn test_transport_errors_report_unavailable() {
        let error = AppError::transport("event stream closed by server");
        assert_eq!(error.code, ErrorCode::ExternalServiceUnavailable);
        assert_eq!(
            error.to_string(),
            "The event server is unavailable: event stream closed by server"
        );
        assert!(error.context.details.as_object().unwrap().is_empty());
    }

    #[test]
    fn test_serde_json_conversion() {
        let parse_error = serde_json::from_str::<serde_json::Value>("{not json")
            .err()
            .map(AppError::from);
        let error = parse_error.unwrap();
        assert_eq!(error.code, ErrorCode::SerializationError);
        assert!(error.source.is_some());
        assert!(error.to_string().starts_with("Data serialization"));
    }
}
