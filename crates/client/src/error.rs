//! Error types for the gateways and stores.
//!
//! Gateways fail with [`ApiError`]. Stores wrap it in a [`StoreError`] whose
//! message is the same human-readable text recorded in the store's
//! `last_error`, so callers can surface it without re-deriving it.

use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the remote service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure: connection refused, timeout, TLS, ...
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("(no error details provided)"))]
    Status {
        status: StatusCode,
        /// The payload's `error` field, if it had one.
        message: Option<String>,
        /// Per-field validation messages from the payload's `errors` map.
        field_errors: BTreeMap<String, String>,
    },

    /// The response body could not be decoded.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ApiError {
    /// Build a status error from a raw response body.
    ///
    /// Bodies that are not the service's error shape still yield an error,
    /// just without a message.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let payload = serde_json::from_str::<ErrorPayload>(body).unwrap_or_default();
        Self::Status {
            status,
            message: payload.error.filter(|m| !m.trim().is_empty()),
            field_errors: payload.errors,
        }
    }

    /// The human-readable message reported by the server, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            Self::Http(_) | Self::Parse(_) => None,
        }
    }

    /// HTTP status of a server-reported error.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(_) | Self::Parse(_) => None,
        }
    }

    /// Per-field validation messages keyed by field name, if the server
    /// reported any.
    #[must_use]
    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Status { field_errors, .. } if !field_errors.is_empty() => Some(field_errors),
            _ => None,
        }
    }
}

/// Error body shape shared by every endpoint of the remote service.
#[derive(Debug, Default, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    errors: BTreeMap<String, String>,
}

/// A failed store operation.
///
/// Displays as the message the store recorded in `last_error`.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StoreError {
    message: String,
    #[source]
    source: ApiError,
}

impl StoreError {
    /// Wrap a gateway failure, preferring the server's message over `fallback`.
    #[must_use]
    pub fn new(fallback: &str, source: ApiError) -> Self {
        let message = source.server_message().unwrap_or(fallback).to_owned();
        Self { message, source }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The underlying gateway failure.
    #[must_use]
    pub const fn api_error(&self) -> &ApiError {
        &self.source
    }

    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        self.source.status()
    }

    #[must_use]
    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        self.source.field_errors()
    }
}
