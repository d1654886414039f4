// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use serde_json::Value;

/// Remote calendar API errors.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum GcalError {
    /// Transport layer error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Human readable message, taken from `error.message` when present.
        message: String,
        /// Raw response payload, JSON when the server sent JSON.
        body: Value,
    },

    /// The response could not be decoded.
    #[error("Invalid server response: {0}")]
    Decode(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GcalError {
    /// Builds an API error from a status code and the raw response text.
    #[must_use]
    pub fn from_response(status: u16, text: &str) -> Self {
        let body: Value =
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()));
        let message = body
            .pointer("/error/message")
            .and_then(Value::as_str)
            .map_or_else(|| text.trim().to_string(), ToString::to_string);

        Self::Api {
            status,
            message,
            body,
        }
    }

    /// HTTP status code carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Decode(_) | Self::Config(_) => None,
        }
    }

    /// Whether the remote rejected the credentials (401 or 403).
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Whether the remote no longer honours the sync token and a full listing is required.
    #[must_use]
    pub fn is_sync_token_expired(&self) -> bool {
        self.status() == Some(410)
    }

    /// Raw payload of an API error.
    #[must_use]
    pub fn raw_payload(&self) -> Option<&Value> {
        match self {
            Self::Api { body, .. } => Some(body),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_response_extracts_google_error_message() {
        let text = r#"{"error":{"code":410,"message":"Sync token is no longer valid, a full sync is required.","errors":[{"reason":"fullSyncRequired"}]}}"#;
        let err = GcalError::from_response(410, text);

        assert_eq!(err.status(), Some(410));
        assert!(err.is_sync_token_expired());
        assert!(!err.is_auth());
        assert_eq!(
            err.to_string(),
            "API error 410: Sync token is no longer valid, a full sync is required."
        );
        assert_eq!(
            err.raw_payload().and_then(|b| b.pointer("/error/code")),
            Some(&Value::from(410))
        );
    }

    #[test]
    fn from_response_keeps_plain_text_body() {
        let err = GcalError::from_response(403, "Forbidden\n");

        assert!(err.is_auth());
        assert_eq!(err.raw_payload(), Some(&Value::String("Forbidden\n".into())));
        assert_eq!(err.to_string(), "API error 403: Forbidden");
    }

    #[test]
    fn config_errors_have_no_status() {
        let err = GcalError::Config("missing token".into());
        assert_eq!(err.status(), None);
        assert!(!err.is_auth());
    }
}
