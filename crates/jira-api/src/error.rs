//! Error types for Jira API calls.

use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Longest remote message carried into an error, in characters.
const MAX_MESSAGE_CHARS: usize = 300;

/// The error type for Jira API calls.
///
/// Messages are built from the response body Jira returns for a failed
/// request. They never contain request headers, so credentials cannot leak
/// through `Display`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The instance rejected the credentials (HTTP 401).
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// The credentials are valid but lack permission (HTTP 403).
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// The requested resource does not exist or is not visible (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success response.
    #[error("Jira returned {status}: {message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Sanitized message from the response body.
        message: String,
    },

    /// The instance could not be reached (DNS, connect, TLS or timeout).
    #[error("Could not reach {site}: {reason}")]
    Unreachable {
        /// Site the request was sent to.
        site: String,
        /// Short description of the transport failure.
        reason: &'static str,
    },

    /// The response body did not match the expected shape.
    #[error("Unexpected response from Jira: {0}")]
    Decode(String),

    /// The client could not be constructed from the given settings.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

/// A specialized Result type for Jira API calls.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Error body Jira returns for failed requests.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    error_messages: Vec<String>,
    #[serde(default)]
    errors: BTreeMap<String, String>,
}

impl ApiError {
    /// Classify a non-success response.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = extract_message(status, body);
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
            StatusCode::FORBIDDEN => Self::Forbidden(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            _ => Self::Remote {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Classify a transport-level failure.
    ///
    /// The reqwest error itself is not kept: its `Display` includes the full
    /// request URL, which can carry query text the caller did not intend to
    /// surface.
    #[must_use]
    pub fn from_transport(site: &str, err: &reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Decode("response body could not be decoded".to_string());
        }

        let reason = if err.is_timeout() {
            "request timed out"
        } else if err.is_connect() {
            "connection failed"
        } else if err.is_builder() {
            return Self::InvalidConfig("request could not be built".to_string());
        } else {
            "transport error"
        };

        Self::Unreachable {
            site: site.to_string(),
            reason,
        }
    }

    /// HTTP status associated with this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Build a short human-readable message from a Jira error body.
fn extract_message(status: StatusCode, body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let mut parts = parsed.error_messages;
    parts.extend(
        parsed
            .errors
            .into_iter()
            .map(|(field, msg)| format!("{field}: {msg}")),
    );

    let message = if parts.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        parts.join("; ")
    };

    truncate(&message, MAX_MESSAGE_CHARS)
}

fn truncate(message: &str, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        return message.to_string();
    }
    let mut out: String = message.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
