//! Structured errors for API calls.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Categories of API errors for consistent handling at store boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// Invalid credentials, or an expired/invalid session token (HTTP 401 or
    /// a `token_not_valid` error code). On protected endpoints the caller is
    /// expected to tear the session down.
    Unauthorized,
    /// The server refused the operation (HTTP 403), e.g. an expired link or
    /// a share the user has no permission for.
    Forbidden,
    /// The resource does not exist (HTTP 404).
    NotFound,
    /// The request was rejected before or during validation (HTTP 400).
    Validation,
    /// Any other HTTP status error (5xx and friends).
    Http,
    /// Transport-level failure (connect, DNS, broken pipe).
    Network,
    /// Failed to parse a response body.
    Parse,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Unauthorized => write!(f, "unauthorized"),
            ApiErrorKind::Forbidden => write!(f, "forbidden"),
            ApiErrorKind::NotFound => write!(f, "not_found"),
            ApiErrorKind::Validation => write!(f, "validation"),
            ApiErrorKind::Http => write!(f, "http"),
            ApiErrorKind::Network => write!(f, "network"),
            ApiErrorKind::Parse => write!(f, "parse"),
        }
    }
}

/// Structured error from an API call with kind and display message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error category.
    pub kind: ApiErrorKind,
    /// One-line human-readable summary suitable for display.
    pub message: String,
    /// Optional raw response body for diagnostics; never shown to users.
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an error from a non-success HTTP response body.
    ///
    /// The display message is taken from `{"error": ...}`, then
    /// `{"detail": ...}`, then the first field-error entry of a validation
    /// map, falling back to the per-operation `fallback` string. A 401
    /// status or a `token_not_valid` error code marks the error
    /// [`ApiErrorKind::Unauthorized`].
    pub fn from_response(status: u16, body: &str, fallback: &str) -> Self {
        let json: Option<Value> = serde_json::from_str(body).ok();

        let token_not_valid = json
            .as_ref()
            .and_then(|v| v.get("code"))
            .and_then(Value::as_str)
            == Some("token_not_valid");

        let kind = if status == 401 || token_not_valid {
            ApiErrorKind::Unauthorized
        } else {
            match status {
                403 => ApiErrorKind::Forbidden,
                404 => ApiErrorKind::NotFound,
                400 => ApiErrorKind::Validation,
                _ => ApiErrorKind::Http,
            }
        };

        let message = json
            .as_ref()
            .and_then(extract_message)
            .unwrap_or_else(|| fallback.to_string());

        Self {
            kind,
            message,
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    /// Creates a transport-level error.
    pub fn network(err: &reqwest::Error, fallback: &str) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: fallback.to_string(),
            details: Some(err.to_string()),
        }
    }

    /// Creates a response-parsing error.
    pub fn parse(err: &reqwest::Error, fallback: &str) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: fallback.to_string(),
            details: Some(err.to_string()),
        }
    }

    /// Returns whether this error should trigger session teardown when it
    /// came from a protected endpoint.
    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }
}

/// Pulls a display message out of a JSON error payload.
fn extract_message(json: &Value) -> Option<String> {
    if let Some(msg) = json.get("error").and_then(Value::as_str) {
        return Some(msg.to_string());
    }
    if let Some(msg) = json.get("detail").and_then(Value::as_str) {
        return Some(msg.to_string());
    }

    // DRF-style field validation map: {"email": ["Enter a valid email."]}
    if let Some(map) = json.as_object() {
        for (field, value) in map {
            if field == "code" {
                continue;
            }
            let first = match value {
                Value::String(s) => Some(s.clone()),
                Value::Array(items) => items.first().and_then(Value::as_str).map(str::to_string),
                _ => None,
            };
            if let Some(msg) = first {
                return Some(format!("{field}: {msg}"));
            }
        }
    }

    None
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
