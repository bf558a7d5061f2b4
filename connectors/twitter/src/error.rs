//! Twitter tool errors.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Classification of a non-success API response.
///
/// The classification is advisory: every class still carries the original
/// status and body in [`TwitterError::Api`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// HTTP 401: invalid or expired credentials.
    Authentication,
    /// HTTP 403: valid credentials without the required scope.
    Permission,
    /// HTTP 429: rate limited.
    RateLimit,
    /// Any other non-success status.
    Other,
}

impl ApiErrorKind {
    /// Classify an HTTP status code.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Authentication,
            403 => Self::Permission,
            429 => Self::RateLimit,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "Authentication failed"),
            Self::Permission => write!(f, "Permission denied"),
            Self::RateLimit => write!(f, "Rate limited"),
            Self::Other => write!(f, "Twitter API error"),
        }
    }
}

/// Twitter tool errors.
#[derive(Error, Debug)]
pub enum TwitterError {
    /// Mandatory credentials are missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A tool argument is missing or out of range.
    #[error("Validation error for '{field}': {message}")]
    Validation { field: String, message: String },

    /// No tool with this name exists in the catalog.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The API answered with a non-success status.
    #[error("{kind} ({status}): {body}")]
    Api {
        kind: ApiErrorKind,
        status: u16,
        body: String,
        /// Unix timestamp at which the rate limit window resets, if reported.
        rate_limit_reset: Option<u64>,
    },

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request authorization failed
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// The operation is deliberately not implemented.
    #[error("{0} is not implemented")]
    Unimplemented(&'static str),
}

impl TwitterError {
    /// Build a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Build the error for a required argument that was not supplied.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::validation(field, "missing required parameter")
    }

    /// The API classification, if this is an API error.
    #[must_use]
    pub const fn kind(&self) -> Option<ApiErrorKind> {
        match self {
            Self::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// The HTTP status, if the remote answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this is a caller-side validation failure.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Errors that mutating tools re-raise instead of folding into a
    /// failure envelope.
    #[must_use]
    pub const fn propagates_from_action(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Configuration(_))
    }

    /// Time until the rate limit window resets, when the API reported one.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        let Self::Api {
            rate_limit_reset: Some(reset),
            ..
        } = self
        else {
            return None;
        };

        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()?
            .as_secs();

        (*reset > now).then(|| Duration::from_secs(reset - now))
    }
}

/// Result type for Twitter operations.
pub type TwitterResult<T> = Result<T, TwitterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(ApiErrorKind::from_status(401), ApiErrorKind::Authentication);
        assert_eq!(ApiErrorKind::from_status(403), ApiErrorKind::Permission);
        assert_eq!(ApiErrorKind::from_status(429), ApiErrorKind::RateLimit);
        assert_eq!(ApiErrorKind::from_status(500), ApiErrorKind::Other);
        assert_eq!(ApiErrorKind::from_status(404), ApiErrorKind::Other);
    }

    #[test]
    fn test_api_error_display_keeps_status_and_body() {
        let err = TwitterError::Api {
            kind: ApiErrorKind::Authentication,
            status: 401,
            body: r#"{"title":"Unauthorized"}"#.into(),
            rate_limit_reset: None,
        };
        let text = err.to_string();
        assert!(text.contains("Authentication failed"));
        assert!(text.contains("401"));
        assert!(text.contains("Unauthorized"));
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn test_missing_names_field() {
        let err = TwitterError::missing("username");
        assert!(err.is_validation());
        assert!(err.propagates_from_action());
        assert!(err.to_string().contains("'username'"));
    }

    #[test]
    fn test_retry_after_only_for_future_reset() {
        let past = TwitterError::Api {
            kind: ApiErrorKind::RateLimit,
            status: 429,
            body: String::new(),
            rate_limit_reset: Some(1),
        };
        assert!(past.retry_after().is_none());

        let future = TwitterError::Api {
            kind: ApiErrorKind::RateLimit,
            status: 429,
            body: String::new(),
            rate_limit_reset: Some(u64::MAX),
        };
        assert!(future.retry_after().is_some());
    }
}
