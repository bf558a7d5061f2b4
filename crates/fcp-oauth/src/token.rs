//! OAuth token types.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::DEFAULT_REFRESH_THRESHOLD;

/// OAuth token response from provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The access token.
    pub access_token: String,

    /// Token type (usually "bearer").
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

fn default_token_type() -> String {
    "Bearer".into()
}

/// Issued OAuth tokens with expiry metadata.
#[derive(Debug, Clone, Serialize)]
pub struct OAuthTokens {
    access_token: String,
    token_type: String,
    expires_at: Option<DateTime<Utc>>,
}

impl OAuthTokens {
    /// Create tokens from a token response.
    #[must_use]
    pub fn from_response(response: TokenResponse) -> Self {
        let now = Utc::now();
        let expires_at = response.expires_in.and_then(|secs| {
            let secs = i64::try_from(secs).ok()?;
            now.checked_add_signed(chrono::TimeDelta::try_seconds(secs)?)
        });

        // Providers disagree on casing ("bearer" vs "Bearer"); the header scheme is case-insensitive.
        let token_type = if response.token_type.eq_ignore_ascii_case("bearer") {
            "Bearer".to_string()
        } else {
            response.token_type
        };

        Self {
            access_token: response.access_token,
            token_type,
            expires_at,
        }
    }

    /// Get the access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Get the token type.
    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Check if the token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Utc::now() >= exp)
    }

    /// Check if the token needs refresh (within threshold of expiry).
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh_within(DEFAULT_REFRESH_THRESHOLD)
    }

    /// Check if the token needs refresh within a given threshold.
    #[must_use]
    pub fn needs_refresh_within(&self, threshold: Duration) -> bool {
        self.expires_at.is_some_and(|exp| {
            // An unrepresentable threshold reaches past any expiry
            chrono::TimeDelta::from_std(threshold)
                .ok()
                .and_then(|delta| Utc::now().checked_add_signed(delta))
                .is_none_or(|threshold_time| threshold_time >= exp)
        })
    }

    /// Get the authorization header value.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_token_response(expires_in: Option<u64>) -> TokenResponse {
        TokenResponse {
            access_token: "test_access_token".to_string(),
            token_type: "bearer".to_string(),
            expires_in,
        }
    }

    #[test]
    fn test_token_from_response() {
        let tokens = OAuthTokens::from_response(mock_token_response(Some(3600)));

        assert_eq!(tokens.access_token(), "test_access_token");
        assert_eq!(tokens.token_type(), "Bearer");
        assert!(!tokens.is_expired());
    }

    #[test]
    fn test_token_expiration() {
        let tokens = OAuthTokens::from_response(mock_token_response(Some(0)));
        assert!(tokens.is_expired());
        assert!(tokens.needs_refresh());
    }

    #[test]
    fn test_token_without_expiry_never_needs_refresh() {
        let tokens = OAuthTokens::from_response(mock_token_response(None));
        assert!(!tokens.is_expired());
        assert!(!tokens.needs_refresh());
    }

    #[test]
    fn test_token_needs_refresh() {
        // 2 minutes left, below the 5 minute threshold
        let tokens = OAuthTokens::from_response(mock_token_response(Some(120)));
        assert!(tokens.needs_refresh());

        let tokens = OAuthTokens::from_response(mock_token_response(Some(600)));
        assert!(!tokens.needs_refresh());
    }

    #[test]
    fn test_authorization_header() {
        let tokens = OAuthTokens::from_response(mock_token_response(Some(3600)));
        assert_eq!(tokens.authorization_header(), "Bearer test_access_token");
    }

    #[test]
    fn test_token_type_defaults_when_absent() {
        let response: TokenResponse =
            serde_json::from_value(serde_json::json!({ "access_token": "abc" })).unwrap();
        let tokens = OAuthTokens::from_response(response);
        assert_eq!(tokens.authorization_header(), "Bearer abc");
    }
}
