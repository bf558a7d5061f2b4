//! OAuth error types.

/// OAuth errors.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Invalid client configuration.
    #[error("Invalid OAuth configuration: {0}")]
    InvalidConfig(String),

    /// The token endpoint answered with a non-success status.
    #[error("Token exchange failed ({status}): {message}")]
    TokenExchangeFailed {
        /// HTTP status returned by the token endpoint.
        status: u16,
        /// Provider error code and description, or the raw body.
        message: String,
    },

    /// The token endpoint answered 2xx but the payload was unusable.
    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("URL parsing failed: {0}")]
    UrlError(#[from] url::ParseError),
}

/// Result type for OAuth operations.
pub type OAuthResult<T> = Result<T, OAuthError>;
