//! OAuth 2.0 client credentials flow.
//!
//! The client authenticates to the token endpoint with HTTP Basic auth
//! (`client_id:client_secret`) and receives an app-only bearer token.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::{GrantType, OAuthError, OAuthResult, OAuthTokens, TokenResponse};

/// OAuth 2.0 configuration.
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    /// Client ID.
    pub client_id: String,
    /// Client secret.
    pub client_secret: String,
    /// Token endpoint URL.
    pub token_url: String,
    /// Default scopes to request.
    pub default_scopes: Vec<String>,
    /// HTTP client timeout.
    pub timeout: Duration,
}

impl OAuth2Config {
    /// Create a new OAuth 2.0 configuration.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: token_url.into(),
            default_scopes: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set default scopes.
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.default_scopes = scopes;
        self
    }

    /// Set timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// OAuth 2.0 client.
#[derive(Debug, Clone)]
pub struct OAuth2Client {
    config: OAuth2Config,
    http_client: Client,
}

impl OAuth2Client {
    /// Create a new OAuth 2.0 client.
    pub fn new(config: OAuth2Config) -> OAuthResult<Self> {
        let http_client = Client::builder().timeout(config.timeout).build()?;
        Self::with_http_client(config, http_client)
    }

    /// Create with a custom HTTP client.
    pub fn with_http_client(config: OAuth2Config, http_client: Client) -> OAuthResult<Self> {
        if config.client_id.is_empty() || config.client_secret.is_empty() {
            return Err(OAuthError::InvalidConfig(
                "client_id and client_secret are required for client credentials".into(),
            ));
        }
        Url::parse(&config.token_url)?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Get tokens using client credentials flow.
    ///
    /// `scopes` are appended to the configured default scopes.
    #[instrument(skip(self), fields(token_url = %self.config.token_url))]
    pub async fn client_credentials(&self, scopes: &[&str]) -> OAuthResult<OAuthTokens> {
        let mut params = BTreeMap::new();
        params.insert("grant_type".to_string(), GrantType::ClientCredentials.to_string());

        let all_scopes: Vec<&str> = self
            .config
            .default_scopes
            .iter()
            .map(String::as_str)
            .chain(scopes.iter().copied())
            .collect();

        if !all_scopes.is_empty() {
            params.insert("scope".to_string(), all_scopes.join(" "));
        }

        self.token_request(&params).await
    }

    /// Make a token request.
    async fn token_request(&self, params: &BTreeMap<String, String>) -> OAuthResult<OAuthTokens> {
        let response = self
            .http_client
            .post(&self.config.token_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(params)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = match serde_json::from_slice::<TokenErrorResponse>(&bytes) {
                Ok(error) => format!(
                    "{}: {}",
                    error.error,
                    error.error_description.unwrap_or_default()
                ),
                Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
            };

            return Err(OAuthError::TokenExchangeFailed {
                status: status.as_u16(),
                message,
            });
        }

        let token_response: TokenResponse = serde_json::from_slice(&bytes)
            .map_err(|e| OAuthError::InvalidTokenResponse(e.to_string()))?;

        if token_response.access_token.is_empty() {
            return Err(OAuthError::InvalidTokenResponse(
                "empty access_token".into(),
            ));
        }

        debug!(
            token_type = %token_response.token_type,
            expires_in = ?token_response.expires_in,
            "Obtained client credentials token"
        );

        Ok(OAuthTokens::from_response(token_response))
    }
}

/// OAuth 2.0 error response.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_string_contains, header, method, path},
    };

    fn test_config(server: &MockServer) -> OAuth2Config {
        OAuth2Config::new("client_id", "client_secret", format!("{}/oauth2/token", server.uri()))
            .with_scopes(vec!["tweet.read".into(), "users.read".into()])
    }

    #[test]
    fn test_missing_secret_is_invalid_config() {
        let config = OAuth2Config::new("client_id", "", "https://example.com/token");
        let err = OAuth2Client::new(config).unwrap_err();
        assert!(matches!(err, OAuthError::InvalidConfig(_)));
    }

    #[test]
    fn test_bad_token_url_rejected() {
        let config = OAuth2Config::new("id", "secret", "not a url");
        let err = OAuth2Client::new(config).unwrap_err();
        assert!(matches!(err, OAuthError::UrlError(_)));
    }

    #[tokio::test]
    async fn test_client_credentials_uses_basic_auth() {
        let server = MockServer::start().await;

        // base64("client_id:client_secret")
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(header(
                "authorization",
                "Basic Y2xpZW50X2lkOmNsaWVudF9zZWNyZXQ=",
            ))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("scope=tweet.read+users.read"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "app-token",
                "token_type": "bearer",
                "expires_in": 7200
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OAuth2Client::new(test_config(&server)).unwrap();
        let tokens = client.client_credentials(&[]).await.unwrap();

        assert_eq!(tokens.access_token(), "app-token");
        assert!(!tokens.is_expired());
    }

    #[tokio::test]
    async fn test_non_success_status_is_exchange_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": "unauthorized_client",
                "error_description": "client credentials disabled"
            })))
            .mount(&server)
            .await;

        let client = OAuth2Client::new(test_config(&server)).unwrap();
        let err = client.client_credentials(&[]).await.unwrap_err();

        match err {
            OAuthError::TokenExchangeFailed { status, message } => {
                assert_eq!(status, 403);
                assert!(message.contains("unauthorized_client"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_access_token_is_invalid_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "token_type": "bearer" })),
            )
            .mount(&server)
            .await;

        let client = OAuth2Client::new(test_config(&server)).unwrap();
        let err = client.client_credentials(&[]).await.unwrap_err();
        assert!(matches!(err, OAuthError::InvalidTokenResponse(_)));
    }
}
