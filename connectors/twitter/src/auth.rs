//! Request authorization.
//!
//! v2 requests prefer an app-only OAuth 2.0 bearer token when client
//! credentials are configured. Everything else, and v2 when the token
//! exchange fails, is signed with OAuth 1.0a.

use fcp_oauth::{OAuth2Client, OAuth2Config, OAuthTokens};
use parking_lot::RwLock;
use reqwest::Client;
use tracing::{debug, warn};

use crate::{
    client::ApiVersion,
    config::TwitterConfig,
    error::{TwitterError, TwitterResult},
    oauth::OAuthSigner,
};

/// Produces `Authorization` header values for outgoing requests.
#[derive(Debug)]
pub struct RequestAuthorizer {
    signer: OAuthSigner,
    oauth2: Option<OAuth2Client>,
    fallback: bool,
    bearer: RwLock<Option<OAuthTokens>>,
}

impl RequestAuthorizer {
    /// Build an authorizer sharing the transport's HTTP client.
    pub fn new(config: &TwitterConfig, http_client: Client) -> TwitterResult<Self> {
        let oauth2 = config
            .credentials
            .client_credentials()
            .map(|(id, secret)| {
                let scopes = config
                    .oauth2_scopes
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
                let oauth2_config = OAuth2Config::new(id, secret, config.token_url())
                    .with_scopes(scopes)
                    .with_timeout(config.timeout);
                OAuth2Client::with_http_client(oauth2_config, http_client)
            })
            .transpose()
            .map_err(|e| TwitterError::Configuration(e.to_string()))?;

        Ok(Self {
            signer: OAuthSigner::new(&config.credentials),
            oauth2,
            fallback: config.oauth2_fallback,
            bearer: RwLock::new(None),
        })
    }

    /// Whether the OAuth 2.0 path is configured at all.
    #[must_use]
    pub const fn has_oauth2(&self) -> bool {
        self.oauth2.is_some()
    }

    /// Header value for a request.
    ///
    /// `params` are the query parameters of a GET; other verbs pass none.
    pub async fn authorize(
        &self,
        version: ApiVersion,
        method: &str,
        url: &str,
        params: &[(String, String)],
    ) -> TwitterResult<String> {
        if version == ApiVersion::V2 {
            if let Some(oauth2) = &self.oauth2 {
                match self.bearer_header(oauth2).await {
                    Ok(header) => return Ok(header),
                    Err(e) if self.fallback => {
                        warn!(error = %e, "OAuth 2.0 token exchange failed, falling back to OAuth 1.0a");
                    }
                    Err(e) => {
                        return Err(TwitterError::OAuth(format!(
                            "OAuth 2.0 token exchange failed: {e}"
                        )));
                    }
                }
            }
        }

        self.signer.sign(method, url, params)
    }

    async fn bearer_header(&self, oauth2: &OAuth2Client) -> fcp_oauth::OAuthResult<String> {
        if let Some(tokens) = self.bearer.read().as_ref() {
            if !tokens.needs_refresh() {
                return Ok(tokens.authorization_header());
            }
        }

        debug!("Requesting OAuth 2.0 bearer token");
        let tokens = oauth2.client_credentials(&[]).await?;
        let header = tokens.authorization_header();
        *self.bearer.write() = Some(tokens);
        Ok(header)
    }
}
