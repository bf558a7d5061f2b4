//! Twitter tool configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// API credentials.
///
/// `api_key`/`api_secret` are required for every call. The access token pair
/// is required for writes (user context). The client id/secret pair enables
/// the OAuth 2.0 client-credentials path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// OAuth 1.0a Consumer Key (API Key)
    #[serde(default)]
    pub api_key: String,

    /// OAuth 1.0a Consumer Secret (API Secret)
    #[serde(default)]
    pub api_secret: String,

    /// OAuth 1.0a Access Token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// OAuth 1.0a Access Token Secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_secret: Option<String>,

    /// OAuth 2.0 client ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// OAuth 2.0 client secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

impl Credentials {
    /// Create credentials from an API key pair.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            ..Self::default()
        }
    }

    /// Attach a user-context access token pair.
    #[must_use]
    pub fn with_access_token(
        mut self,
        token: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        self.access_token = Some(token.into());
        self.access_secret = Some(secret.into());
        self
    }

    /// Attach an OAuth 2.0 client id/secret pair.
    #[must_use]
    pub fn with_client_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self
    }

    /// The name of the first missing mandatory field, if any.
    #[must_use]
    pub fn missing_required(&self) -> Option<&'static str> {
        if self.api_key.is_empty() {
            Some("api_key")
        } else if self.api_secret.is_empty() {
            Some("api_secret")
        } else {
            None
        }
    }

    /// Client id and secret, when both are set and non-empty.
    #[must_use]
    pub fn client_credentials(&self) -> Option<(&str, &str)> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Some((id, secret)),
            _ => None,
        }
    }
}

/// Configuration for the Twitter tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterConfig {
    /// API credentials
    #[serde(flatten)]
    pub credentials: Credentials,

    /// Base URL for the REST API (default: https://api.twitter.com)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Upload URL for media (default: https://upload.twitter.com)
    #[serde(default = "default_upload_url")]
    pub upload_url: String,

    /// OAuth 2.0 token endpoint (default: `{api_url}/2/oauth2/token`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,

    /// Space-separated scopes requested with client credentials
    #[serde(default = "default_oauth2_scopes")]
    pub oauth2_scopes: String,

    /// Fall back to OAuth 1.0a when the OAuth 2.0 token exchange fails
    #[serde(default = "default_oauth2_fallback")]
    pub oauth2_fallback: bool,

    /// Request timeout
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,

    /// How long tweet reads are cached, in seconds (0 disables)
    #[serde(default)]
    pub cache_tweet_seconds: u64,

    /// How long profile reads are cached, in seconds (0 disables)
    #[serde(default)]
    pub cache_profile_seconds: u64,
}

fn default_api_url() -> String {
    "https://api.twitter.com".into()
}

fn default_upload_url() -> String {
    "https://upload.twitter.com".into()
}

fn default_oauth2_scopes() -> String {
    "tweet.read tweet.write users.read like.write offline.access".into()
}

const fn default_oauth2_fallback() -> bool {
    true
}

const fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            api_url: default_api_url(),
            upload_url: default_upload_url(),
            token_url: None,
            oauth2_scopes: default_oauth2_scopes(),
            oauth2_fallback: default_oauth2_fallback(),
            timeout: default_timeout(),
            cache_tweet_seconds: 0,
            cache_profile_seconds: 0,
        }
    }
}

impl TwitterConfig {
    /// Create a configuration with default endpoints for the given credentials.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            ..Self::default()
        }
    }

    /// Read configuration from the process environment.
    ///
    /// Missing variables leave fields empty; validation happens when the
    /// tools initialize, not here.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup using the
    /// `TWITTER_*` variable names.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let credentials = Credentials {
            api_key: non_empty("TWITTER_API_KEY").unwrap_or_default(),
            api_secret: non_empty("TWITTER_API_SECRET_KEY").unwrap_or_default(),
            access_token: non_empty("TWITTER_ACCESS_TOKEN"),
            access_secret: non_empty("TWITTER_ACCESS_TOKEN_SECRET"),
            client_id: non_empty("TWITTER_CLIENT_ID"),
            client_secret: non_empty("TWITTER_CLIENT_SECRET"),
        };
        let mut config = Self::new(credentials);

        if let Some(url) = non_empty("TWITTER_API_URL") {
            config.api_url = url;
        }
        if let Some(url) = non_empty("TWITTER_UPLOAD_URL") {
            config.upload_url = url;
        }
        if let Some(secs) = non_empty("TWITTER_CACHE_TWEET_SECONDS") {
            config.cache_tweet_seconds = parse_or_warn("TWITTER_CACHE_TWEET_SECONDS", &secs, 0);
        }
        if let Some(secs) = non_empty("TWITTER_CACHE_PROFILE_SECONDS") {
            config.cache_profile_seconds =
                parse_or_warn("TWITTER_CACHE_PROFILE_SECONDS", &secs, 0);
        }
        if let Some(flag) = non_empty("TWITTER_OAUTH2_FALLBACK") {
            config.oauth2_fallback =
                parse_or_warn("TWITTER_OAUTH2_FALLBACK", &flag, default_oauth2_fallback());
        }

        config
    }

    /// Effective OAuth 2.0 token endpoint.
    #[must_use]
    pub fn token_url(&self) -> String {
        self.token_url.clone().unwrap_or_else(|| {
            format!("{}/2/oauth2/token", self.api_url.trim_end_matches('/'))
        })
    }

    /// Tweet cache lifetime, `None` when disabled.
    #[must_use]
    pub const fn tweet_cache_ttl(&self) -> Option<Duration> {
        non_zero_secs(self.cache_tweet_seconds)
    }

    /// Profile cache lifetime, `None` when disabled.
    #[must_use]
    pub const fn profile_cache_ttl(&self) -> Option<Duration> {
        non_zero_secs(self.cache_profile_seconds)
    }
}

const fn non_zero_secs(secs: u64) -> Option<Duration> {
    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}

fn parse_or_warn<T: std::str::FromStr + Copy + std::fmt::Debug>(
    key: &str,
    raw: &str,
    fallback: T,
) -> T {
    raw.trim().parse().unwrap_or_else(|_| {
        warn!(key, value = raw, fallback = ?fallback, "Ignoring unparseable setting");
        fallback
    })
}

/// Rate limit information from Twitter API headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimitInfo {
    /// Remaining requests in the current window
    pub remaining: Option<u32>,

    /// Unix timestamp when the rate limit resets
    pub reset: Option<u64>,
}

impl RateLimitInfo {
    /// Parse rate limit info from response headers.
    pub fn from_headers(headers: &reqwest::header::HeaderMap) -> Self {
        fn header<T: std::str::FromStr>(
            headers: &reqwest::header::HeaderMap,
            name: &str,
        ) -> Option<T> {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
        }

        Self {
            remaining: header(headers, "x-rate-limit-remaining"),
            reset: header(headers, "x-rate-limit-reset"),
        }
    }

    /// Check if we're rate limited (remaining == 0).
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}
