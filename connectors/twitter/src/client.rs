//! Twitter REST API client.

use reqwest::{
    Client, Method, Response,
    header::AUTHORIZATION,
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, instrument, warn};

use crate::{
    auth::RequestAuthorizer,
    config::{RateLimitInfo, TwitterConfig},
    error::{ApiErrorKind, TwitterError, TwitterResult},
    oauth::percent_encode,
    types::{
        CreateTweetRequest, CreateTweetResponse, LikeResponse, MediaUploadResponse, OneOrMany,
        RetweetResponse, SearchTweetsParams, TweetData, TweetIdRequest, TwitterResponse, UserData,
        VerifyCredentialsResponse,
    },
};

const TWEET_FIELDS: &str =
    "id,text,author_id,created_at,public_metrics,attachments,referenced_tweets";
const USER_FIELDS: &str =
    "id,name,username,description,profile_image_url,verified,created_at,location,url,public_metrics";
const MEDIA_FIELDS: &str = "media_key,type,url,preview_image_url";
const TWEET_EXPANSIONS: &str =
    "author_id,attachments.media_keys,referenced_tweets.id,referenced_tweets.id.author_id";

/// Timeline page size bounds enforced by the API.
const TIMELINE_RESULTS: (u32, u32) = (5, 100);
/// Recent-search page size bounds enforced by the API.
const SEARCH_RESULTS: (u32, u32) = (10, 100);

/// Which API family a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    /// Legacy REST API (`{api_url}/1.1`)
    V1_1,
    /// Current API (`{api_url}/2`)
    V2,
    /// Media upload host (`{upload_url}/1.1`)
    Upload,
}

/// Request payload for non-GET requests.
#[derive(Debug)]
pub enum RequestBody {
    Json(serde_json::Value),
    Multipart(Form),
}

/// Twitter REST API client.
#[derive(Debug)]
pub struct TwitterApiClient {
    client: Client,
    api_url: String,
    upload_url: String,
    authorizer: RequestAuthorizer,
    /// Authenticated user id, resolved on first write that needs it.
    me: OnceCell<String>,
}

impl TwitterApiClient {
    /// Create a new API client from configuration.
    ///
    /// Fails with [`TwitterError::Configuration`] when the API key pair is
    /// missing. No network I/O happens here.
    pub fn new(config: &TwitterConfig) -> TwitterResult<Self> {
        if let Some(field) = config.credentials.missing_required() {
            return Err(TwitterError::Configuration(format!(
                "{field} is required"
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("fcp-twitter-tools/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            authorizer: RequestAuthorizer::new(config, client.clone())?,
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            upload_url: config.upload_url.trim_end_matches('/').to_string(),
            me: OnceCell::new(),
        })
    }

    /// Whether v2 requests try an OAuth 2.0 bearer token first.
    #[must_use]
    pub const fn uses_oauth2(&self) -> bool {
        self.authorizer.has_oauth2()
    }

    fn url(&self, version: ApiVersion, endpoint: &str) -> String {
        match version {
            ApiVersion::V1_1 => format!("{}/1.1{endpoint}", self.api_url),
            ApiVersion::V2 => format!("{}/2{endpoint}", self.api_url),
            ApiVersion::Upload => format!("{}/1.1{endpoint}", self.upload_url),
        }
    }

    /// Perform an authorized request and decode the response.
    ///
    /// `params` go into the query string of a GET and take part in its
    /// signature. Other verbs ignore them and send `body` instead.
    #[instrument(skip(self, params, body))]
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        version: ApiVersion,
        endpoint: &str,
        params: &[(String, String)],
        body: Option<RequestBody>,
    ) -> TwitterResult<T> {
        let url = self.url(version, endpoint);
        let is_get = method == Method::GET;
        let signed_params: &[(String, String)] = if is_get { params } else { &[] };

        let auth_header = self
            .authorizer
            .authorize(version, method.as_str(), &url, signed_params)
            .await?;

        let full_url = if is_get && !params.is_empty() {
            let query = params
                .iter()
                .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            format!("{url}?{query}")
        } else {
            url
        };

        debug!(url = %full_url, "Making Twitter API request");

        let mut req = self
            .client
            .request(method, &full_url)
            .header(AUTHORIZATION, auth_header);

        match body {
            Some(RequestBody::Json(value)) => req = req.json(&value),
            Some(RequestBody::Multipart(form)) => req = req.multipart(form),
            None => {}
        }

        let response = req.send().await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> TwitterResult<T> {
        let status = response.status();

        let rate_limit = RateLimitInfo::from_headers(response.headers());
        if rate_limit.is_exhausted() {
            debug!(reset = ?rate_limit.reset, "Rate limit exhausted");
        }

        let bytes = response.bytes().await?;

        if status.is_success() {
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return serde_json::from_slice(b"null").map_err(TwitterError::from);
            }
            return serde_json::from_slice(&bytes).map_err(TwitterError::from);
        }

        let status = status.as_u16();
        let kind = ApiErrorKind::from_status(status);
        let body = String::from_utf8_lossy(&bytes).into_owned();
        warn!(status, %kind, reset = ?rate_limit.reset, "Twitter API request failed");

        Err(TwitterError::Api {
            kind,
            status,
            body,
            rate_limit_reset: rate_limit.reset,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        version: ApiVersion,
        endpoint: &str,
        params: &[(String, String)],
    ) -> TwitterResult<T> {
        self.request(Method::GET, version, endpoint, params, None)
            .await
    }

    async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        version: ApiVersion,
        endpoint: &str,
        body: &B,
    ) -> TwitterResult<T> {
        let body = RequestBody::Json(serde_json::to_value(body)?);
        self.request(Method::POST, version, endpoint, &[], Some(body))
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // User endpoints
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a user by username.
    pub async fn get_user_by_username(
        &self,
        username: &str,
    ) -> TwitterResult<TwitterResponse<UserData>> {
        let params = vec![("user.fields".to_string(), USER_FIELDS.to_string())];
        self.get(
            ApiVersion::V2,
            &format!("/users/by/username/{}", percent_encode(username)),
            &params,
        )
        .await
    }

    /// Get a user's timeline.
    pub async fn get_user_tweets(
        &self,
        user_id: &str,
        max_results: u32,
    ) -> TwitterResult<TwitterResponse<OneOrMany<TweetData>>> {
        let mut params = tweet_params();
        params.push((
            "max_results".to_string(),
            max_results
                .clamp(TIMELINE_RESULTS.0, TIMELINE_RESULTS.1)
                .to_string(),
        ));

        self.get(
            ApiVersion::V2,
            &format!("/users/{}/tweets", percent_encode(user_id)),
            &params,
        )
        .await
    }

    /// The id of the authenticated user, fetched once.
    pub async fn me(&self) -> TwitterResult<&str> {
        let id = self
            .me
            .get_or_try_init(|| async {
                let me: VerifyCredentialsResponse = self
                    .get(ApiVersion::V1_1, "/account/verify_credentials.json", &[])
                    .await?;
                debug!(user_id = %me.id_str, screen_name = ?me.screen_name, "Resolved authenticated user");
                Ok::<_, TwitterError>(me.id_str)
            })
            .await?;
        Ok(id.as_str())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tweet endpoints
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a tweet by ID with the standard expansions.
    pub async fn get_tweet(
        &self,
        tweet_id: &str,
    ) -> TwitterResult<TwitterResponse<OneOrMany<TweetData>>> {
        self.get(
            ApiVersion::V2,
            &format!("/tweets/{}", percent_encode(tweet_id)),
            &tweet_params(),
        )
        .await
    }

    /// Create a new tweet.
    pub async fn create_tweet(
        &self,
        request: &CreateTweetRequest,
    ) -> TwitterResult<CreateTweetResponse> {
        let response: Option<CreateTweetResponse> =
            self.post_json(ApiVersion::V2, "/tweets", request).await?;
        Ok(response.unwrap_or_default())
    }

    /// Retweet as the authenticated user.
    pub async fn retweet(&self, tweet_id: &str) -> TwitterResult<RetweetResponse> {
        let me = self.me().await?;
        let body = TweetIdRequest {
            tweet_id: tweet_id.to_string(),
        };
        let response: Option<RetweetResponse> = self
            .post_json(ApiVersion::V2, &format!("/users/{me}/retweets"), &body)
            .await?;
        Ok(response.unwrap_or_default())
    }

    /// Like a tweet as the authenticated user.
    pub async fn like(&self, tweet_id: &str) -> TwitterResult<LikeResponse> {
        let me = self.me().await?;
        let body = TweetIdRequest {
            tweet_id: tweet_id.to_string(),
        };
        let response: Option<LikeResponse> = self
            .post_json(ApiVersion::V2, &format!("/users/{me}/likes"), &body)
            .await?;
        Ok(response.unwrap_or_default())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Search endpoints
    // ─────────────────────────────────────────────────────────────────────────

    /// Search recent tweets (last 7 days).
    pub async fn search_recent(
        &self,
        search_params: &SearchTweetsParams,
    ) -> TwitterResult<TwitterResponse<OneOrMany<TweetData>>> {
        let mut params = vec![("query".to_string(), search_params.query.clone())];
        params.extend(tweet_params());
        params.push((
            "max_results".to_string(),
            search_params
                .max_results
                .unwrap_or(SEARCH_RESULTS.0)
                .clamp(SEARCH_RESULTS.0, SEARCH_RESULTS.1)
                .to_string(),
        ));

        if let Some(ref sort_order) = search_params.sort_order {
            params.push(("sort_order".to_string(), sort_order.clone()));
        }

        self.get(ApiVersion::V2, "/tweets/search/recent", &params)
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Media endpoints
    // ─────────────────────────────────────────────────────────────────────────

    /// Upload media and return its id.
    pub async fn upload_media(&self, data: Vec<u8>, media_type: &str) -> TwitterResult<String> {
        let part = Part::bytes(data)
            .file_name("media")
            .mime_str(media_type)?;
        let form = Form::new().part("media", part);

        let response: MediaUploadResponse = self
            .request(
                Method::POST,
                ApiVersion::Upload,
                "/media/upload.json",
                &[],
                Some(RequestBody::Multipart(form)),
            )
            .await?;

        response.id().ok_or_else(|| {
            TwitterError::Json(serde::de::Error::custom(
                "media upload response carried no media id",
            ))
        })
    }
}

/// Field and expansion parameters shared by every tweet read.
fn tweet_params() -> Vec<(String, String)> {
    vec![
        ("tweet.fields".to_string(), TWEET_FIELDS.to_string()),
        ("expansions".to_string(), TWEET_EXPANSIONS.to_string()),
        (
            "user.fields".to_string(),
            "id,name,username,profile_image_url".to_string(),
        ),
        ("media.fields".to_string(), MEDIA_FIELDS.to_string()),
    ]
}
