//! Tool façade.
//!
//! [`TwitterTools`] owns the configuration, the tool catalog and a lazily
//! built API client. Every tool call goes through the same steps: resolve
//! the tool, make sure the client exists, validate arguments, execute.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::{
    cache::ResponseCache,
    client::TwitterApiClient,
    config::TwitterConfig,
    error::{TwitterError, TwitterResult},
    model::{ActionOutcome, MediaUpload, PollSpec, Profile, SearchMode, Tweet, validate_tweet_text},
    normalize::{normalize, normalize_profile},
    tools::{ToolCall, ToolCatalog},
    types::{CreateTweetRequest, SearchTweetsParams, TweetMedia, TweetPoll, TweetReply},
};

/// Lifecycle of the underlying API client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolsState {
    Uninitialized,
    Ready,
}

/// Invocation counters.
#[derive(Debug, Default)]
struct ToolMetrics {
    init_attempts: AtomicU64,
    requests_total: AtomicU64,
    requests_success: AtomicU64,
    requests_error: AtomicU64,
    cache_hits: AtomicU64,
}

impl ToolMetrics {
    fn record_request(&self, success: bool) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.requests_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.requests_error.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            init_attempts: self.init_attempts.load(Ordering::Relaxed),
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_success: self.requests_success.load(Ordering::Relaxed),
            requests_error: self.requests_error.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the façade's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub init_attempts: u64,
    pub requests_total: u64,
    pub requests_success: u64,
    pub requests_error: u64,
    pub cache_hits: u64,
}

/// Twitter API exposed as agent tools.
#[derive(Debug)]
pub struct TwitterTools {
    config: TwitterConfig,
    catalog: ToolCatalog,
    client: RwLock<Option<Arc<TwitterApiClient>>>,
    tweet_cache: Option<ResponseCache<Vec<Tweet>>>,
    profile_cache: Option<ResponseCache<Profile>>,
    metrics: ToolMetrics,
}

impl TwitterTools {
    /// Create the façade. No client is built and no I/O happens until the
    /// first tool call or [`initialize`](Self::initialize).
    #[must_use]
    pub fn new(config: TwitterConfig) -> Self {
        Self {
            tweet_cache: config.tweet_cache_ttl().map(ResponseCache::new),
            profile_cache: config.profile_cache_ttl().map(ResponseCache::new),
            catalog: ToolCatalog::new(),
            client: RwLock::new(None),
            metrics: ToolMetrics::default(),
            config,
        }
    }

    /// The tool catalog.
    #[must_use]
    pub const fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn state(&self) -> ToolsState {
        if self.client.read().is_some() {
            ToolsState::Ready
        } else {
            ToolsState::Uninitialized
        }
    }

    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Build the API client.
    ///
    /// Missing credentials fail with [`TwitterError::Configuration`] and
    /// leave the façade uninitialized.
    #[instrument(skip(self))]
    pub fn initialize(&self) -> TwitterResult<Arc<TwitterApiClient>> {
        self.metrics.init_attempts.fetch_add(1, Ordering::Relaxed);

        let client = Arc::new(TwitterApiClient::new(&self.config)?);
        info!(oauth2 = client.uses_oauth2(), "Twitter tools initialized");

        // Concurrent first calls may each build a client; the last one wins
        *self.client.write() = Some(Arc::clone(&client));
        Ok(client)
    }

    fn ensure_initialized(&self) -> TwitterResult<Arc<TwitterApiClient>> {
        if let Some(client) = self.client.read().as_ref() {
            return Ok(Arc::clone(client));
        }
        self.initialize()
    }

    /// Invoke a tool by name with JSON arguments.
    ///
    /// Reads return their records; mutating tools return an
    /// [`ActionOutcome`]. Unknown tools, configuration errors and argument
    /// validation errors are always returned as `Err`.
    #[instrument(skip(self, args))]
    pub async fn invoke(&self, name: &str, args: Value) -> TwitterResult<Value> {
        let tool = self.catalog.resolve(name)?.name;

        let result = async {
            self.ensure_initialized()?;
            let call = ToolCall::parse(tool, &args)?;
            self.execute(call).await
        }
        .await;

        self.metrics.record_request(result.is_ok());
        if let Err(e) = &result {
            debug!(tool = %tool, error = %e, "Tool invocation failed");
        }
        result
    }

    /// Run an already validated call.
    pub async fn execute(&self, call: ToolCall) -> TwitterResult<Value> {
        let value = match call {
            ToolCall::GetProfile { username } => serde_json::to_value(self.get_profile(&username).await?)?,
            ToolCall::GetTweets { username, limit } => {
                serde_json::to_value(self.get_tweets(&username, limit).await?)?
            }
            ToolCall::GetTweet { id } => serde_json::to_value(self.get_tweet(&id).await?)?,
            ToolCall::SearchTweets { query, limit, mode } => {
                serde_json::to_value(self.search_tweets(&query, limit, mode).await?)?
            }
            ToolCall::SendTweet {
                text,
                in_reply_to,
                media,
            } => serde_json::to_value(
                self.send_tweet(&text, in_reply_to.as_deref(), &media)
                    .await?,
            )?,
            ToolCall::SendTweetWithPoll { text, poll } => {
                serde_json::to_value(self.send_tweet_with_poll(&text, &poll).await?)?
            }
            ToolCall::Retweet { id } => serde_json::to_value(self.retweet(&id).await?)?,
            ToolCall::LikeTweet { id } => serde_json::to_value(self.like_tweet(&id).await?)?,
            ToolCall::GetTrends => serde_json::to_value(self.get_trends().await?)?,
        };
        Ok(value)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Read tools
    // ─────────────────────────────────────────────────────────────────────────

    /// Look up a profile. `None` when the user does not exist.
    pub async fn get_profile(&self, username: &str) -> TwitterResult<Option<Profile>> {
        let client = self.ensure_initialized()?;
        let username = required("username", username)?;

        let key = ResponseCache::<Profile>::key("get_profile", &[username]);
        if let Some(profile) = self.profile_cache.as_ref().and_then(|c| c.get(&key)) {
            self.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(profile));
        }

        let response = client.get_user_by_username(username).await?;
        let profile = response.data.map(|user| normalize_profile(username, user));

        if let (Some(cache), Some(profile)) = (&self.profile_cache, &profile) {
            cache.insert(key, profile.clone());
        }
        Ok(profile)
    }

    /// A user's most recent tweets, at most `limit`.
    pub async fn get_tweets(&self, username: &str, limit: u32) -> TwitterResult<Vec<Tweet>> {
        let client = self.ensure_initialized()?;
        let username = required("username", username)?;
        let limit_key = limit.to_string();

        let key = ResponseCache::<Vec<Tweet>>::key("get_tweets", &[username, &limit_key]);
        if let Some(tweets) = self.cached_tweets(&key) {
            return Ok(tweets);
        }

        let Some(profile) = self.get_profile(username).await? else {
            debug!(username, "User not found");
            return Ok(Vec::new());
        };

        let response = client.get_user_tweets(&profile.id, limit).await?;
        let mut tweets = normalize(response);
        tweets.truncate(limit as usize);

        self.cache_tweets(key, &tweets);
        Ok(tweets)
    }

    /// A single tweet. `None` when it does not exist.
    pub async fn get_tweet(&self, id: &str) -> TwitterResult<Option<Tweet>> {
        let client = self.ensure_initialized()?;
        let id = required("id", id)?;

        let key = ResponseCache::<Vec<Tweet>>::key("get_tweet", &[id]);
        if let Some(tweets) = self.cached_tweets(&key) {
            return Ok(tweets.into_iter().next());
        }

        let tweets = normalize(client.get_tweet(id).await?);
        self.cache_tweets(key, &tweets);
        Ok(tweets.into_iter().next())
    }

    /// Recent tweets matching `query`, at most `limit`.
    pub async fn search_tweets(
        &self,
        query: &str,
        limit: u32,
        mode: SearchMode,
    ) -> TwitterResult<Vec<Tweet>> {
        let client = self.ensure_initialized()?;
        let query = required("query", query)?;
        let limit_key = limit.to_string();

        let key = ResponseCache::<Vec<Tweet>>::key(
            "search_tweets",
            &[query, &limit_key, mode.as_str()],
        );
        if let Some(tweets) = self.cached_tweets(&key) {
            return Ok(tweets);
        }

        let params = SearchTweetsParams {
            query: mode.apply(query),
            max_results: Some(limit),
            sort_order: Some(mode.sort_order().to_string()),
        };
        let mut tweets = normalize(client.search_recent(&params).await?);
        tweets.truncate(limit as usize);

        self.cache_tweets(key, &tweets);
        Ok(tweets)
    }

    /// Always fails: trends are not supported.
    pub async fn get_trends(&self) -> TwitterResult<Vec<Value>> {
        Err(TwitterError::Unimplemented("get_trends"))
    }

    fn cached_tweets(&self, key: &str) -> Option<Vec<Tweet>> {
        let tweets = self.tweet_cache.as_ref()?.get(key)?;
        self.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
        Some(tweets)
    }

    fn cache_tweets(&self, key: String, tweets: &[Tweet]) {
        if let Some(cache) = self.tweet_cache.as_ref().filter(|_| !tweets.is_empty()) {
            cache.insert(key, tweets.to_vec());
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutating tools
    // ─────────────────────────────────────────────────────────────────────────

    /// Post a tweet, optionally as a reply and with media.
    ///
    /// Media that fails to decode or upload is skipped; the tweet is still
    /// posted with whatever uploaded.
    pub async fn send_tweet(
        &self,
        text: &str,
        in_reply_to: Option<&str>,
        media: &[MediaUpload],
    ) -> TwitterResult<ActionOutcome> {
        let client = self.ensure_initialized()?;
        validate_tweet_text(text)?;

        let result = async {
            let media_ids = upload_all(&client, media).await;
            let request = CreateTweetRequest {
                text: text.to_string(),
                reply: in_reply_to
                    .filter(|id| !id.is_empty())
                    .map(|id| TweetReply {
                        in_reply_to_tweet_id: id.to_string(),
                    }),
                media: (!media_ids.is_empty()).then_some(TweetMedia { media_ids }),
                poll: None,
            };
            post(&client, &request).await
        }
        .await;

        envelope("send_tweet", result)
    }

    /// Post a tweet with a poll.
    pub async fn send_tweet_with_poll(
        &self,
        text: &str,
        poll: &PollSpec,
    ) -> TwitterResult<ActionOutcome> {
        let client = self.ensure_initialized()?;
        validate_tweet_text(text)?;

        let request = CreateTweetRequest {
            text: text.to_string(),
            poll: Some(TweetPoll {
                options: poll.options().to_vec(),
                duration_minutes: poll.duration_minutes(),
            }),
            ..Default::default()
        };

        envelope("send_tweet_with_poll", post(&client, &request).await)
    }

    /// Retweet as the authenticated user.
    pub async fn retweet(&self, id: &str) -> TwitterResult<ActionOutcome> {
        let client = self.ensure_initialized()?;
        let id = required("id", id)?;

        let result = client.retweet(id).await.map(|response| {
            acknowledged(id, response.data.is_none_or(|d| d.retweeted), "retweeted")
        });
        envelope("retweet", result)
    }

    /// Like a tweet as the authenticated user.
    pub async fn like_tweet(&self, id: &str) -> TwitterResult<ActionOutcome> {
        let client = self.ensure_initialized()?;
        let id = required("id", id)?;

        let result = client.like(id).await.map(|response| {
            acknowledged(id, response.data.is_none_or(|d| d.liked), "liked")
        });
        envelope("like_tweet", result)
    }

    /// Readiness and counters.
    #[must_use]
    pub fn health(&self) -> Value {
        let state = self.state();
        let oauth2 = self
            .client
            .read()
            .as_ref()
            .is_some_and(|client| client.uses_oauth2());

        json!({
            "status": if state == ToolsState::Ready { "healthy" } else { "not_ready" },
            "state": state,
            "oauth2": oauth2,
            "tools": self.catalog.len(),
            "metrics": self.metrics(),
        })
    }
}

fn required<'a>(field: &str, value: &'a str) -> TwitterResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TwitterError::missing(field));
    }
    Ok(value)
}

/// Fold failures of a mutating tool into the envelope, except for errors the
/// caller must see.
fn envelope(tool: &str, result: TwitterResult<ActionOutcome>) -> TwitterResult<ActionOutcome> {
    match result {
        Ok(outcome) => Ok(outcome),
        Err(e) if e.propagates_from_action() => Err(e),
        Err(e) => {
            warn!(tool, status = ?e.status(), error = %e, "Mutating tool failed");
            Ok(ActionOutcome::failed(&e))
        }
    }
}

/// Outcome of a state toggle the API echoes back. A 2xx without the echo
/// counts as applied.
fn acknowledged(id: &str, applied: bool, flag: &str) -> ActionOutcome {
    let mut outcome = ActionOutcome::succeeded(Some(id.to_string()), None);
    if !applied {
        warn!(tweet_id = id, flag, "API did not apply the action");
        outcome.success = false;
        outcome.error = Some(format!("API reported {flag}=false"));
    }
    outcome
}

async fn post(client: &TwitterApiClient, request: &CreateTweetRequest) -> TwitterResult<ActionOutcome> {
    let response = client.create_tweet(request).await?;
    let (id, text) = response
        .data
        .map_or((None, None), |created| (created.id, created.text));
    if id.is_none() {
        debug!("Tweet accepted without an echoed id");
    }
    Ok(ActionOutcome::succeeded(id, text))
}

async fn upload_all(client: &TwitterApiClient, media: &[MediaUpload]) -> Vec<String> {
    let mut ids = Vec::with_capacity(media.len());
    for (index, item) in media.iter().enumerate() {
        let bytes = match BASE64.decode(item.data.trim()) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(index, error = %e, "Skipping media with invalid base64");
                continue;
            }
        };
        match client.upload_media(bytes, &item.media_type).await {
            Ok(id) => ids.push(id),
            Err(e) => warn!(index, media_type = %item.media_type, error = %e, "Skipping media that failed to upload"),
        }
    }
    ids
}
