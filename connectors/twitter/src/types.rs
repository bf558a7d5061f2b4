//! Twitter API wire types.
//!
//! These mirror the JSON the API sends and accepts. The tool-facing records
//! live in [`crate::model`].

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Core Response Wrapper
// ─────────────────────────────────────────────────────────────────────────────

/// Standard Twitter API v2 response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterResponse<T> {
    /// The primary data (absent on empty results)
    pub data: Option<T>,

    /// Included expansions (users, tweets, media)
    #[serde(default)]
    pub includes: Option<Includes>,

    /// Metadata about the response
    #[serde(default)]
    pub meta: Option<ResponseMeta>,
}

impl<T> Default for TwitterResponse<T> {
    fn default() -> Self {
        Self {
            data: None,
            includes: None,
            meta: None,
        }
    }
}

/// A payload whose `data` is either one object or an array of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// List endpoints (timelines, search)
    Many(Vec<T>),
    /// Single-object lookup (`/2/tweets/{id}`)
    One(T),
}

impl<T> OneOrMany<T> {
    /// Flatten into a list, preserving order.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

impl<T> From<T> for OneOrMany<T> {
    fn from(item: T) -> Self {
        Self::One(item)
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(items: Vec<T>) -> Self {
        Self::Many(items)
    }
}

/// Included expansions in Twitter API responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Includes {
    /// Expanded user objects
    #[serde(default)]
    pub users: Vec<UserData>,

    /// Expanded tweet objects
    #[serde(default)]
    pub tweets: Vec<TweetData>,

    /// Expanded media objects
    #[serde(default)]
    pub media: Vec<MediaData>,
}

/// Response metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Number of results
    #[serde(default)]
    pub result_count: Option<u32>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tweet Types
// ─────────────────────────────────────────────────────────────────────────────

/// Twitter tweet object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TweetData {
    /// Tweet ID
    pub id: String,

    /// Tweet text content
    #[serde(default)]
    pub text: String,

    /// Author user ID
    #[serde(default)]
    pub author_id: Option<String>,

    /// Tweet creation timestamp (ISO 8601)
    #[serde(default)]
    pub created_at: Option<String>,

    /// Referenced tweets (replies, quotes, retweets)
    #[serde(default)]
    pub referenced_tweets: Option<Vec<ReferencedTweet>>,

    /// Attached media keys
    #[serde(default)]
    pub attachments: Option<Attachments>,

    /// Public engagement metrics
    #[serde(default)]
    pub public_metrics: Option<TweetPublicMetrics>,
}

/// Referenced tweet (retweet, quote, reply).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferencedTweet {
    /// Reference type: "retweeted", "quoted", "replied_to"
    #[serde(rename = "type")]
    pub ref_type: String,

    /// Referenced tweet ID
    pub id: String,
}

/// Tweet attachments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attachments {
    /// Media keys
    #[serde(default)]
    pub media_keys: Option<Vec<String>>,

    /// Poll IDs
    #[serde(default)]
    pub poll_ids: Option<Vec<String>>,
}

/// Tweet public metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TweetPublicMetrics {
    #[serde(default)]
    pub retweet_count: u64,

    #[serde(default)]
    pub reply_count: u64,

    #[serde(default)]
    pub like_count: u64,

    #[serde(default)]
    pub quote_count: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// User Types
// ─────────────────────────────────────────────────────────────────────────────

/// Twitter user object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserData {
    /// User ID
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Username (handle without @)
    #[serde(default)]
    pub username: String,

    /// User bio
    #[serde(default)]
    pub description: Option<String>,

    /// Profile image URL
    #[serde(default)]
    pub profile_image_url: Option<String>,

    /// User location
    #[serde(default)]
    pub location: Option<String>,

    /// User URL
    #[serde(default)]
    pub url: Option<String>,

    /// Whether the account is verified
    #[serde(default)]
    pub verified: Option<bool>,

    /// Account creation timestamp
    #[serde(default)]
    pub created_at: Option<String>,

    /// Public metrics
    #[serde(default)]
    pub public_metrics: Option<UserPublicMetrics>,
}

/// User public metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPublicMetrics {
    #[serde(default)]
    pub followers_count: u64,

    #[serde(default)]
    pub following_count: u64,

    #[serde(default)]
    pub tweet_count: u64,

    #[serde(default)]
    pub listed_count: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Media Types
// ─────────────────────────────────────────────────────────────────────────────

/// Media object from `includes.media`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaData {
    /// Media key referenced by `attachments.media_keys`
    pub media_key: String,

    /// "photo", "video" or "animated_gif"
    #[serde(rename = "type", default)]
    pub media_type: String,

    /// Direct URL (photos)
    #[serde(default)]
    pub url: Option<String>,

    /// Preview image (videos, GIFs)
    #[serde(default)]
    pub preview_image_url: Option<String>,
}

/// v1.1 media upload response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaUploadResponse {
    /// Numeric media ID
    #[serde(default)]
    pub media_id: Option<u64>,

    /// Media ID as a string; use this one
    #[serde(default)]
    pub media_id_string: Option<String>,
}

impl MediaUploadResponse {
    /// The media ID, preferring the string form.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.media_id_string
            .clone()
            .or_else(|| self.media_id.map(|id| id.to_string()))
    }
}

/// v1.1 `account/verify_credentials` response (only the fields used).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyCredentialsResponse {
    /// User ID as a string
    pub id_str: String,

    /// Handle of the authenticated user
    #[serde(default)]
    pub screen_name: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Request Types
// ─────────────────────────────────────────────────────────────────────────────

/// Create tweet request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTweetRequest {
    /// Tweet text
    pub text: String,

    /// Reply settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<TweetReply>,

    /// Media attachments
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<TweetMedia>,

    /// Poll
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll: Option<TweetPoll>,
}

/// Tweet reply settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetReply {
    /// ID of tweet being replied to
    pub in_reply_to_tweet_id: String,
}

/// Tweet media attachments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetMedia {
    /// Media IDs
    pub media_ids: Vec<String>,
}

/// Tweet poll settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetPoll {
    /// Poll options (2-4)
    pub options: Vec<String>,

    /// Poll duration in minutes (5-10080)
    pub duration_minutes: u32,
}

/// Create tweet response.
///
/// `data` is optional: an accepted post without an echoed tweet is still a
/// success.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTweetResponse {
    /// Created tweet data
    #[serde(default)]
    pub data: Option<CreatedTweet>,
}

/// Created tweet data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedTweet {
    /// Tweet ID
    #[serde(default)]
    pub id: Option<String>,

    /// Tweet text
    #[serde(default)]
    pub text: Option<String>,
}

/// Body for retweet and like requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetIdRequest {
    /// Target tweet ID
    pub tweet_id: String,
}

/// Retweet response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetweetResponse {
    #[serde(default)]
    pub data: Option<RetweetedData>,
}

/// Retweet state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetweetedData {
    /// Whether the tweet is now retweeted
    #[serde(default)]
    pub retweeted: bool,
}

/// Like response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LikeResponse {
    #[serde(default)]
    pub data: Option<LikedData>,
}

/// Like state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikedData {
    /// Whether the tweet is now liked
    #[serde(default)]
    pub liked: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Search Types
// ─────────────────────────────────────────────────────────────────────────────

/// Search tweets query parameters.
#[derive(Debug, Clone, Default)]
pub struct SearchTweetsParams {
    /// Search query (required)
    pub query: String,

    /// Maximum results (10-100)
    pub max_results: Option<u32>,

    /// "recency" or "relevancy"
    pub sort_order: Option<String>,
}
