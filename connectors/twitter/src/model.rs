//! Tool-facing records.
//!
//! Reads return [`Profile`] and [`Tweet`]; writes return [`ActionOutcome`].
//! All of them are self-contained: no expansion keys survive normalization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TwitterError, TwitterResult};

/// Placeholder handle for tweets whose author was not expanded.
pub const UNKNOWN_USERNAME: &str = "unknown";

/// Placeholder display name for tweets whose author was not expanded.
pub const UNKNOWN_DISPLAY_NAME: &str = "Unknown User";

/// Maximum tweet length in characters.
pub const MAX_TWEET_CHARS: usize = 280;

/// A user profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    /// The handle the caller asked for, not the one the API echoed.
    pub username: String,
    pub display_name: String,
    pub bio: String,
    pub verified: bool,
    pub profile_image_url: Option<String>,
    pub followers_count: u64,
    pub following_count: u64,
    pub tweet_count: u64,
    pub created_at: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
}

/// A tweet with its author, media and references resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub text: String,
    pub username: String,
    pub display_name: String,
    pub profile_image_url: Option<String>,
    pub created_at: Option<String>,
    pub like_count: u64,
    pub retweet_count: u64,
    pub reply_count: u64,
    pub media: Vec<MediaRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retweeted_status: Option<ReferencedStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quoted_status: Option<ReferencedStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to_status_id: Option<String>,
}

/// A retweeted or quoted tweet, reduced to what an agent needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencedStatus {
    pub id: String,
    pub text: String,
    pub username: String,
}

/// An attached photo, video or GIF.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    #[serde(rename = "type")]
    pub media_type: String,
    pub url: String,
}

/// Media to attach to a new tweet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaUpload {
    /// Base64-encoded file contents
    pub data: String,
    /// MIME type, e.g. `image/png`
    pub media_type: String,
}

/// A validated poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollSpec {
    options: Vec<String>,
    duration_minutes: u32,
}

impl PollSpec {
    pub const MIN_OPTIONS: usize = 2;
    pub const MAX_OPTIONS: usize = 4;
    pub const MAX_OPTION_CHARS: usize = 25;
    pub const MIN_DURATION_MINUTES: u32 = 5;
    /// Seven days.
    pub const MAX_DURATION_MINUTES: u32 = 10_080;

    /// Validate and build a poll.
    pub fn new(options: Vec<String>, duration_minutes: u32) -> TwitterResult<Self> {
        if !(Self::MIN_OPTIONS..=Self::MAX_OPTIONS).contains(&options.len()) {
            return Err(TwitterError::validation(
                "options",
                format!(
                    "poll needs {} to {} options, got {}",
                    Self::MIN_OPTIONS,
                    Self::MAX_OPTIONS,
                    options.len()
                ),
            ));
        }
        for option in &options {
            if option.trim().is_empty() {
                return Err(TwitterError::validation("options", "poll options must not be empty"));
            }
            if option.chars().count() > Self::MAX_OPTION_CHARS {
                return Err(TwitterError::validation(
                    "options",
                    format!(
                        "poll option '{option}' exceeds {} characters",
                        Self::MAX_OPTION_CHARS
                    ),
                ));
            }
        }
        if !(Self::MIN_DURATION_MINUTES..=Self::MAX_DURATION_MINUTES).contains(&duration_minutes) {
            return Err(TwitterError::validation(
                "duration_minutes",
                format!(
                    "must be between {} and {}, got {duration_minutes}",
                    Self::MIN_DURATION_MINUTES,
                    Self::MAX_DURATION_MINUTES
                ),
            ));
        }

        Ok(Self {
            options,
            duration_minutes,
        })
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub const fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }
}

/// Result envelope for mutating tools.
///
/// `success = true` with `id = None` means the API accepted the call without
/// echoing an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionOutcome {
    /// A successful outcome.
    #[must_use]
    pub const fn succeeded(id: Option<String>, text: Option<String>) -> Self {
        Self {
            success: true,
            id,
            text,
            error: None,
        }
    }

    /// A failed outcome carrying the error message.
    #[must_use]
    pub fn failed(error: &TwitterError) -> Self {
        Self {
            success: false,
            id: None,
            text: None,
            error: Some(error.to_string()),
        }
    }
}

/// How `search_tweets` ranks and filters results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Latest,
    Top,
    People,
    Photos,
    Videos,
}

impl SearchMode {
    pub const ALL: [Self; 5] = [
        Self::Latest,
        Self::Top,
        Self::People,
        Self::Photos,
        Self::Videos,
    ];

    /// Value for the `sort_order` query parameter.
    #[must_use]
    pub const fn sort_order(self) -> &'static str {
        match self {
            Self::Latest | Self::Photos | Self::Videos => "recency",
            Self::Top | Self::People => "relevancy",
        }
    }

    /// Operator appended to the query, if any.
    #[must_use]
    pub const fn query_operator(self) -> Option<&'static str> {
        match self {
            Self::Photos => Some("has:images"),
            Self::Videos => Some("has:videos"),
            Self::Latest | Self::Top | Self::People => None,
        }
    }

    /// The query actually sent for this mode.
    #[must_use]
    pub fn apply(self, query: &str) -> String {
        match self.query_operator() {
            Some(op) => format!("{query} {op}"),
            None => query.to_string(),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Top => "top",
            Self::People => "people",
            Self::Photos => "photos",
            Self::Videos => "videos",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = TwitterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                TwitterError::validation(
                    "mode",
                    format!("unknown search mode '{s}', expected one of latest, top, people, photos, videos"),
                )
            })
    }
}

/// Check tweet text before posting.
pub fn validate_tweet_text(text: &str) -> TwitterResult<()> {
    if text.trim().is_empty() {
        return Err(TwitterError::validation("text", "tweet text must not be empty"));
    }
    let chars = text.chars().count();
    if chars > MAX_TWEET_CHARS {
        return Err(TwitterError::validation(
            "text",
            format!("tweet is {chars} characters, limit is {MAX_TWEET_CHARS}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("option {i}")).collect()
    }

    #[test]
    fn test_poll_option_count_bounds() {
        assert!(PollSpec::new(options(1), 60).unwrap_err().is_validation());
        assert!(PollSpec::new(options(5), 60).unwrap_err().is_validation());
        assert!(PollSpec::new(options(2), 60).is_ok());
        assert!(PollSpec::new(options(4), 60).is_ok());
    }

    #[test]
    fn test_poll_duration_bounds() {
        assert!(PollSpec::new(options(2), 4).is_err());
        assert!(PollSpec::new(options(2), 10_081).is_err());
        assert_eq!(PollSpec::new(options(2), 5).unwrap().duration_minutes(), 5);
        assert_eq!(PollSpec::new(options(2), 10_080).unwrap().duration_minutes(), 10_080);
    }

    #[test]
    fn test_poll_option_content() {
        let blank = vec!["yes".to_string(), "  ".to_string()];
        assert!(PollSpec::new(blank, 60).is_err());

        let long = vec!["yes".to_string(), "x".repeat(26)];
        let err = PollSpec::new(long, 60).unwrap_err();
        assert!(matches!(err, TwitterError::Validation { ref field, .. } if field == "options"));
    }

    #[test]
    fn test_search_mode_mapping() {
        assert_eq!(SearchMode::Latest.sort_order(), "recency");
        assert_eq!(SearchMode::Top.sort_order(), "relevancy");
        assert_eq!(SearchMode::People.sort_order(), "relevancy");
        assert_eq!(SearchMode::Photos.apply("cats"), "cats has:images");
        assert_eq!(SearchMode::Videos.apply("cats"), "cats has:videos");
        assert_eq!(SearchMode::Top.apply("cats"), "cats");
    }

    #[test]
    fn test_search_mode_parse() {
        assert_eq!("Top".parse::<SearchMode>().unwrap(), SearchMode::Top);
        assert_eq!("videos".parse::<SearchMode>().unwrap(), SearchMode::Videos);
        assert!("trending".parse::<SearchMode>().unwrap_err().is_validation());
    }

    #[test]
    fn test_tweet_text_limit() {
        assert!(validate_tweet_text(&"a".repeat(280)).is_ok());
        assert!(validate_tweet_text(&"a".repeat(281)).is_err());
        // Counted in characters, not bytes
        assert!(validate_tweet_text(&"é".repeat(280)).is_ok());
        assert!(validate_tweet_text("").is_err());
    }

    #[test]
    fn test_outcome_always_serializes_id() {
        let value = serde_json::to_value(ActionOutcome::succeeded(None, None)).unwrap();
        assert_eq!(value, serde_json::json!({"success": true, "id": null}));

        let failed = ActionOutcome::failed(&TwitterError::OAuth("boom".into()));
        let value = serde_json::to_value(failed).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["id"], serde_json::Value::Null);
        assert_eq!(value["error"], "OAuth error: boom");
    }
}
