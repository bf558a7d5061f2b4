//! Tool catalog and typed tool calls.
//!
//! The catalog describes every tool with a JSON Schema the agent host can
//! show to a model. [`ToolCall::parse`] turns a name plus JSON arguments into
//! a typed call, validating everything that can be checked without I/O.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};

use crate::error::{TwitterError, TwitterResult};
use crate::model::{MediaUpload, PollSpec, SearchMode, validate_tweet_text};

/// Default number of tweets returned by list tools.
pub const DEFAULT_LIMIT: u32 = 10;
/// Largest accepted `limit`.
pub const MAX_LIMIT: u32 = 100;

/// Every tool this adapter exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    GetProfile,
    GetTweets,
    GetTweet,
    SearchTweets,
    SendTweet,
    SendTweetWithPoll,
    Retweet,
    LikeTweet,
    GetTrends,
}

impl ToolName {
    /// All tools, in catalog order.
    pub const ALL: [Self; 9] = [
        Self::GetProfile,
        Self::GetTweets,
        Self::GetTweet,
        Self::SearchTweets,
        Self::SendTweet,
        Self::SendTweetWithPoll,
        Self::Retweet,
        Self::LikeTweet,
        Self::GetTrends,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetProfile => "get_profile",
            Self::GetTweets => "get_tweets",
            Self::GetTweet => "get_tweet",
            Self::SearchTweets => "search_tweets",
            Self::SendTweet => "send_tweet",
            Self::SendTweetWithPoll => "send_tweet_with_poll",
            Self::Retweet => "retweet",
            Self::LikeTweet => "like_tweet",
            Self::GetTrends => "get_trends",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = TwitterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| TwitterError::UnknownTool(s.to_string()))
    }
}

/// JSON Schema type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

/// One parameter of a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolParameter {
    pub name: &'static str,
    pub param_type: ParamType,
    pub required: bool,
    pub description: &'static str,
    /// Allowed values for string parameters.
    pub allowed: Option<&'static [&'static str]>,
    /// Element type for arrays.
    pub items: Option<ParamType>,
}

impl ToolParameter {
    const fn new(
        name: &'static str,
        param_type: ParamType,
        required: bool,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            param_type,
            required,
            description,
            allowed: None,
            items: None,
        }
    }

    const fn required(name: &'static str, param_type: ParamType, description: &'static str) -> Self {
        Self::new(name, param_type, true, description)
    }

    const fn optional(name: &'static str, param_type: ParamType, description: &'static str) -> Self {
        Self::new(name, param_type, false, description)
    }

    const fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = Some(allowed);
        self
    }

    const fn of(mut self, items: ParamType) -> Self {
        self.items = Some(items);
        self
    }

    fn schema(&self) -> JsonValue {
        let mut schema = json!({
            "type": self.param_type,
            "description": self.description,
        });
        if let Some(allowed) = self.allowed {
            schema["enum"] = json!(allowed);
        }
        if let Some(items) = self.items {
            schema["items"] = json!({ "type": items });
        }
        schema
    }
}

/// JSON Schema for a tool's argument object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: IndexMap<String, JsonValue>,
    #[serde(default)]
    pub required: Vec<String>,
}

/// A tool as listed to the agent host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: ToolName,
    pub description: &'static str,
    pub parameters: Vec<ToolParameter>,
}

impl ToolDescriptor {
    /// Argument schema, properties in declaration order.
    #[must_use]
    pub fn schema(&self) -> ObjectSchema {
        ObjectSchema {
            schema_type: "object".to_string(),
            properties: self
                .parameters
                .iter()
                .map(|p| (p.name.to_string(), p.schema()))
                .collect(),
            required: self
                .parameters
                .iter()
                .filter(|p| p.required)
                .map(|p| p.name.to_string())
                .collect(),
        }
    }

    /// `{name, description, parameters}` definition for the host.
    #[must_use]
    pub fn definition(&self) -> JsonValue {
        json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.schema(),
        })
    }
}

const SEARCH_MODES: &[&str] = &["latest", "top", "people", "photos", "videos"];

/// The fixed, ordered set of tools.
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    tools: IndexMap<ToolName, ToolDescriptor>,
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolCatalog {
    /// Build the catalog. The result does not depend on credentials.
    #[must_use]
    pub fn new() -> Self {
        use ParamType as Ty;
        use ToolParameter as P;

        let descriptors = [
            ToolDescriptor {
                name: ToolName::GetProfile,
                description: "Get a user's profile by username",
                parameters: vec![P::required("username", Ty::String, "Handle without the leading @")],
            },
            ToolDescriptor {
                name: ToolName::GetTweets,
                description: "Get a user's most recent tweets",
                parameters: vec![
                    P::required("username", Ty::String, "Handle without the leading @"),
                    P::optional("limit", Ty::Integer, "Number of tweets to return (default 10, 1-100)"),
                ],
            },
            ToolDescriptor {
                name: ToolName::GetTweet,
                description: "Get a single tweet by id",
                parameters: vec![P::required("id", Ty::String, "Tweet id")],
            },
            ToolDescriptor {
                name: ToolName::SearchTweets,
                description: "Search tweets from the last seven days",
                parameters: vec![
                    P::required("query", Ty::String, "Search query"),
                    P::optional("limit", Ty::Integer, "Number of tweets to return (default 10, 1-100)"),
                    P::optional("mode", Ty::String, "Ranking and filter mode (default latest)")
                        .one_of(SEARCH_MODES),
                ],
            },
            ToolDescriptor {
                name: ToolName::SendTweet,
                description: "Post a tweet, optionally as a reply or with media",
                parameters: vec![
                    P::required("text", Ty::String, "Tweet text (at most 280 characters)"),
                    P::optional("in_reply_to", Ty::String, "Id of the tweet to reply to"),
                    P::optional(
                        "media",
                        Ty::Array,
                        "Attachments as objects with base64 `data` and a MIME `media_type`",
                    )
                    .of(Ty::Object),
                ],
            },
            ToolDescriptor {
                name: ToolName::SendTweetWithPoll,
                description: "Post a tweet with a poll",
                parameters: vec![
                    P::required("text", Ty::String, "Tweet text (at most 280 characters)"),
                    P::required("options", Ty::Array, "2 to 4 poll options, each at most 25 characters")
                        .of(Ty::String),
                    P::required("duration_minutes", Ty::Integer, "Poll duration in minutes (5-10080)"),
                ],
            },
            ToolDescriptor {
                name: ToolName::Retweet,
                description: "Retweet a tweet",
                parameters: vec![P::required("id", Ty::String, "Tweet id")],
            },
            ToolDescriptor {
                name: ToolName::LikeTweet,
                description: "Like a tweet",
                parameters: vec![P::required("id", Ty::String, "Tweet id")],
            },
            ToolDescriptor {
                name: ToolName::GetTrends,
                description: "Get trending topics (not implemented)",
                parameters: Vec::new(),
            },
        ];

        Self {
            tools: descriptors.into_iter().map(|d| (d.name, d)).collect(),
        }
    }

    #[must_use]
    pub fn get(&self, name: ToolName) -> Option<&ToolDescriptor> {
        self.tools.get(&name)
    }

    /// Resolve a tool by its wire name.
    pub fn resolve(&self, name: &str) -> TwitterResult<&ToolDescriptor> {
        let name = name.parse::<ToolName>()?;
        self.get(name)
            .ok_or_else(|| TwitterError::UnknownTool(name.to_string()))
    }

    /// Descriptors in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values()
    }

    /// Host-facing definitions in catalog order.
    #[must_use]
    pub fn definitions(&self) -> Vec<JsonValue> {
        self.iter().map(ToolDescriptor::definition).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// A validated tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    GetProfile {
        username: String,
    },
    GetTweets {
        username: String,
        limit: u32,
    },
    GetTweet {
        id: String,
    },
    SearchTweets {
        query: String,
        limit: u32,
        mode: SearchMode,
    },
    SendTweet {
        text: String,
        in_reply_to: Option<String>,
        media: Vec<MediaUpload>,
    },
    SendTweetWithPoll {
        text: String,
        poll: PollSpec,
    },
    Retweet {
        id: String,
    },
    LikeTweet {
        id: String,
    },
    GetTrends,
}

impl ToolCall {
    /// Validate `args` for `name`.
    ///
    /// `args` must be a JSON object; `null` counts as no arguments.
    pub fn parse(name: ToolName, args: &JsonValue) -> TwitterResult<Self> {
        let empty = Map::new();
        let args = match args {
            JsonValue::Object(map) => Args(map),
            JsonValue::Null => Args(&empty),
            _ => {
                return Err(TwitterError::validation(
                    "args",
                    "tool arguments must be a JSON object",
                ));
            }
        };

        let call = match name {
            ToolName::GetProfile => Self::GetProfile {
                username: args.required_str("username")?,
            },
            ToolName::GetTweets => Self::GetTweets {
                username: args.required_str("username")?,
                limit: args.limit()?,
            },
            ToolName::GetTweet => Self::GetTweet {
                id: args.required_str("id")?,
            },
            ToolName::SearchTweets => Self::SearchTweets {
                query: args.required_str("query")?,
                limit: args.limit()?,
                mode: args
                    .optional_str("mode")?
                    .map(|m| m.parse::<SearchMode>())
                    .transpose()?
                    .unwrap_or_default(),
            },
            ToolName::SendTweet => {
                let text = args.required_str("text")?;
                validate_tweet_text(&text)?;
                Self::SendTweet {
                    text,
                    in_reply_to: args.optional_str("in_reply_to")?,
                    media: args.media()?,
                }
            }
            ToolName::SendTweetWithPoll => {
                let text = args.required_str("text")?;
                validate_tweet_text(&text)?;
                let options = args.required_strings("options")?;
                let duration = args.required_u32("duration_minutes")?;
                Self::SendTweetWithPoll {
                    text,
                    poll: PollSpec::new(options, duration)?,
                }
            }
            ToolName::Retweet => Self::Retweet {
                id: args.required_str("id")?,
            },
            ToolName::LikeTweet => Self::LikeTweet {
                id: args.required_str("id")?,
            },
            ToolName::GetTrends => Self::GetTrends,
        };

        Ok(call)
    }
}

/// Typed access to a tool's argument object.
struct Args<'a>(&'a Map<String, JsonValue>);

impl Args<'_> {
    /// Present and non-null.
    fn value(&self, field: &str) -> Option<&JsonValue> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    fn optional_str(&self, field: &str) -> TwitterResult<Option<String>> {
        match self.value(field) {
            None => Ok(None),
            Some(JsonValue::String(s)) if s.trim().is_empty() => Ok(None),
            Some(JsonValue::String(s)) => Ok(Some(s.clone())),
            // Ids arrive as numbers from some hosts
            Some(JsonValue::Number(n)) => Ok(Some(n.to_string())),
            Some(_) => Err(TwitterError::validation(field, "expected a string")),
        }
    }

    fn required_str(&self, field: &str) -> TwitterResult<String> {
        self.optional_str(field)?
            .ok_or_else(|| TwitterError::missing(field))
    }

    fn optional_u64(&self, field: &str) -> TwitterResult<Option<u64>> {
        let invalid = || TwitterError::validation(field, "expected a non-negative integer");
        match self.value(field) {
            None => Ok(None),
            Some(JsonValue::Number(n)) => n.as_u64().map(Some).ok_or_else(invalid),
            Some(JsonValue::String(s)) => s.trim().parse().map(Some).map_err(|_| invalid()),
            Some(_) => Err(invalid()),
        }
    }

    fn required_u32(&self, field: &str) -> TwitterResult<u32> {
        let value = self
            .optional_u64(field)?
            .ok_or_else(|| TwitterError::missing(field))?;
        // Saturate so range checks report the real problem
        Ok(u32::try_from(value).unwrap_or(u32::MAX))
    }

    /// `limit`, defaulted and clamped to the accepted range.
    fn limit(&self) -> TwitterResult<u32> {
        Ok(self
            .optional_u64("limit")?
            .map_or(DEFAULT_LIMIT, |n| {
                u32::try_from(n).unwrap_or(MAX_LIMIT).clamp(1, MAX_LIMIT)
            }))
    }

    fn required_strings(&self, field: &str) -> TwitterResult<Vec<String>> {
        let Some(value) = self.value(field) else {
            return Err(TwitterError::missing(field));
        };
        let JsonValue::Array(items) = value else {
            return Err(TwitterError::validation(field, "expected an array of strings"));
        };
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| TwitterError::validation(field, "expected an array of strings"))
            })
            .collect()
    }

    fn media(&self) -> TwitterResult<Vec<MediaUpload>> {
        match self.value("media") {
            None => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                TwitterError::validation("media", format!("expected [{{data, media_type}}]: {e}"))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_and_names() {
        let catalog = ToolCatalog::new();
        let names: Vec<&str> = catalog.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "get_profile",
                "get_tweets",
                "get_tweet",
                "search_tweets",
                "send_tweet",
                "send_tweet_with_poll",
                "retweet",
                "like_tweet",
                "get_trends"
            ]
        );
        assert_eq!(catalog.len(), ToolName::ALL.len());
    }

    #[test]
    fn test_schema_rendering() {
        let catalog = ToolCatalog::new();
        let search = catalog.get(ToolName::SearchTweets).unwrap().definition();

        assert_eq!(search["name"], "search_tweets");
        assert_eq!(search["parameters"]["type"], "object");
        assert_eq!(search["parameters"]["required"], json!(["query"]));
        assert_eq!(search["parameters"]["properties"]["limit"]["type"], "integer");
        assert_eq!(
            search["parameters"]["properties"]["mode"]["enum"],
            json!(["latest", "top", "people", "photos", "videos"])
        );

        let schema = catalog.get(ToolName::SendTweet).unwrap().schema();
        let keys: Vec<&str> = schema.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, ["text", "in_reply_to", "media"]);

        let poll = catalog.get(ToolName::SendTweetWithPoll).unwrap().definition();
        assert_eq!(poll["parameters"]["properties"]["options"]["items"]["type"], "string");
    }

    #[test]
    fn test_resolve_unknown_tool() {
        let catalog = ToolCatalog::new();
        assert!(catalog.resolve("get_tweet").is_ok());
        assert!(matches!(
            catalog.resolve("delete_tweet"),
            Err(TwitterError::UnknownTool(ref n)) if n == "delete_tweet"
        ));
    }

    #[test]
    fn test_missing_required_names_field() {
        let err = ToolCall::parse(ToolName::GetProfile, &json!({})).unwrap_err();
        assert!(matches!(err, TwitterError::Validation { ref field, .. } if field == "username"));

        let err = ToolCall::parse(ToolName::Retweet, &JsonValue::Null).unwrap_err();
        assert!(matches!(err, TwitterError::Validation { ref field, .. } if field == "id"));

        let err = ToolCall::parse(ToolName::SearchTweets, &json!({"query": "  "})).unwrap_err();
        assert!(matches!(err, TwitterError::Validation { ref field, .. } if field == "query"));
    }

    #[test]
    fn test_limit_defaults_and_clamps() {
        let limit = |args: JsonValue| match ToolCall::parse(ToolName::GetTweets, &args).unwrap() {
            ToolCall::GetTweets { limit, .. } => limit,
            other => panic!("unexpected call {other:?}"),
        };

        assert_eq!(limit(json!({"username": "a"})), 10);
        assert_eq!(limit(json!({"username": "a", "limit": 0})), 1);
        assert_eq!(limit(json!({"username": "a", "limit": 500})), 100);
        assert_eq!(limit(json!({"username": "a", "limit": "25"})), 25);
        assert!(ToolCall::parse(ToolName::GetTweets, &json!({"username": "a", "limit": -3})).is_err());
    }

    #[test]
    fn test_search_mode_parsed() {
        let call = ToolCall::parse(
            ToolName::SearchTweets,
            &json!({"query": "rust", "mode": "photos"}),
        )
        .unwrap();
        assert_eq!(
            call,
            ToolCall::SearchTweets {
                query: "rust".into(),
                limit: 10,
                mode: SearchMode::Photos
            }
        );

        let err = ToolCall::parse(ToolName::SearchTweets, &json!({"query": "rust", "mode": "hot"}))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_send_tweet_validation() {
        let long = "x".repeat(281);
        assert!(ToolCall::parse(ToolName::SendTweet, &json!({"text": long})).is_err());

        let call = ToolCall::parse(
            ToolName::SendTweet,
            &json!({
                "text": "hi",
                "in_reply_to": 12345,
                "media": [{"data": "aGk=", "media_type": "image/png"}]
            }),
        )
        .unwrap();
        let ToolCall::SendTweet {
            in_reply_to, media, ..
        } = call
        else {
            panic!("expected send_tweet");
        };
        assert_eq!(in_reply_to.as_deref(), Some("12345"));
        assert_eq!(media.len(), 1);

        let err = ToolCall::parse(ToolName::SendTweet, &json!({"text": "hi", "media": "x"}))
            .unwrap_err();
        assert!(matches!(err, TwitterError::Validation { ref field, .. } if field == "media"));
    }

    #[test]
    fn test_poll_arguments() {
        let parse = |options: JsonValue, duration: JsonValue| {
            ToolCall::parse(
                ToolName::SendTweetWithPoll,
                &json!({"text": "pick", "options": options, "duration_minutes": duration}),
            )
        };

        assert!(parse(json!(["a"]), json!(60)).is_err());
        assert!(parse(json!(["a", "b", "c", "d", "e"]), json!(60)).is_err());
        assert!(parse(json!(["a", "b"]), json!(4)).is_err());
        assert!(parse(json!(["a", "b"]), json!(10_081)).is_err());
        assert!(parse(json!(["a", "b"]), json!(5)).is_ok());
        assert!(parse(json!(["a", "b"]), json!(10_080)).is_ok());
        assert!(parse(json!(["a", 2]), json!(60)).is_err());

        let err = ToolCall::parse(
            ToolName::SendTweetWithPoll,
            &json!({"text": "pick", "options": ["a", "b"]}),
        )
        .unwrap_err();
        assert!(matches!(err, TwitterError::Validation { ref field, .. } if field == "duration_minutes"));
    }

    #[test]
    fn test_non_object_args_rejected() {
        assert!(ToolCall::parse(ToolName::GetTrends, &json!([1, 2])).is_err());
        assert_eq!(
            ToolCall::parse(ToolName::GetTrends, &json!({})).unwrap(),
            ToolCall::GetTrends
        );
    }
}
