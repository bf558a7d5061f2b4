//! Twitter/X tools for agents.
//!
//! Exposes a small set of Twitter/X operations as named tools with JSON
//! arguments and JSON results.
//!
//! ## Tools
//!
//! ### Reads
//! - `get_profile` - Profile by username
//! - `get_tweets` - A user's recent tweets
//! - `get_tweet` - Single tweet by id
//! - `search_tweets` - Recent search with a ranking/filter mode
//!
//! ### Writes
//! - `send_tweet` - Post, reply, attach media
//! - `send_tweet_with_poll` - Post with a poll
//! - `retweet`, `like_tweet` - Act as the authenticated user
//!
//! Writes never fail on API errors; they return an [`ActionOutcome`] with
//! `success = false`. Argument and configuration errors are always raised.
//!
//! ## Authentication
//! Every request is signed with OAuth 1.0a. When client credentials are
//! configured, v2 requests use an app-only OAuth 2.0 bearer token instead.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod auth;
mod cache;
pub mod client;
pub mod config;
mod connector;
pub mod error;
pub mod model;
pub mod normalize;
mod oauth;
pub mod tools;
pub mod types;

pub use client::TwitterApiClient;
pub use config::{Credentials, TwitterConfig};
pub use connector::{MetricsSnapshot, ToolsState, TwitterTools};
pub use error::{ApiErrorKind, TwitterError, TwitterResult};
pub use model::{ActionOutcome, MediaUpload, PollSpec, Profile, SearchMode, Tweet};
pub use oauth::OAuthSigner;
pub use tools::{ToolCall, ToolCatalog, ToolName};
