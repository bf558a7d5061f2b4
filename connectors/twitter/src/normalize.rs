//! Flattening of expansion-based API payloads into self-contained records.
//!
//! The v2 API returns referenced users, tweets and media in a side table
//! (`includes`) keyed by id or media key. Normalization joins them back onto
//! each primary tweet. Missing side-table entries never fail: authors fall
//! back to placeholders, media keys are dropped and references stay unset.

use std::collections::HashMap;

use tracing::debug;

use crate::{
    model::{
        MediaRef, Profile, ReferencedStatus, Tweet, UNKNOWN_DISPLAY_NAME, UNKNOWN_USERNAME,
    },
    types::{Includes, MediaData, OneOrMany, TweetData, TwitterResponse, UserData},
};

/// Lookup tables built from an `includes` bag.
#[derive(Debug, Default)]
struct Expansions<'a> {
    users: HashMap<&'a str, &'a UserData>,
    tweets: HashMap<&'a str, &'a TweetData>,
    media: HashMap<&'a str, &'a MediaData>,
}

impl<'a> Expansions<'a> {
    fn new(includes: Option<&'a Includes>) -> Self {
        let Some(includes) = includes else {
            return Self::default();
        };

        Self {
            users: includes.users.iter().map(|u| (u.id.as_str(), u)).collect(),
            tweets: includes.tweets.iter().map(|t| (t.id.as_str(), t)).collect(),
            media: includes
                .media
                .iter()
                .map(|m| (m.media_key.as_str(), m))
                .collect(),
        }
    }

    fn author(&self, tweet: &TweetData) -> Option<&'a UserData> {
        tweet
            .author_id
            .as_deref()
            .and_then(|id| self.users.get(id).copied())
    }

    fn media_for(&self, tweet: &TweetData) -> Vec<MediaRef> {
        tweet
            .attachments
            .as_ref()
            .and_then(|a| a.media_keys.as_ref())
            .into_iter()
            .flatten()
            .filter_map(|key| self.media.get(key.as_str()))
            .map(|m| MediaRef {
                media_type: m.media_type.clone(),
                url: m
                    .url
                    .clone()
                    .or_else(|| m.preview_image_url.clone())
                    .unwrap_or_default(),
            })
            .collect()
    }

    fn referenced(&self, id: &str, primary_username: &str) -> Option<ReferencedStatus> {
        let included = self.tweets.get(id)?;
        let username = match self.author(included) {
            Some(author) => author.username.clone(),
            None => {
                debug!(
                    tweet_id = id,
                    "Referenced tweet author not expanded, attributing to primary author"
                );
                primary_username.to_string()
            }
        };

        Some(ReferencedStatus {
            id: included.id.clone(),
            text: included.text.clone(),
            username,
        })
    }

    fn tweet(&self, raw: TweetData) -> Tweet {
        let author = self.author(&raw);
        let username = author.map_or_else(|| UNKNOWN_USERNAME.to_string(), |a| a.username.clone());
        let metrics = raw.public_metrics.clone().unwrap_or_default();
        let media = self.media_for(&raw);

        let mut tweet = Tweet {
            display_name: author.map_or_else(|| UNKNOWN_DISPLAY_NAME.to_string(), |a| a.name.clone()),
            profile_image_url: author.and_then(|a| a.profile_image_url.clone()),
            created_at: raw.created_at,
            like_count: metrics.like_count,
            retweet_count: metrics.retweet_count,
            reply_count: metrics.reply_count,
            media,
            id: raw.id,
            text: raw.text,
            username,
            ..Tweet::default()
        };

        for reference in raw.referenced_tweets.unwrap_or_default() {
            match reference.ref_type.as_str() {
                "retweeted" => {
                    tweet.retweeted_status = self.referenced(&reference.id, &tweet.username);
                }
                "quoted" => {
                    tweet.quoted_status = self.referenced(&reference.id, &tweet.username);
                }
                "replied_to" => tweet.in_reply_to_status_id = Some(reference.id),
                other => debug!(ref_type = other, "Ignoring unknown reference type"),
            }
        }

        tweet
    }
}

/// Normalize a tweet lookup, timeline or search response.
///
/// Output preserves input order. An absent `data` yields an empty list.
#[must_use]
pub fn normalize(response: TwitterResponse<OneOrMany<TweetData>>) -> Vec<Tweet> {
    let data = response.data.map(OneOrMany::into_vec).unwrap_or_default();
    normalize_tweets(data, response.includes.as_ref())
}

/// Normalize primary tweets against an optional `includes` bag.
#[must_use]
pub fn normalize_tweets(data: Vec<TweetData>, includes: Option<&Includes>) -> Vec<Tweet> {
    let expansions = Expansions::new(includes);
    data.into_iter().map(|raw| expansions.tweet(raw)).collect()
}

/// Build a profile, keeping the caller's `username`.
#[must_use]
pub fn normalize_profile(username: &str, user: UserData) -> Profile {
    let metrics = user.public_metrics.unwrap_or_default();

    Profile {
        id: user.id,
        username: username.to_string(),
        display_name: user.name,
        bio: user.description.unwrap_or_default(),
        verified: user.verified.unwrap_or(false),
        profile_image_url: user.profile_image_url,
        followers_count: metrics.followers_count,
        following_count: metrics.following_count,
        tweet_count: metrics.tweet_count,
        created_at: user.created_at,
        location: user.location,
        url: user.url,
    }
}
