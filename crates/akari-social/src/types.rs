//! Wire types for the social data REST API.
//!
//! User objects come back in two dialects depending on the endpoint:
//! camelCase (`userName`, `followers`, `profilePicture`) and the legacy
//! snake_case Twitter shape (`screen_name`, `followers_count`,
//! `profile_image_url_https`). Both are accepted as separate optional fields
//! and merged in [`WireUser::into_metadata`].

use akari_core::{MentionResult, ProfileMetadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Legacy Twitter timestamp layout, e.g. `Tue Dec 10 07:00:30 +0000 2024`.
const LEGACY_TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireUser {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default, rename = "userName")]
    pub user_name: Option<String>,
    #[serde(default)]
    pub screen_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "profilePicture")]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub profile_image_url_https: Option<String>,
    #[serde(default)]
    pub followers: Option<i64>,
    #[serde(default)]
    pub followers_count: Option<i64>,
    #[serde(default)]
    pub following: Option<i64>,
    #[serde(default)]
    pub friends_count: Option<i64>,
    #[serde(default, rename = "statusesCount")]
    pub statuses_count_camel: Option<i64>,
    #[serde(default)]
    pub statuses_count: Option<i64>,
    #[serde(default, rename = "isBlueVerified")]
    pub is_blue_verified: Option<bool>,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default, rename = "createdAt")]
    pub created_at_camel: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl WireUser {
    /// Converts to [`ProfileMetadata`]; `None` when the object carries no handle.
    #[must_use]
    pub fn into_metadata(self) -> Option<ProfileMetadata> {
        let handle = self
            .user_name
            .or(self.screen_name)
            .map(|h| h.trim().trim_start_matches('@').to_owned())
            .filter(|h| !h.is_empty())?;

        let created = self.created_at_camel.or(self.created_at);

        Some(ProfileMetadata {
            external_id: self.id,
            handle,
            display_name: non_empty(self.name),
            bio: non_empty(self.description),
            avatar_url: non_empty(self.profile_picture.or(self.profile_image_url_https)),
            followers_count: self.followers.or(self.followers_count).unwrap_or(0),
            following_count: self.following.or(self.friends_count).unwrap_or(0),
            tweet_count: self
                .statuses_count_camel
                .or(self.statuses_count)
                .unwrap_or(0),
            is_verified: self.is_blue_verified.unwrap_or(false) || self.verified.unwrap_or(false),
            account_created_at: created.as_deref().and_then(parse_timestamp),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireTweet {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, rename = "likeCount")]
    pub like_count: i64,
    #[serde(default, rename = "replyCount")]
    pub reply_count: i64,
    #[serde(default, rename = "retweetCount")]
    pub retweet_count: i64,
    #[serde(default, rename = "quoteCount")]
    pub quote_count: i64,
    #[serde(default)]
    pub author: Option<WireUser>,
}

impl WireTweet {
    /// Converts to [`MentionResult`]; `None` when the tweet has no id or no
    /// usable author.
    #[must_use]
    pub fn into_mention(self) -> Option<MentionResult> {
        let tweet_id = self.id?;
        let author = self.author?.into_metadata()?;
        Some(MentionResult {
            tweet_id,
            text: self.text,
            author,
            created_at: self.created_at.as_deref().and_then(parse_timestamp),
            like_count: self.like_count,
            reply_count: self.reply_count,
            retweet_count: self.retweet_count,
            quote_count: self.quote_count,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UserInfoResponse {
    #[serde(default)]
    pub data: Option<WireUser>,
}

#[derive(Debug, Deserialize)]
pub struct FollowersResponse {
    #[serde(default)]
    pub followers: Vec<WireUser>,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TweetSearchResponse {
    #[serde(default)]
    pub tweets: Vec<WireTweet>,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserSearchResponse {
    #[serde(default)]
    pub users: Vec<WireUser>,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Parses RFC 3339 or the legacy Twitter timestamp layout.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, LEGACY_TIMESTAMP_FORMAT))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
