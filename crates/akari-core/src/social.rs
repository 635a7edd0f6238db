//! Social data types and the contract for the social-platform data source.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalize an X handle for comparison and storage: trims whitespace,
/// strips leading `@` characters, and lower-cases.
#[must_use]
pub fn normalize_handle(raw: &str) -> String {
    raw.trim().trim_start_matches('@').trim().to_lowercase()
}

/// Public profile metadata as returned by the social data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileMetadata {
    pub external_id: Option<String>,
    /// Handle without the leading `@`; casing as reported upstream.
    pub handle: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub followers_count: i64,
    pub following_count: i64,
    pub tweet_count: i64,
    pub is_verified: bool,
    pub account_created_at: Option<DateTime<Utc>>,
}

impl ProfileMetadata {
    /// Handle in normalized form (see [`normalize_handle`]).
    #[must_use]
    pub fn normalized_handle(&self) -> String {
        normalize_handle(&self.handle)
    }
}

/// One post returned by a mention/search query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionResult {
    pub tweet_id: String,
    pub text: String,
    pub author: ProfileMetadata,
    pub created_at: Option<DateTime<Utc>>,
    pub like_count: i64,
    pub reply_count: i64,
    pub retweet_count: i64,
    pub quote_count: i64,
}

/// Result ordering requested from a mention search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionSort {
    Latest,
    Top,
}

impl MentionSort {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MentionSort::Latest => "Latest",
            MentionSort::Top => "Top",
        }
    }
}

/// Best-effort access to social platform data.
///
/// Implementations never surface errors: a failed call yields `None` or an
/// empty `Vec`, and the failure is logged by the implementation.
#[async_trait]
pub trait SocialDataSource: Send + Sync {
    async fn get_user_info(&self, handle: &str) -> Option<ProfileMetadata>;

    /// A bounded follower sample; not exhaustive.
    async fn get_followers(&self, handle: &str, limit: usize) -> Vec<ProfileMetadata>;

    async fn search_mentions(
        &self,
        query: &str,
        sort: MentionSort,
        limit: usize,
    ) -> Vec<MentionResult>;

    async fn search_users(&self, query: &str, limit: usize) -> Vec<ProfileMetadata>;
}
