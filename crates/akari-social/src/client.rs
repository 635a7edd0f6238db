//! HTTP client for the social data REST API.
//!
//! Inherent `fetch_*` methods return typed errors; the [`SocialDataSource`]
//! impl wraps them into the best-effort contract (log and return empty).

use akari_core::{AppConfig, MentionResult, MentionSort, ProfileMetadata, SocialDataSource};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::SocialError;
use crate::http::{build_http_client, check_status, parse_base_url};
use crate::retry::retry_with_backoff;
use crate::types::{
    FollowersResponse, TweetSearchResponse, UserInfoResponse, UserSearchResponse, WireTweet,
    WireUser,
};

const DEFAULT_BASE_URL: &str = "https://api.twitterapi.io";
const DEFAULT_USER_AGENT: &str = "akari/0.1 (circle-engine)";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

/// Largest page the followers endpoint accepts.
const MAX_FOLLOWER_PAGE_SIZE: usize = 200;

/// Hard stop on cursor pagination. Guards against cycling cursors.
const MAX_PAGES: usize = 20;

const USER_INFO_PATH: &str = "twitter/user/info";
const FOLLOWERS_PATH: &str = "twitter/user/followers";
const ADVANCED_SEARCH_PATH: &str = "twitter/tweet/advanced_search";
const USER_SEARCH_PATH: &str = "twitter/user/search";

/// Client for the social data REST API.
///
/// Use [`TwitterApiClient::new`] for production or
/// [`TwitterApiClient::with_base_url`] to point at a mock server in tests.
pub struct TwitterApiClient {
    client: Client,
    api_key: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl TwitterApiClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`SocialError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, SocialError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SocialError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`SocialError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, SocialError> {
        Ok(Self {
            client: build_http_client(timeout_secs, DEFAULT_USER_AGENT)?,
            api_key: api_key.to_owned(),
            base_url: parse_base_url(base_url)?,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Builds a client from the application config: base URL, key, timeout,
    /// user agent, and retry policy.
    ///
    /// # Errors
    ///
    /// Same as [`TwitterApiClient::with_base_url`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, SocialError> {
        Ok(Self {
            client: build_http_client(config.request_timeout_secs, &config.user_agent)?,
            api_key: config.social_api_key.clone(),
            base_url: parse_base_url(&config.social_base_url)?,
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        })
    }

    /// Overrides the retry policy. `max_retries = 0` disables retries.
    #[must_use]
    pub fn with_retry_policy(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Looks up one account. `Ok(None)` when the API reports it unknown.
    ///
    /// # Errors
    ///
    /// Returns [`SocialError`] on transport, status, or decode failure.
    pub async fn fetch_user_info(
        &self,
        handle: &str,
    ) -> Result<Option<ProfileMetadata>, SocialError> {
        let handle = handle.trim().trim_start_matches('@');
        let body = match self
            .request_json(USER_INFO_PATH, &[("userName", handle)])
            .await
        {
            Ok(body) => body,
            Err(SocialError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let envelope: UserInfoResponse =
            serde_json::from_value(body).map_err(|e| SocialError::Deserialize {
                context: format!("user info ({handle})"),
                source: e,
            })?;

        Ok(envelope.data.and_then(WireUser::into_metadata))
    }

    /// Fetches up to `limit` followers of `handle`, following cursors.
    ///
    /// # Errors
    ///
    /// Returns [`SocialError`] on transport, status, or decode failure.
    pub async fn fetch_followers(
        &self,
        handle: &str,
        limit: usize,
    ) -> Result<Vec<ProfileMetadata>, SocialError> {
        let handle = handle.trim().trim_start_matches('@');
        let page_size = limit.clamp(1, MAX_FOLLOWER_PAGE_SIZE).to_string();
        self.paginate(
            FOLLOWERS_PATH,
            &[("userName", handle), ("pageSize", &page_size)],
            limit,
            |page: FollowersResponse| {
                let users = page
                    .followers
                    .into_iter()
                    .filter_map(WireUser::into_metadata)
                    .collect();
                (users, next_cursor(page.has_next_page, page.next_cursor))
            },
        )
        .await
    }

    /// Runs an advanced tweet search, returning up to `limit` results.
    ///
    /// # Errors
    ///
    /// Returns [`SocialError`] on transport, status, or decode failure.
    pub async fn fetch_mentions(
        &self,
        query: &str,
        sort: MentionSort,
        limit: usize,
    ) -> Result<Vec<MentionResult>, SocialError> {
        self.paginate(
            ADVANCED_SEARCH_PATH,
            &[("query", query), ("queryType", sort.as_str())],
            limit,
            |page: TweetSearchResponse| {
                let mentions = page
                    .tweets
                    .into_iter()
                    .filter_map(WireTweet::into_mention)
                    .collect();
                (mentions, next_cursor(page.has_next_page, page.next_cursor))
            },
        )
        .await
    }

    /// Searches accounts by free text, returning up to `limit` matches.
    ///
    /// # Errors
    ///
    /// Returns [`SocialError`] on transport, status, or decode failure.
    pub async fn fetch_user_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ProfileMetadata>, SocialError> {
        self.paginate(
            USER_SEARCH_PATH,
            &[("query", query)],
            limit,
            |page: UserSearchResponse| {
                let users = page
                    .users
                    .into_iter()
                    .filter_map(WireUser::into_metadata)
                    .collect();
                (users, next_cursor(page.has_next_page, page.next_cursor))
            },
        )
        .await
    }

    /// Follows `cursor` pages until `limit` items are collected, the API
    /// reports no next page, a cursor repeats, or [`MAX_PAGES`] is reached.
    async fn paginate<P, T, F>(
        &self,
        path: &str,
        params: &[(&str, &str)],
        limit: usize,
        mut extract: F,
    ) -> Result<Vec<T>, SocialError>
    where
        P: DeserializeOwned,
        F: FnMut(P) -> (Vec<T>, Option<String>),
    {
        let mut items = Vec::new();
        if limit == 0 {
            return Ok(items);
        }

        let mut cursor: Option<String> = None;
        for page_number in 1..=MAX_PAGES {
            let mut page_params: Vec<(&str, &str)> = params.to_vec();
            if let Some(c) = cursor.as_deref() {
                page_params.push(("cursor", c));
            }

            let body = self.request_json(path, &page_params).await?;
            let page: P = serde_json::from_value(body).map_err(|e| SocialError::Deserialize {
                context: format!("{path} page {page_number}"),
                source: e,
            })?;

            let (batch, next) = extract(page);
            let batch_was_empty = batch.is_empty();
            items.extend(batch);

            if items.len() >= limit || batch_was_empty {
                break;
            }
            match next {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                _ => break,
            }
        }

        items.truncate(limit);
        Ok(items)
    }

    /// Builds the request URL for `path` with percent-encoded query parameters.
    fn build_url(&self, path: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(&format!("{}{path}", self.base_url.path()));
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    /// Sends an authenticated GET with retry, asserts a 2xx status, parses
    /// the body as JSON, and surfaces `"status": "error"` envelopes.
    async fn request_json(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<serde_json::Value, SocialError> {
        let url = self.build_url(path, params);

        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(url.clone())
                    .header("X-API-Key", &self.api_key)
                    .send()
                    .await?;
                check_status(&response, &url)?;
                let text = response.text().await?;
                serde_json::from_str::<serde_json::Value>(&text).map_err(|e| {
                    SocialError::Deserialize {
                        context: url.path().to_owned(),
                        source: e,
                    }
                })
            }
        })
        .await?;

        Self::check_api_error(&body)?;
        Ok(body)
    }

    fn check_api_error(body: &serde_json::Value) -> Result<(), SocialError> {
        if body.get("status").and_then(serde_json::Value::as_str) == Some("error") {
            let msg = body
                .get("msg")
                .or_else(|| body.get("message"))
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(SocialError::ApiError(msg));
        }
        Ok(())
    }
}

fn next_cursor(has_next_page: bool, cursor: Option<String>) -> Option<String> {
    if has_next_page {
        cursor.filter(|c| !c.is_empty())
    } else {
        None
    }
}

#[async_trait]
impl SocialDataSource for TwitterApiClient {
    async fn get_user_info(&self, handle: &str) -> Option<ProfileMetadata> {
        self.fetch_user_info(handle).await.unwrap_or_else(|e| {
            tracing::warn!(handle, error = %e, "user info lookup failed");
            None
        })
    }

    async fn get_followers(&self, handle: &str, limit: usize) -> Vec<ProfileMetadata> {
        self.fetch_followers(handle, limit)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(handle, limit, error = %e, "follower fetch failed");
                Vec::new()
            })
    }

    async fn search_mentions(
        &self,
        query: &str,
        sort: MentionSort,
        limit: usize,
    ) -> Vec<MentionResult> {
        self.fetch_mentions(query, sort, limit)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(query, limit, error = %e, "mention search failed");
                Vec::new()
            })
    }

    async fn search_users(&self, query: &str, limit: usize) -> Vec<ProfileMetadata> {
        self.fetch_user_search(query, limit)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(query, limit, error = %e, "user search failed");
                Vec::new()
            })
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
