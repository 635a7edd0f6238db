//! HTTP client for the profile-scoring service.
//!
//! `POST {base}/score` with `{"handle": "..."}` answers a camelCase
//! [`ScoreBundle`]. A 404 means the account is unknown to the scorer.

use akari_core::{AppConfig, ScoreBundle, ScoringOracle};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;

use crate::error::SocialError;
use crate::http::{build_http_client, check_status, parse_base_url};
use crate::retry::retry_with_backoff;

const DEFAULT_USER_AGENT: &str = "akari/0.1 (circle-engine)";

#[derive(Debug, Serialize)]
struct ScoreRequest<'a> {
    handle: &'a str,
}

pub struct HttpScoringOracle {
    client: Client,
    score_url: Url,
    api_key: Option<String>,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl HttpScoringOracle {
    /// # Errors
    ///
    /// Returns [`SocialError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`SocialError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        base_url: &str,
        api_key: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Self, SocialError> {
        Self::build(base_url, api_key, timeout_secs, DEFAULT_USER_AGENT)
    }

    /// # Errors
    ///
    /// Same as [`HttpScoringOracle::with_base_url`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, SocialError> {
        let oracle = Self::build(
            &config.scoring_url,
            config.scoring_api_key.as_deref(),
            config.request_timeout_secs,
            &config.user_agent,
        )?;
        Ok(oracle.with_retry_policy(config.max_retries, config.retry_backoff_base_ms))
    }

    fn build(
        base_url: &str,
        api_key: Option<&str>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, SocialError> {
        let base = parse_base_url(base_url)?;
        let score_url = base.join("score").map_err(|e| SocialError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client: build_http_client(timeout_secs, user_agent)?,
            score_url,
            api_key: api_key.map(str::to_owned).filter(|k| !k.is_empty()),
            max_retries: 3,
            backoff_base_ms: 1_000,
        })
    }

    #[must_use]
    pub fn with_retry_policy(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Scores one handle. `Ok(None)` when the scorer does not know it.
    ///
    /// # Errors
    ///
    /// Returns [`SocialError`] on transport, status, or decode failure after
    /// retries are exhausted.
    pub async fn fetch_score(&self, handle: &str) -> Result<Option<ScoreBundle>, SocialError> {
        let handle = handle.trim().trim_start_matches('@');

        let result = retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let mut request = self
                .client
                .post(self.score_url.clone())
                .json(&ScoreRequest { handle });
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            let response = request.send().await?;
            check_status(&response, &self.score_url)?;
            let text = response.text().await?;
            serde_json::from_str::<ScoreBundle>(&text).map_err(|e| SocialError::Deserialize {
                context: format!("score ({handle})"),
                source: e,
            })
        })
        .await;

        match result {
            Ok(bundle) => Ok(Some(bundle)),
            Err(SocialError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl ScoringOracle for HttpScoringOracle {
    async fn score(&self, handle: &str) -> Option<ScoreBundle> {
        self.fetch_score(handle).await.unwrap_or_else(|e| {
            tracing::warn!(handle, error = %e, "scoring failed");
            None
        })
    }
}
