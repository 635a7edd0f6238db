//! Shared `reqwest` plumbing for the social and scoring clients.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};

use crate::error::SocialError;

/// Seconds to wait on a 429 that carries no usable `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

pub(crate) fn build_http_client(timeout_secs: u64, user_agent: &str) -> Result<Client, SocialError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// Parses `base_url`, normalised to end with exactly one slash so that
/// [`Url::join`] appends rather than replacing the last path segment.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, SocialError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| SocialError::InvalidBaseUrl {
        url: base_url.to_owned(),
        reason: e.to_string(),
    })
}

/// Maps a non-2xx response onto the matching [`SocialError`] variant.
pub(crate) fn check_status(response: &Response, url: &Url) -> Result<(), SocialError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return Err(SocialError::RateLimited {
            endpoint: url.path().to_owned(),
            retry_after_secs,
        });
    }

    if status == StatusCode::NOT_FOUND {
        return Err(SocialError::NotFound {
            url: url.path().to_owned(),
        });
    }

    if !status.is_success() {
        return Err(SocialError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.path().to_owned(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_base_url_appends_single_slash() {
        let url = parse_base_url("https://api.example.com//").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/");
        let joined = url.join("twitter/user/info").unwrap();
        assert_eq!(joined.as_str(), "https://api.example.com/twitter/user/info");
    }

    #[test]
    fn parse_base_url_keeps_path_prefix() {
        let url = parse_base_url("http://localhost:8080/v1").unwrap();
        let joined = url.join("score").unwrap();
        assert_eq!(joined.as_str(), "http://localhost:8080/v1/score");
    }

    #[test]
    fn parse_base_url_rejects_garbage() {
        let err = parse_base_url("not a url").unwrap_err();
        assert!(matches!(err, SocialError::InvalidBaseUrl { .. }));
    }
}
