//! Integration tests for the social data and scoring clients using wiremock.

use akari_core::{MentionSort, ScoringOracle, SocialDataSource};
use akari_social::{HttpScoringOracle, SocialError, TwitterApiClient};
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn social_client(base_url: &str) -> TwitterApiClient {
    TwitterApiClient::with_base_url("test-key", 30, base_url)
        .expect("client construction should not fail")
        .with_retry_policy(2, 0)
}

fn oracle(base_url: &str) -> HttpScoringOracle {
    HttpScoringOracle::with_base_url(base_url, Some("oracle-key"), 30)
        .expect("oracle construction should not fail")
        .with_retry_policy(2, 0)
}

fn user(handle: &str, followers: i64) -> serde_json::Value {
    serde_json::json!({
        "id": format!("id-{handle}"),
        "userName": handle,
        "name": format!("Name {handle}"),
        "description": "building onchain",
        "followers": followers,
        "following": 10,
        "statusesCount": 100,
        "isBlueVerified": false,
        "createdAt": "Tue Dec 10 07:00:30 +0000 2024"
    })
}

// ---------------------------------------------------------------------------
// User info
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_user_info_sends_api_key_and_parses_profile() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/twitter/user/info"))
        .and(query_param("userName", "aave"))
        .and(header("X-API-Key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "msg": "",
            "data": user("aave", 500_000)
        })))
        .mount(&server)
        .await;

    let client = social_client(&server.uri());
    let profile = client.get_user_info("@aave").await.expect("profile");

    assert_eq!(profile.handle, "aave");
    assert_eq!(profile.followers_count, 500_000);
    assert_eq!(profile.display_name.as_deref(), Some("Name aave"));
}

#[tokio::test]
async fn get_user_info_returns_none_on_404() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/twitter/user/info"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = social_client(&server.uri());
    assert!(client.get_user_info("ghost").await.is_none());
}

#[tokio::test]
async fn api_error_envelope_becomes_typed_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/twitter/user/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "error",
            "msg": "Unauthorized"
        })))
        .mount(&server)
        .await;

    let client = social_client(&server.uri());
    let err = client.fetch_user_info("aave").await.unwrap_err();
    assert!(matches!(err, SocialError::ApiError(ref m) if m == "Unauthorized"));
    assert!(client.get_user_info("aave").await.is_none());
}

// ---------------------------------------------------------------------------
// Followers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_followers_follows_cursor_and_truncates_to_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/twitter/user/followers"))
        .and(query_param("userName", "aave"))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "followers": [user("a1", 10), user("a2", 20)],
            "has_next_page": true,
            "next_cursor": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/twitter/user/followers"))
        .and(query_param("cursor", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "followers": [user("a3", 30), user("a4", 40)],
            "has_next_page": true,
            "next_cursor": "page-3"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = social_client(&server.uri());
    let followers = client.get_followers("aave", 3).await;

    let handles: Vec<&str> = followers.iter().map(|f| f.handle.as_str()).collect();
    assert_eq!(handles, vec!["a1", "a2", "a3"]);
}

#[tokio::test]
async fn get_followers_stops_when_no_next_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/twitter/user/followers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "followers": [user("only", 1)],
            "has_next_page": false,
            "next_cursor": "ignored"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = social_client(&server.uri());
    let followers = client.get_followers("aave", 100).await;
    assert_eq!(followers.len(), 1);
}

#[tokio::test]
async fn get_followers_with_zero_limit_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = social_client(&server.uri());
    assert!(client.get_followers("aave", 0).await.is_empty());
}

#[tokio::test]
async fn server_errors_are_retried_then_reported_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/twitter/user/followers"))
        .respond_with(ResponseTemplate::new(503))
        // Two calls, each one attempt plus two retries.
        .expect(6)
        .mount(&server)
        .await;

    let client = social_client(&server.uri());
    assert!(client.get_followers("aave", 10).await.is_empty());

    let err = client.fetch_followers("aave", 10).await.unwrap_err();
    assert!(matches!(
        err,
        SocialError::UnexpectedStatus { status: 503, .. }
    ));
}

// ---------------------------------------------------------------------------
// Mentions and user search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_mentions_parses_tweets_with_authors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/twitter/tweet/advanced_search"))
        .and(query_param("query", "@aave OR \"Aave\""))
        .and(query_param("queryType", "Latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "tweets": [
                {
                    "id": "1001",
                    "text": "aave v4 looks great",
                    "createdAt": "Wed Mar 05 10:00:00 +0000 2025",
                    "likeCount": 12,
                    "replyCount": 1,
                    "retweetCount": 3,
                    "quoteCount": 0,
                    "author": user("defi_dad", 90_000)
                },
                { "id": "1002", "text": "orphan tweet" }
            ],
            "has_next_page": false
        })))
        .mount(&server)
        .await;

    let client = social_client(&server.uri());
    let mentions = client
        .search_mentions("@aave OR \"Aave\"", MentionSort::Latest, 50)
        .await;

    assert_eq!(mentions.len(), 1);
    assert_eq!(mentions[0].tweet_id, "1001");
    assert_eq!(mentions[0].author.handle, "defi_dad");
    assert_eq!(mentions[0].like_count, 12);
    assert!(mentions[0].created_at.is_some());
}

#[tokio::test]
async fn search_users_returns_matches() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/twitter/user/search"))
        .and(query_param("query", "Lido"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "users": [user("LidoFinance", 400_000), user("lido_fan", 12)],
            "has_next_page": false
        })))
        .mount(&server)
        .await;

    let client = social_client(&server.uri());
    let users = client.search_users("Lido", 5).await;
    let handles: Vec<&str> = users.iter().map(|u| u.handle.as_str()).collect();
    assert_eq!(handles, vec!["LidoFinance", "lido_fan"]);
}

#[tokio::test]
async fn malformed_body_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/twitter/user/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = social_client(&server.uri());
    let err = client.fetch_user_search("x", 5).await.unwrap_err();
    assert!(matches!(err, SocialError::Deserialize { .. }));
}

// ---------------------------------------------------------------------------
// Scoring oracle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn oracle_posts_handle_and_parses_bundle() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/score"))
        .and(header("Authorization", "Bearer oracle-key"))
        .and(body_json(serde_json::json!({ "handle": "alice" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "akariScore": 72.5,
            "authenticity": 81.0,
            "influence": 64.0,
            "signalDensity": 55.0,
            "farmRisk": 9.0
        })))
        .mount(&server)
        .await;

    let bundle = oracle(&server.uri())
        .score("@alice")
        .await
        .expect("bundle");
    assert!((bundle.akari_score - 72.5).abs() < f64::EPSILON);
    assert!((bundle.influence - 64.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn oracle_returns_none_for_unknown_handle() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/score"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let oracle = oracle(&server.uri());
    assert!(oracle.fetch_score("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn oracle_retries_rate_limit_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/score"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/score"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "akariScore": 50.0,
            "authenticity": 60.0,
            "influence": 40.0,
            "signalDensity": 40.0,
            "farmRisk": 30.0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bundle = oracle(&server.uri()).score("bob").await;
    assert!(bundle.is_some());
}

#[tokio::test]
async fn oracle_gives_up_after_persistent_rate_limit() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/score"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(3)
        .mount(&server)
        .await;

    assert!(oracle(&server.uri()).score("carol").await.is_none());
}
