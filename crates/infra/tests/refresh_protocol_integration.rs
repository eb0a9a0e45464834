//! Integration tests for the single-flight refresh protocol
//!
//! **Coverage:**
//! - Expired token: 401 → one refresh → replay with the new token
//! - Concurrent expiry: N in-flight 401s share one refresh call
//! - Failed refresh: every waiter rejected, credentials cleared, one
//!   redirect signal
//! - Refresh timeout and a cancelled refresh leader
//! - No recursion: a 401 on the replay is returned to the caller
//! - Public endpoints: no Authorization header and no refresh
//!
//! **Infrastructure:**
//! - WireMock HTTP server (simulates the backend)
//! - In-memory credential store and recording session listener

mod support;

use std::time::Duration;

use coursehub_common::RefreshError;
use coursehub_infra::{ApiError, ApiRequest};
use futures::future::join_all;
use reqwest::StatusCode;
use serde_json::{json, Value};
use support::{Harness, REFRESH_PATH};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

// ============================================================================
// Scenario A: expired token is refreshed and the request replayed
// ============================================================================

#[tokio::test]
async fn expired_token_is_refreshed_and_request_replayed() {
    let harness = Harness::signed_in().await;
    harness.mount_expiring("/courses/", json!([{"id": 1}])).await;
    harness.mount_refresh(200, json!({"access": "T2"}), Duration::ZERO).await;
    Mock::given(method("GET"))
        .and(path("/modules/"))
        .and(header("Authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&harness.server)
        .await;

    let courses: Vec<Value> = harness.client.get("/courses/").await.expect("replay succeeds");
    assert_eq!(courses[0]["id"], 1);

    // Follow-up request uses the new token directly.
    let modules: Vec<Value> = harness.client.get("/modules/").await.expect("modules");
    assert!(modules.is_empty());

    assert_eq!(harness.calls_to(REFRESH_PATH).await, 1);
    assert_eq!(harness.client.refresh_cycles(), 1);
    assert_eq!(harness.listener.expirations(), 0);
}

// ============================================================================
// Scenario B / P1 / P2: concurrent 401s share one refresh
// ============================================================================

#[tokio::test]
async fn concurrent_expiry_triggers_exactly_one_refresh() {
    let harness = Harness::signed_in().await;
    harness.mount_expiring("/courses/", json!({"route": "courses"})).await;
    harness.mount_expiring("/users/me/", json!({"route": "me"})).await;
    harness.mount_expiring("/organizations/5/", json!({"route": "org"})).await;
    harness.mount_refresh(200, json!({"access": "T2"}), Duration::from_millis(200)).await;

    let client = &harness.client;
    let results = join_all(
        ["/courses/", "/users/me/", "/organizations/5/"]
            .into_iter()
            .map(|route| async move { client.get::<Value>(route).await }),
    )
    .await;

    let routes: Vec<String> = results
        .into_iter()
        .map(|result| result.expect("every request resolves")["route"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(routes, ["courses", "me", "org"]);

    assert_eq!(harness.calls_to(REFRESH_PATH).await, 1);
    assert_eq!(harness.client.refresh_cycles(), 1);
    assert!(!harness.client.is_refreshing());
}

#[tokio::test]
async fn many_concurrent_requests_each_replay_once() {
    let harness = Harness::signed_in().await;
    harness.mount_expiring("/courses/", json!({"ok": true})).await;
    harness.mount_refresh(200, json!({"access": "T2"}), Duration::from_millis(150)).await;

    let client = &harness.client;
    let results =
        join_all((0..8).map(|_| async move { client.get::<Value>("/courses/").await })).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(harness.calls_to(REFRESH_PATH).await, 1);

    // 8 originals with T1 plus 8 replays with T2.
    let requests = harness.server.received_requests().await.unwrap();
    let with_token = |token: &str| {
        requests
            .iter()
            .filter(|request| request.url.path() == "/courses/")
            .filter(|request| {
                request.headers.get("authorization").and_then(|value| value.to_str().ok())
                    == Some(token)
            })
            .count()
    };
    assert_eq!(with_token("Bearer T1"), 8);
    assert_eq!(with_token("Bearer T2"), 8);
}

// ============================================================================
// Scenario C / P4: failed refresh
// ============================================================================

#[tokio::test]
async fn failed_refresh_rejects_everyone_and_clears_session() {
    let harness = Harness::signed_in().await;
    harness.mount_expiring("/courses/", json!([])).await;
    harness.mount_expiring("/users/me/", json!({})).await;
    harness.mount_expiring("/organizations/5/", json!({})).await;
    harness
        .mount_refresh(401, json!({"detail": "Token is invalid or expired"}), Duration::from_millis(200))
        .await;

    let client = &harness.client;
    let results = join_all(
        ["/courses/", "/users/me/", "/organizations/5/"]
            .into_iter()
            .map(|route| async move { client.get::<Value>(route).await }),
    )
    .await;

    for result in results {
        match result {
            Err(ApiError::Refresh(RefreshError::Rejected { status, .. })) => {
                assert_eq!(status, 401);
            }
            other => panic!("expected refresh rejection, got {other:?}"),
        }
    }

    assert_eq!(harness.store.snapshot(), (None, None));
    assert_eq!(harness.listener.expirations(), 1);
    assert_eq!(harness.listener.last_login_path().as_deref(), Some("/login"));
    assert_eq!(harness.calls_to(REFRESH_PATH).await, 1);
    assert!(!harness.client.is_refreshing());
}

#[tokio::test]
async fn successful_refresh_keeps_both_credentials() {
    let harness = Harness::signed_in().await;
    harness.mount_expiring("/courses/", json!([])).await;
    harness.mount_refresh(200, json!({"access": "T2", "refresh": "R2"}), Duration::ZERO).await;

    let _: Value = harness.client.get("/courses/").await.expect("replay succeeds");

    let (access, refresh) = harness.store.snapshot();
    assert_eq!(access.as_deref(), Some("T2"));
    assert_eq!(refresh.as_deref(), Some("R2"));
}

#[tokio::test]
async fn missing_refresh_token_is_terminal() {
    let harness = Harness::signed_in().await;
    harness.store.set_raw(Some("T1"), None);
    harness.mount_expiring("/courses/", json!([])).await;

    let result = harness.client.get::<Value>("/courses/").await;
    assert!(matches!(result, Err(ApiError::Refresh(RefreshError::MissingRefreshToken))));
    assert_eq!(harness.store.snapshot(), (None, None));
    assert_eq!(harness.listener.expirations(), 1);
    assert_eq!(harness.calls_to(REFRESH_PATH).await, 0);
}

#[tokio::test]
async fn unreadable_refresh_body_is_terminal() {
    let harness = Harness::signed_in().await;
    harness.mount_expiring("/courses/", json!([])).await;
    harness.mount_refresh(200, json!({"token": "T2"}), Duration::ZERO).await;

    let result = harness.client.get::<Value>("/courses/").await;
    assert!(matches!(result, Err(ApiError::Refresh(RefreshError::InvalidResponse(_)))));
    assert_eq!(harness.store.snapshot(), (None, None));
}

#[tokio::test]
async fn refresh_timeout_is_terminal() {
    let harness = Harness::signed_in_with_timeout(1).await;
    harness.mount_expiring("/courses/", json!([])).await;
    harness.mount_refresh(200, json!({"access": "T2"}), Duration::from_millis(1500)).await;

    let result = harness.client.get::<Value>("/courses/").await;

    assert!(
        matches!(result, Err(ApiError::Refresh(RefreshError::Network(_)))),
        "got {result:?}"
    );
    assert_eq!(harness.store.snapshot(), (None, None));
    assert_eq!(harness.listener.expirations(), 1);
    assert!(!harness.client.is_refreshing());
}

#[tokio::test]
async fn cancelled_leader_hands_refresh_to_a_follower() {
    let harness = Harness::signed_in().await;
    harness.mount_expiring("/courses/", json!([])).await;
    harness.mount_expiring("/users/me/", json!({"route": "me"})).await;
    harness.mount_expiring("/organizations/5/", json!({"route": "org"})).await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "T2"}))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&harness.server)
        .await;

    let client = &harness.client;
    // The leader gives up while its refresh is still in flight.
    let leader = tokio::time::timeout(Duration::from_millis(150), client.get::<Value>("/courses/"));
    let followers = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        join_all(
            ["/users/me/", "/organizations/5/"]
                .into_iter()
                .map(|route| async move { client.get::<Value>(route).await }),
        )
        .await
    };

    let (leader, followers) = tokio::join!(leader, followers);

    assert!(leader.is_err(), "leader should have been cancelled");
    let routes: Vec<Value> = followers
        .into_iter()
        .map(|result| result.expect("followers recover")["route"].clone())
        .collect();
    assert_eq!(routes, [json!("me"), json!("org")]);

    // The cancelled cycle plus the one a follower ran; the session survives.
    assert_eq!(harness.client.refresh_cycles(), 2);
    assert_eq!(harness.calls_to(REFRESH_PATH).await, 2);
    assert_eq!(harness.store.snapshot().0.as_deref(), Some("T2"));
    assert_eq!(harness.listener.expirations(), 0);
    assert!(!harness.client.is_refreshing());
}

// ============================================================================
// P3: no recursion
// ============================================================================

#[tokio::test]
async fn second_401_after_replay_is_returned() {
    let harness = Harness::signed_in().await;
    Mock::given(method("GET"))
        .and(path("/courses/"))
        .respond_with(ResponseTemplate::new(401).set_body_string("still unauthorized"))
        .mount(&harness.server)
        .await;
    harness.mount_refresh(200, json!({"access": "T2"}), Duration::ZERO).await;

    let err = harness.client.get::<Value>("/courses/").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.body(), Some("still unauthorized"));

    assert_eq!(harness.calls_to("/courses/").await, 2);
    assert_eq!(harness.calls_to(REFRESH_PATH).await, 1);
    // The session itself was refreshed and stays.
    assert_eq!(harness.store.snapshot().0.as_deref(), Some("T2"));
    assert_eq!(harness.listener.expirations(), 0);
}

#[tokio::test]
async fn later_expiry_starts_a_new_cycle() {
    let harness = Harness::signed_in().await;
    harness.mount_expiring("/courses/", json!([])).await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "T2"})))
        .up_to_n_times(1)
        .mount(&harness.server)
        .await;
    let _: Value = harness.client.get("/courses/").await.expect("first cycle");

    // T2 expires too.
    Mock::given(method("GET"))
        .and(path("/stats/"))
        .and(header("Authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stats/"))
        .and(header("Authorization", "Bearer T3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"users": 3})))
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "T3"})))
        .mount(&harness.server)
        .await;

    let stats: Value = harness.client.get("/stats/").await.expect("second cycle");
    assert_eq!(stats["users"], 3);
    assert_eq!(harness.client.refresh_cycles(), 2);
}

// ============================================================================
// Scenario D / P5: public endpoints
// ============================================================================

#[tokio::test]
async fn public_endpoint_401_is_returned_unchanged() {
    let harness = Harness::signed_in().await;
    Mock::given(method("POST"))
        .and(path("/auth/request_otp/"))
        .respond_with(ResponseTemplate::new(401).set_body_string("slow down"))
        .expect(1)
        .mount(&harness.server)
        .await;

    let request = ApiRequest::post("/auth/request_otp/")
        .json(&json!({"email": "ada@example.edu", "purpose": "login"}))
        .unwrap();
    let err = harness.client.send(request).await.unwrap_err();

    match err {
        ApiError::Status { status, body, .. } => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, "slow down");
        }
        other => panic!("expected status error, got {other:?}"),
    }

    let requests = harness.server.received_requests().await.unwrap();
    assert!(requests.iter().all(|request| !request.headers.contains_key("authorization")));
    assert_eq!(harness.calls_to(REFRESH_PATH).await, 0);
    assert_eq!(harness.store.snapshot().0.as_deref(), Some("T1"));
}

#[tokio::test]
async fn public_endpoints_never_carry_credentials() {
    let harness = Harness::signed_in().await;
    for route in ["/auth/request_otp/", "/auth/verify_otp/"] {
        Mock::given(method("POST"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(500))
            .mount(&harness.server)
            .await;
    }

    for route in ["/auth/request_otp/", "/auth/verify_otp/?resend=1"] {
        let err = harness.client.send(ApiRequest::post(route)).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    let requests = harness.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|request| !request.headers.contains_key("authorization")));
    assert_eq!(harness.client.refresh_cycles(), 0);
}

#[tokio::test]
async fn signed_out_request_redirects_without_network() {
    let harness = Harness::signed_out().await;

    let result = harness.client.get::<Value>("/courses/").await;
    assert!(matches!(result, Err(ApiError::NotAuthenticated)));
    assert_eq!(harness.listener.expirations(), 1);
    assert!(harness.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn non_auth_errors_are_not_retried() {
    let harness = Harness::signed_in().await;
    Mock::given(method("GET"))
        .and(path("/courses/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&harness.server)
        .await;

    let err = harness.client.get::<Value>("/courses/").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    assert_eq!(harness.calls_to(REFRESH_PATH).await, 0);
}
