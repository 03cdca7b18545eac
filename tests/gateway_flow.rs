//! End-to-end tests for the edge gateway against mock upstreams.

use std::time::Duration;

use edge_gateway::auth::TokenService;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

fn token_service() -> TokenService {
    let config = common::test_config();
    TokenService::new(&config.auth)
}

// --- Login ---

#[tokio::test]
async fn test_login_issues_verifiable_token_and_cookie() {
    let user_service = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/validate"))
        .and(body_json(json!({ "username": "alice", "password": "pw" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": 7, "username": "alice" })),
        )
        .mount(&user_service)
        .await;

    let mut config = common::test_config();
    config.upstreams.user_service_url = user_service.uri();
    let (gateway, shutdown) = common::spawn_gateway(config).await;

    let res = reqwest::Client::new()
        .post(format!("{}/auth/login", gateway))
        .json(&json!({ "username": "alice", "password": "pw" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);

    let cookie = res
        .headers()
        .get("set-cookie")
        .expect("session cookie must be set")
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("authToken="));
    assert!(cookie.contains("Max-Age=86400"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(!cookie.contains("HttpOnly"));

    let body: serde_json::Value = res.json().await.unwrap();
    let token = body["token"].as_str().expect("token in response");

    let claims = token_service().verify(token).unwrap();
    assert_eq!(claims.user_id, 7);
    assert_eq!(claims.username, "alice");

    shutdown.trigger();
}

#[tokio::test]
async fn test_login_missing_fields_is_400() {
    let (gateway, shutdown) = common::spawn_gateway(common::test_config()).await;

    let res = reqwest::Client::new()
        .post(format!("{}/auth/login", gateway))
        .json(&json!({ "username": "alice" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Username and password are required");

    shutdown.trigger();
}

#[tokio::test]
async fn test_login_forwards_user_service_error() {
    let user_service = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/validate"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid credentials" })),
        )
        .mount(&user_service)
        .await;

    let mut config = common::test_config();
    config.upstreams.user_service_url = user_service.uri();
    let (gateway, shutdown) = common::spawn_gateway(config).await;

    let res = reqwest::Client::new()
        .post(format!("{}/auth/login", gateway))
        .json(&json!({ "username": "alice", "password": "wrong" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 401);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Invalid credentials");

    shutdown.trigger();
}

#[tokio::test]
async fn test_login_unreachable_user_service_is_500() {
    let mut config = common::test_config();
    config.upstreams.user_service_url = "http://127.0.0.1:1".into();
    let (gateway, shutdown) = common::spawn_gateway(config).await;

    let res = reqwest::Client::new()
        .post(format!("{}/auth/login", gateway))
        .json(&json!({ "username": "alice", "password": "pw" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);

    shutdown.trigger();
}

#[tokio::test]
async fn test_login_migrates_anonymous_session_best_effort() {
    let user_service = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/validate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": 7, "username": "alice" })),
        )
        .mount(&user_service)
        .await;

    let core_service = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/attempts/migrate"))
        .and(header("X-User-Id", "7"))
        .and(body_json(json!({ "user_id": 7 })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&core_service)
        .await;

    let mut config = common::test_config();
    config.upstreams.user_service_url = user_service.uri();
    config.upstreams.core_service_url = core_service.uri();
    let (gateway, shutdown) = common::spawn_gateway(config).await;

    // The caller carries an anonymous core-service session cookie.
    let res = reqwest::Client::new()
        .post(format!("{}/auth/login", gateway))
        .header("Cookie", "session=anon-session-data")
        .json(&json!({ "username": "alice", "password": "pw" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    // Migration runs in a spawned task; give it a moment before the
    // mock server verifies expectations on drop.
    tokio::time::sleep(Duration::from_millis(200)).await;

    shutdown.trigger();
}

// --- Proxy ---

#[tokio::test]
async fn test_anonymous_request_proceeds_with_empty_identity() {
    let core_service = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quiz/start"))
        .and(header("X-User-Id", ""))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(2)
        .mount(&core_service)
        .await;

    let mut config = common::test_config();
    config.upstreams.core_service_url = core_service.uri();
    let (gateway, shutdown) = common::spawn_gateway(config).await;

    // No token at all.
    let res = reqwest::Client::new()
        .get(format!("{}/quiz/start", gateway))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    // Malformed token: silently downgraded, never a 401.
    let res = reqwest::Client::new()
        .get(format!("{}/quiz/start", gateway))
        .header("Authorization", "Bearer not-a-real-token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    shutdown.trigger();
}

#[tokio::test]
async fn test_identity_injected_from_header_and_cookie() {
    let core_service = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(header("X-User-Id", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(2)
        .mount(&core_service)
        .await;

    let mut config = common::test_config();
    config.upstreams.core_service_url = core_service.uri();
    let (gateway, shutdown) = common::spawn_gateway(config).await;

    let token = token_service()
        .sign(&edge_gateway::auth::User {
            id: 7,
            username: "alice".into(),
            email: None,
        })
        .unwrap();

    // Same token via Authorization header and via cookie resolves identically.
    let res = reqwest::Client::new()
        .get(format!("{}/profile", gateway))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = reqwest::Client::new()
        .get(format!("{}/profile", gateway))
        .header("Cookie", format!("authToken={}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    shutdown.trigger();
}

#[tokio::test]
async fn test_inbound_identity_header_is_stripped() {
    let core_service = MockServer::start().await;
    // A spoofed X-User-Id must arrive empty, not as the spoofed value.
    Mock::given(method("GET"))
        .and(path("/quiz/start"))
        .and(header("X-User-Id", ""))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&core_service)
        .await;

    let mut config = common::test_config();
    config.upstreams.core_service_url = core_service.uri();
    let (gateway, shutdown) = common::spawn_gateway(config).await;

    let res = reqwest::Client::new()
        .get(format!("{}/quiz/start", gateway))
        .header("X-User-Id", "999")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    shutdown.trigger();
}

#[tokio::test]
async fn test_proxy_forwards_method_query_and_body() {
    let core_service = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/quiz/submit"))
        .and(query_param("category", "2"))
        .and(body_json(json!({ "answer": "B" })))
        .respond_with(ResponseTemplate::new(201).set_body_string("recorded"))
        .mount(&core_service)
        .await;

    let mut config = common::test_config();
    config.upstreams.core_service_url = core_service.uri();
    let (gateway, shutdown) = common::spawn_gateway(config).await;

    let res = reqwest::Client::new()
        .post(format!("{}/quiz/submit?category=2", gateway))
        .json(&json!({ "answer": "B" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 201);
    assert_eq!(res.text().await.unwrap(), "recorded");

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_cookies_rewritten_for_gateway_origin() {
    let core_service = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quiz/start"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("Set-Cookie", "session=abc; Domain=core.internal; Secure; Path=/")
                .append_header("Set-Cookie", "pref=1; SameSite=Strict"),
        )
        .mount(&core_service)
        .await;

    let mut config = common::test_config();
    config.upstreams.core_service_url = core_service.uri();
    let (gateway, shutdown) = common::spawn_gateway(config).await;

    let res = common::no_redirect_client()
        .get(format!("{}/quiz/start", gateway))
        .send()
        .await
        .unwrap();

    let cookies: Vec<&str> = res
        .headers()
        .get_all("set-cookie")
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect();

    assert!(cookies.contains(&"session=abc; Path=/; SameSite=Lax"));
    // Existing SameSite is never overridden.
    assert!(cookies.contains(&"pref=1; SameSite=Strict"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_redirect_rewritten_to_public_origin() {
    let core_service = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quiz/submit"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/quiz/result", core_service.uri()).as_str()),
        )
        .mount(&core_service)
        .await;

    let mut config = common::test_config();
    config.upstreams.core_service_url = core_service.uri();
    let (gateway, shutdown) = common::spawn_gateway(config).await;

    let res = common::no_redirect_client()
        .get(format!("{}/quiz/submit", gateway))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 302);
    assert_eq!(
        res.headers().get("location").unwrap().to_str().unwrap(),
        format!("{}/quiz/result", gateway)
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_core_service_is_502() {
    let mut config = common::test_config();
    config.upstreams.core_service_url = "http://127.0.0.1:1".into();
    let (gateway, shutdown) = common::spawn_gateway(config).await;

    let res = reqwest::Client::new()
        .get(format!("{}/anything", gateway))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 502);
    assert!(res.text().await.unwrap().contains("Proxy error"));

    shutdown.trigger();
}

// --- Registration saga ---

async fn mount_submit(orchestrator: &MockServer, saga_id: &str, task_id: &str) {
    Mock::given(method("POST"))
        .and(path("/saga/register"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "saga_id": saga_id,
            "task_id": task_id,
            "status": "pending",
        })))
        .mount(orchestrator)
        .await;
}

#[tokio::test]
async fn test_register_success_returns_201_with_token() {
    let orchestrator = MockServer::start().await;
    mount_submit(&orchestrator, "s-1", "saga_s-1").await;

    // One PENDING poll, then SUCCESS with the nested user payload.
    Mock::given(method("GET"))
        .and(path("/saga/status/saga_s-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "PENDING" })))
        .up_to_n_times(1)
        .mount(&orchestrator)
        .await;
    Mock::given(method("GET"))
        .and(path("/saga/status/saga_s-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "SUCCESS",
            "result": {
                "success": true,
                "saga_id": "s-1",
                "result": {
                    "user": { "id": 9, "username": "bob" },
                    "profile": { "user_id": 9 }
                }
            }
        })))
        .mount(&orchestrator)
        .await;

    let mut config = common::test_config();
    config.upstreams.saga_orchestrator_url = orchestrator.uri();
    let (gateway, shutdown) = common::spawn_gateway(config).await;

    let res = reqwest::Client::new()
        .post(format!("{}/auth/register", gateway))
        .json(&json!({ "username": "bob", "email": "bob@example.com", "password": "pw" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 201);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user"]["id"], 9);
    assert_eq!(body["user"]["username"], "bob");
    assert_eq!(body["saga_id"], "s-1");

    let claims = token_service()
        .verify(body["token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.user_id, 9);

    shutdown.trigger();
}

#[tokio::test]
async fn test_register_failure_reports_compensation() {
    let orchestrator = MockServer::start().await;
    mount_submit(&orchestrator, "s-2", "saga_s-2").await;

    Mock::given(method("GET"))
        .and(path("/saga/status/saga_s-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "SUCCESS",
            "result": {
                "success": false,
                "failed_step": 2,
                "error": "email exists",
                "compensation": { "executed": true, "result": null }
            }
        })))
        .mount(&orchestrator)
        .await;

    let mut config = common::test_config();
    config.upstreams.saga_orchestrator_url = orchestrator.uri();
    let (gateway, shutdown) = common::spawn_gateway(config).await;

    let res = reqwest::Client::new()
        .post(format!("{}/auth/register", gateway))
        .json(&json!({ "username": "bob", "email": "taken@example.com", "password": "pw" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "email exists");
    assert_eq!(body["compensation_executed"], true);

    shutdown.trigger();
}

#[tokio::test]
async fn test_register_structural_error_is_500() {
    let orchestrator = MockServer::start().await;
    mount_submit(&orchestrator, "s-3", "saga_s-3").await;

    // SUCCESS whose result carries no user object at all.
    Mock::given(method("GET"))
        .and(path("/saga/status/saga_s-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "SUCCESS",
            "result": { "success": true, "result": { "profile": {} } }
        })))
        .mount(&orchestrator)
        .await;

    let mut config = common::test_config();
    config.upstreams.saga_orchestrator_url = orchestrator.uri();
    let (gateway, shutdown) = common::spawn_gateway(config).await;

    let res = reqwest::Client::new()
        .post(format!("{}/auth/register", gateway))
        .json(&json!({ "username": "bob", "email": "bob@example.com", "password": "pw" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);

    shutdown.trigger();
}

#[tokio::test]
async fn test_register_poll_exhaustion_returns_resumable_202() {
    let orchestrator = MockServer::start().await;
    mount_submit(&orchestrator, "s-4", "saga_s-4").await;

    Mock::given(method("GET"))
        .and(path("/saga/status/saga_s-4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "PENDING" })))
        .mount(&orchestrator)
        .await;

    let mut config = common::test_config();
    config.upstreams.saga_orchestrator_url = orchestrator.uri();
    config.saga.max_poll_attempts = 2;
    config.saga.poll_interval_ms = 10;
    let (gateway, shutdown) = common::spawn_gateway(config).await;

    let res = reqwest::Client::new()
        .post(format!("{}/auth/register", gateway))
        .json(&json!({ "username": "bob", "email": "bob@example.com", "password": "pw" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 202);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "pending");
    assert_eq!(body["task_id"], "saga_s-4");
    assert_eq!(
        body["status_url"].as_str().unwrap(),
        format!("{}/auth/register/status/saga_s-4", gateway)
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_register_missing_fields_is_400() {
    let (gateway, shutdown) = common::spawn_gateway(common::test_config()).await;

    let res = reqwest::Client::new()
        .post(format!("{}/auth/register", gateway))
        .json(&json!({ "username": "bob", "password": "pw" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);

    shutdown.trigger();
}

// --- Registration status endpoint ---

#[tokio::test]
async fn test_status_endpoint_is_idempotent_after_success() {
    let orchestrator = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/saga/status/saga_done"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "SUCCESS",
            "result": {
                "success": true,
                "result": { "user": { "id": 9, "username": "bob" } }
            }
        })))
        .mount(&orchestrator)
        .await;

    let mut config = common::test_config();
    config.upstreams.saga_orchestrator_url = orchestrator.uri();
    let (gateway, shutdown) = common::spawn_gateway(config).await;

    let url = format!("{}/auth/register/status/saga_done", gateway);
    let tokens = token_service();

    let mut user_ids = Vec::new();
    for _ in 0..2 {
        let res = reqwest::Client::new().get(&url).send().await.unwrap();
        assert_eq!(res.status(), 200);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["status"], "completed");
        assert_eq!(body["user"]["username"], "bob");

        let claims = tokens.verify(body["token"].as_str().unwrap()).unwrap();
        user_ids.push(claims.user_id);
    }
    assert_eq!(user_ids, vec![9, 9]);

    shutdown.trigger();
}

#[tokio::test]
async fn test_status_endpoint_reports_failure_and_pending() {
    let orchestrator = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/saga/status/saga_failed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "FAILURE",
            "error": "worker crashed"
        })))
        .mount(&orchestrator)
        .await;
    Mock::given(method("GET"))
        .and(path("/saga/status/saga_running"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "PENDING" })))
        .mount(&orchestrator)
        .await;

    let mut config = common::test_config();
    config.upstreams.saga_orchestrator_url = orchestrator.uri();
    let (gateway, shutdown) = common::spawn_gateway(config).await;

    let res = reqwest::Client::new()
        .get(format!("{}/auth/register/status/saga_failed", gateway))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "failed");
    assert_eq!(body["error"], "worker crashed");
    assert_eq!(body["compensation_executed"], false);

    let res = reqwest::Client::new()
        .get(format!("{}/auth/register/status/saga_running", gateway))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "pending");

    shutdown.trigger();
}

#[tokio::test]
async fn test_status_endpoint_query_failure_is_500() {
    let mut config = common::test_config();
    config.upstreams.saga_orchestrator_url = "http://127.0.0.1:1".into();
    let (gateway, shutdown) = common::spawn_gateway(config).await;

    let res = reqwest::Client::new()
        .get(format!("{}/auth/register/status/saga_x", gateway))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);

    shutdown.trigger();
}

// --- Direct registration (saga disabled) ---

#[tokio::test]
async fn test_register_direct_path_when_saga_disabled() {
    let user_service = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(body_json(json!({
            "username": "bob",
            "email": "bob@example.com",
            "password": "pw",
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(
                json!({ "id": 11, "username": "bob", "email": "bob@example.com" }),
            ),
        )
        .mount(&user_service)
        .await;

    let mut config = common::test_config();
    config.upstreams.user_service_url = user_service.uri();
    config.saga.enabled = false;
    let (gateway, shutdown) = common::spawn_gateway(config).await;

    let res = reqwest::Client::new()
        .post(format!("{}/auth/register", gateway))
        .json(&json!({ "username": "bob", "email": "bob@example.com", "password": "pw" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 201);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user"]["id"], 11);
    assert!(token_service()
        .verify(body["token"].as_str().unwrap())
        .is_ok());

    shutdown.trigger();
}
