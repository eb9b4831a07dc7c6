//! API integration tests for tranquil-server.
//!
//! These tests drive the full router over the in-memory store, covering
//! registration, device trust and the biometric token lifecycle through the
//! REST endpoints.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use tranquil_server::{create_router, AppState};

/// Build the test router using the library's create_router function
fn create_test_app() -> Router {
    create_router(AppState::in_memory("integration-test-secret"))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Register a user and return their access token.
async fn register(app: &Router, email: &str) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({ "email": email, "password": "correct horse battery", "name": "Test" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["data"]["access_token"].as_str().unwrap().to_string()
}

fn premium_capabilities() -> Value {
    json!({
        "has_biometrics": true,
        "has_device_passcode": true,
        "has_screen_lock": true,
        "biometric_types": ["face_id"]
    })
}

/// Register a device and return its id.
async fn register_device(app: &Router, token: &str, fingerprint: &str, capabilities: Value) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/api/v1/devices",
        Some(token),
        Some(json!({ "fingerprint": fingerprint, "platform": "ios", "capabilities": capabilities })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["data"]["id"].as_str().unwrap().to_string()
}

/// Register a premium device, enable biometrics and bind a Face ID token.
/// Returns (device_id, token_id, raw_token).
async fn biometric_device(app: &Router, token: &str) -> (String, String, String) {
    let device_id = register_device(app, token, "premium-phone", premium_capabilities()).await;

    let (status, json) = send(
        app,
        "PUT",
        &format!("/api/v1/devices/{device_id}/biometrics"),
        Some(token),
        Some(json!({ "enabled": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"]["can_use_biometrics"], true);

    let (status, json) = send(
        app,
        "POST",
        &format!("/api/v1/devices/{device_id}/biometric-tokens"),
        Some(token),
        Some(json!({ "biometric_type": "face_id" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");

    (
        device_id,
        json["data"]["token"]["id"].as_str().unwrap().to_string(),
        json["data"]["raw_token"].as_str().unwrap().to_string(),
    )
}

async fn biometric_login(app: &Router, device_id: &str, raw_token: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/v1/auth/biometric",
        None,
        Some(json!({ "device_id": device_id, "biometric_type": "face_id", "token": raw_token })),
    )
    .await
}

// ============================================================================
// Health & Readiness Tests
// ============================================================================

#[tokio::test]
async fn test_health_reports_memory_storage() {
    let app = create_test_app();
    let (status, json) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["storage"], "memory");
    assert_eq!(json["persistent"], false);
}

#[tokio::test]
async fn test_ready_endpoint() {
    let app = create_test_app();
    let (status, _) = send(&app, "GET", "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = create_test_app();
    let (status, json) = send(&app, "GET", "/api-docs/openapi.json", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["info"]["title"], "Tranquil API");
}

// ============================================================================
// Account Tests
// ============================================================================

#[tokio::test]
async fn test_register_and_login_envelope() {
    let app = create_test_app();
    register(&app, "Jane@Example.com").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "jane@example.com", "password": "correct horse battery" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["token_type"], "Bearer");
    assert_eq!(json["data"]["user"]["email"], "jane@example.com");
    assert!(json["data"]["user"].get("password_hash").is_none());
    assert!(json["message"].is_string());
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let app = create_test_app();
    register(&app, "dup@example.com").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({ "email": "DUP@example.com", "password": "another password" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_register_rejects_invalid_input() {
    let app = create_test_app();

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({ "email": "not-an-email", "password": "correct horse battery" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "INVALID_INPUT");

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({ "email": "short@example.com", "password": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wrong_password_is_logged() {
    let app = create_test_app();
    let token = register(&app, "audit@example.com").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "audit@example.com", "password": "wrong password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "AUTH_INVALID_CREDENTIALS");

    let (status, json) = send(&app, "GET", "/api/v1/auth-logs", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let logs = json["data"].as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["auth_method"], "password");
    assert_eq!(logs[0]["result"], "failure");
    assert_eq!(logs[0]["failure_reason"], "invalid_password");
}

#[tokio::test]
async fn test_foreign_device_on_login_looks_like_bad_credentials() {
    let app = create_test_app();
    let token = register(&app, "oracle@example.com").await;
    let bogus_device = "00000000-0000-4000-8000-000000000000";

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "whatever", "device_id": bogus_device })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "AUTH_INVALID_CREDENTIALS");

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "oracle@example.com", "password": "wrong password", "device_id": bogus_device })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "AUTH_INVALID_CREDENTIALS");

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({
            "email": "oracle@example.com",
            "password": "correct horse battery",
            "device_id": bogus_device
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "AUTH_INVALID_CREDENTIALS");

    let (_, json) = send(&app, "GET", "/api/v1/auth-logs", Some(&token), None).await;
    let logs = json["data"].as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["failure_reason"], "unknown_device");
    assert!(logs[0]["device_id"].is_null());
    assert_eq!(logs[1]["failure_reason"], "invalid_password");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/api/v1/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "AUTH_MISSING_TOKEN");

    let (status, json) = send(&app, "GET", "/api/v1/devices", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "AUTH_INVALID_TOKEN");
}

#[tokio::test]
async fn test_update_and_delete_profile() {
    let app = create_test_app();
    let token = register(&app, "profile@example.com").await;

    let (status, json) = send(
        &app,
        "PATCH",
        "/api/v1/users/me",
        Some(&token),
        Some(json!({ "name": "  Renamed  " })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["name"], "Renamed");

    let (status, json) = send(&app, "DELETE", "/api/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["deleted"], true);

    // The session no longer resolves to a live user
    let (status, json) = send(&app, "GET", "/api/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "AUTH_USER_NOT_FOUND");

    // The address can be registered again
    register(&app, "profile@example.com").await;
}

#[tokio::test]
async fn test_deleted_account_releases_its_devices() {
    let app = create_test_app();
    let token = register(&app, "phone@example.com").await;
    register_device(&app, &token, "phone-fp-1", premium_capabilities()).await;

    let (status, _) = send(&app, "DELETE", "/api/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    // Signing up again on the same phone enrols it afresh
    let token = register(&app, "phone@example.com").await;
    register_device(&app, &token, "phone-fp-1", premium_capabilities()).await;

    let (_, json) = send(&app, "GET", "/api/v1/devices", Some(&token), None).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

// ============================================================================
// Device Tests
// ============================================================================

#[tokio::test]
async fn test_device_security_levels() {
    let app = create_test_app();
    let token = register(&app, "devices@example.com").await;

    let cases = [
        ("premium", premium_capabilities()),
        (
            "protected",
            json!({ "has_biometrics": false, "has_device_passcode": true, "has_screen_lock": true }),
        ),
        ("basic", json!({ "has_screen_lock": true })),
        ("insecure", json!({})),
    ];

    for (i, (expected, capabilities)) in cases.into_iter().enumerate() {
        let device_id = register_device(&app, &token, &format!("fp-{i}"), capabilities).await;
        let (status, json) = send(
            &app,
            "GET",
            &format!("/api/v1/devices/{device_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["security_level"], expected);
        assert_eq!(json["data"]["biometric_enabled"], false);
    }

    let (_, json) = send(&app, "GET", "/api/v1/devices", Some(&token), None).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_reregistering_fingerprint_refreshes_device() {
    let app = create_test_app();
    let alice = register(&app, "alice@example.com").await;
    let bob = register(&app, "bob@example.com").await;

    let device_id = register_device(&app, &alice, "shared-fp", json!({})).await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/devices",
        Some(&alice),
        Some(json!({ "fingerprint": "shared-fp", "capabilities": premium_capabilities() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["id"], device_id.as_str());
    assert_eq!(json["data"]["security_level"], "premium");

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/devices",
        Some(&bob),
        Some(json!({ "fingerprint": "shared-fp" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_other_users_device_is_not_found() {
    let app = create_test_app();
    let alice = register(&app, "owner@example.com").await;
    let mallory = register(&app, "mallory@example.com").await;
    let device_id = register_device(&app, &alice, "alice-phone", premium_capabilities()).await;

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/v1/devices/{device_id}"),
        Some(&mallory),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/devices/{device_id}"),
        Some(&mallory),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_device_id_is_bad_request() {
    let app = create_test_app();
    let token = register(&app, "path@example.com").await;

    let (status, json) = send(&app, "GET", "/api/v1/devices/not-a-uuid", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_device_without_passcode_cannot_enable_biometrics() {
    let app = create_test_app();
    let token = register(&app, "nopasscode@example.com").await;
    let device_id = register_device(
        &app,
        &token,
        "old-phone",
        json!({ "has_biometrics": true, "has_screen_lock": true }),
    )
    .await;

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/api/v1/devices/{device_id}/biometrics"),
        Some(&token),
        Some(json!({ "enabled": true })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"], "FORBIDDEN");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/devices/{device_id}/biometric-tokens"),
        Some(&token),
        Some(json!({ "biometric_type": "face_id" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_trust_score_defaults_and_validation() {
    let app = create_test_app();
    let token = register(&app, "trust@example.com").await;
    let device_id = register_device(&app, &token, "trust-fp", json!({})).await;
    let uri = format!("/api/v1/devices/{device_id}/trust-score");

    let (status, json) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["final_score"], 50.0);

    let scores = json!({
        "base_score": 90.0,
        "behavior_score": 85.0,
        "location_score": 80.0,
        "time_score": 75.0,
        "final_score": 82.5
    });
    let (status, json) = send(&app, "PUT", &uri, Some(&token), Some(scores)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["final_score"], 82.5);

    let out_of_range = json!({
        "base_score": 101.0,
        "behavior_score": 50.0,
        "location_score": 50.0,
        "time_score": 50.0,
        "final_score": 50.0
    });
    let (status, json) = send(&app, "PUT", &uri, Some(&token), Some(out_of_range)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "INVALID_SCORE");
}

#[tokio::test]
async fn test_trust_scores_are_stored_with_two_decimals() {
    let app = create_test_app();
    let token = register(&app, "precision@example.com").await;
    let device_id = register_device(&app, &token, "precision-fp", json!({})).await;
    let uri = format!("/api/v1/devices/{device_id}/trust-score");

    let scores = json!({
        "base_score": 50.0,
        "behavior_score": 50.0,
        "location_score": 50.0,
        "time_score": 33.333,
        "final_score": 79.996
    });
    let (status, json) = send(&app, "PUT", &uri, Some(&token), Some(scores)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["final_score"], 80.0);
    assert_eq!(json["data"]["time_score"], 33.33);
}

#[tokio::test]
async fn test_trust_flag_and_heartbeat() {
    let app = create_test_app();
    let token = register(&app, "flags@example.com").await;
    let device_id = register_device(&app, &token, "flags-fp", json!({})).await;

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/api/v1/devices/{device_id}/trust"),
        Some(&token),
        Some(json!({ "trusted": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["is_trusted"], true);

    let (status, json) = send(
        &app,
        "POST",
        &format!("/api/v1/devices/{device_id}/heartbeat"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"]["last_seen_at"].is_string());
}

// ============================================================================
// Biometric Token Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_biometric_login_flow() {
    let app = create_test_app();
    let token = register(&app, "bio@example.com").await;
    let (device_id, _, raw_token) = biometric_device(&app, &token).await;

    let (status, json) = biometric_login(&app, &device_id, &raw_token).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"]["user"]["email"], "bio@example.com");

    let (status, json) = biometric_login(&app, &device_id, "wrong-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "AUTH_BIOMETRIC_FAILED");

    let (_, json) = send(
        &app,
        "GET",
        &format!("/api/v1/devices/{device_id}/biometric-tokens"),
        Some(&token),
        None,
    )
    .await;
    let tokens = json["data"].as_array().unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0]["challenge_attempts"], 2);
    assert_eq!(tokens[0]["success_count"], 1);
    assert!(tokens[0].get("token_hash").is_none());

    let (_, json) = send(&app, "GET", "/api/v1/auth-logs", Some(&token), None).await;
    let logs = json["data"].as_array().unwrap();
    assert_eq!(logs[0]["failure_reason"], "token_mismatch");
    assert_eq!(logs[1]["result"], "success");
    assert_eq!(logs[1]["trust_score_at_time"], 50.0);
}

#[tokio::test]
async fn test_duplicate_active_token_conflicts() {
    let app = create_test_app();
    let token = register(&app, "dupe-token@example.com").await;
    let (device_id, _, _) = biometric_device(&app, &token).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/devices/{device_id}/biometric-tokens"),
        Some(&token),
        Some(json!({ "biometric_type": "face_id" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/devices/{device_id}/biometric-tokens"),
        Some(&token),
        Some(json!({ "biometric_type": "iris" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rotation_invalidates_previous_token() {
    let app = create_test_app();
    let token = register(&app, "rotate@example.com").await;
    let (device_id, token_id, old_raw) = biometric_device(&app, &token).await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/api/v1/biometric-tokens/{token_id}/rotate"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"]["token"]["challenge_attempts"], 0);
    let new_raw = json["data"]["raw_token"].as_str().unwrap().to_string();
    assert_ne!(new_raw, old_raw);

    let (status, _) = biometric_login(&app, &device_id, &old_raw).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = biometric_login(&app, &device_id, &new_raw).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_revoked_token_cannot_log_in() {
    let app = create_test_app();
    let token = register(&app, "revoke@example.com").await;
    let (device_id, token_id, raw) = biometric_device(&app, &token).await;

    let (status, json) = send(
        &app,
        "DELETE",
        &format!("/api/v1/biometric-tokens/{token_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["revoked"], true);

    let (status, _) = biometric_login(&app, &device_id, &raw).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/biometric-tokens/{token_id}/rotate"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_downgrading_capabilities_disables_biometrics() {
    let app = create_test_app();
    let token = register(&app, "downgrade@example.com").await;
    let (device_id, _, raw) = biometric_device(&app, &token).await;

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/api/v1/devices/{device_id}/capabilities"),
        Some(&token),
        Some(json!({ "capabilities": { "has_screen_lock": true } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["security_level"], "basic");
    assert_eq!(json["data"]["biometric_enabled"], false);

    let (status, _) = biometric_login(&app, &device_id, &raw).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, json) = send(
        &app,
        "GET",
        &format!("/api/v1/devices/{device_id}/biometric-tokens"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(json["data"][0]["is_active"], false);
}

// ============================================================================
// Backup Code Tests
// ============================================================================

#[tokio::test]
async fn test_backup_code_single_use() {
    let app = create_test_app();
    let token = register(&app, "backup@example.com").await;

    let (status, json) = send(&app, "POST", "/api/v1/backup-codes", Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["count"], 10);
    let code = json["data"]["codes"][0].as_str().unwrap().to_lowercase();

    let login = json!({ "email": "backup@example.com", "code": code });
    let (status, _) = send(&app, "POST", "/api/v1/auth/backup-code", None, Some(login.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&app, "POST", "/api/v1/auth/backup-code", None, Some(login)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "BACKUP_CODE_USED");

    let (status, json) = send(&app, "GET", "/api/v1/backup-codes", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["remaining"], 9);
    assert!(json["data"]["codes"][0]["code_partial"]
        .as_str()
        .unwrap()
        .starts_with("****-"));
}

#[tokio::test]
async fn test_regenerating_backup_codes_invalidates_old_ones() {
    let app = create_test_app();
    let token = register(&app, "regen@example.com").await;

    let (_, json) = send(&app, "POST", "/api/v1/backup-codes", Some(&token), None).await;
    let old_code = json["data"]["codes"][0].as_str().unwrap().to_string();
    send(&app, "POST", "/api/v1/backup-codes", Some(&token), None).await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/auth/backup-code",
        None,
        Some(json!({ "email": "regen@example.com", "code": old_code })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "BACKUP_CODE_INVALID");
}

#[tokio::test]
async fn test_malformed_backup_code_is_bad_request() {
    let app = create_test_app();
    register(&app, "malformed@example.com").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/auth/backup-code",
        None,
        Some(json!({ "email": "malformed@example.com", "code": "12" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "INVALID_BACKUP_CODE");
}

#[tokio::test]
async fn test_backup_code_login_with_foreign_device_keeps_the_code() {
    let app = create_test_app();
    let token = register(&app, "keep@example.com").await;

    let (_, json) = send(&app, "POST", "/api/v1/backup-codes", Some(&token), None).await;
    let code = json["data"]["codes"][0].as_str().unwrap().to_string();

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/auth/backup-code",
        None,
        Some(json!({
            "email": "keep@example.com",
            "code": code,
            "device_id": "00000000-0000-4000-8000-000000000000"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "BACKUP_CODE_INVALID");

    // Unknown accounts answer the same way, malformed codes stay a 400
    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/auth/backup-code",
        None,
        Some(json!({ "email": "nobody@example.com", "code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "BACKUP_CODE_INVALID");

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/auth/backup-code",
        None,
        Some(json!({ "email": "nobody@example.com", "code": "12" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "INVALID_BACKUP_CODE");

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/backup-code",
        None,
        Some(json!({ "email": "keep@example.com", "code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_deleting_device_clears_it_from_auth_logs() {
    let app = create_test_app();
    let token = register(&app, "forget@example.com").await;
    let device_id = register_device(&app, &token, "forget-fp", json!({})).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({
            "email": "forget@example.com",
            "password": "correct horse battery",
            "device_id": device_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&app, "GET", "/api/v1/auth-logs", Some(&token), None).await;
    assert_eq!(json["data"][0]["device_id"], device_id.as_str());

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/devices/{device_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&app, "GET", "/api/v1/auth-logs", Some(&token), None).await;
    let logs = json["data"].as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["result"], "success");
    assert!(logs[0]["device_id"].is_null());
}
