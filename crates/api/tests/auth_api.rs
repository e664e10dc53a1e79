//! HTTP-level integration tests for the session endpoints: register, login,
//! refresh, logout and the authenticated profile.

mod common;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, StatusCode};
use campus_api::auth::cookies::{ACCESS_TOKEN_COOKIE, LOGGED_IN_COOKIE, REFRESH_TOKEN_COOKIE};
use campus_api::auth::jwt::{issue, verify};
use campus_db::credentials::CredentialStore;
use chrono::Duration;
use common::{
    body_json, build_test_app, cookie_value, get, get_auth, get_with_cookie, login, post_empty,
    post_json, register, send, set_cookie_for, set_cookies, PASSWORD,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Register and log in `email`, returning the user id and the refresh token.
async fn logged_in_user(app: axum::Router, email: &str) -> (i64, String) {
    let response = register(app.clone(), email).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let user_id = body_json(response).await["data"]["user"]["id"]
        .as_i64()
        .unwrap();

    let response = login(app, email, PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    let refresh = cookie_value(&response, REFRESH_TOKEN_COOKIE).unwrap();
    (user_id, refresh)
}

// ---------------------------------------------------------------------------
// Register
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_register_returns_created_profile_without_password() {
    let (app, _store) = build_test_app();

    let response = register(app, "Ada@Example.com").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let user = &json["data"]["user"];
    assert!(user["id"].is_number());
    assert_eq!(user["email"], "ada@example.com");
    assert_eq!(user["role"], 1);
    assert!(user.get("password_hash").is_none());
    assert!(user.get("password").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let (app, _store) = build_test_app();

    let first = register(app.clone(), "dup@example.com").await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = register(app, "DUP@example.com").await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(second).await["code"], "CONFLICT");
}

#[tokio::test]
async fn test_register_mismatched_confirmation_is_rejected() {
    let (app, store) = build_test_app();

    let body = serde_json::json!({
        "email": "mismatch@example.com",
        "password": "one",
        "passwordConfirm": "two",
    });
    let response = post_json(app, "/api/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Passwords do not match");
    assert!(store
        .find_by_email("mismatch@example.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_register_invalid_email_is_rejected() {
    let (app, _store) = build_test_app();

    let body = serde_json::json!({
        "email": "not-an-email",
        "password": PASSWORD,
        "password_confirm": PASSWORD,
    });
    let response = post_json(app, "/api/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "email: Invalid email");
}

#[tokio::test]
async fn test_register_missing_field_is_structured_validation_error() {
    let (app, _store) = build_test_app();

    let body = serde_json::json!({ "email": "a@x.com", "password": "p1" });
    let response = post_json(app, "/api/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["content-type"], "application/json");

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["error"].as_str().unwrap().contains("password_confirm"));
}

#[tokio::test]
async fn test_non_json_body_is_structured_validation_error() {
    let (app, _store) = build_test_app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = send(app.clone(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .body(Body::from(r#"{"email":"a@x.com","password":"p1"}"#))
        .unwrap();
    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_email_is_trimmed_before_validation() {
    let (app, _store) = build_test_app();

    let response = register(app.clone(), "  Spaced@Example.com ").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        body_json(response).await["data"]["user"]["email"],
        "spaced@example.com"
    );

    let response = login(app, " spaced@example.com  ", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_login_sets_session_cookies() {
    let (app, _store) = build_test_app();
    let response = register(app.clone(), "login@example.com").await;
    let user_id = body_json(response).await["data"]["user"]["id"]
        .as_i64()
        .unwrap();

    let response = login(app, "LOGIN@example.com", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(set_cookies(&response).len(), 3);

    let access_cookie = set_cookie_for(&response, ACCESS_TOKEN_COOKIE).unwrap();
    assert!(access_cookie.contains("HttpOnly"));
    assert!(access_cookie.contains("Max-Age=900"));

    let refresh_cookie = set_cookie_for(&response, REFRESH_TOKEN_COOKIE).unwrap();
    assert!(refresh_cookie.contains("HttpOnly"));
    assert!(refresh_cookie.contains("Max-Age=3600"));

    let logged_in = set_cookie_for(&response, LOGGED_IN_COOKIE).unwrap();
    assert!(logged_in.starts_with("logged_in=true"));
    assert!(!logged_in.contains("HttpOnly"));

    let cookie_token = cookie_value(&response, ACCESS_TOKEN_COOKIE).unwrap();
    let json = body_json(response).await;
    let body_token = json["data"]["access_token"].as_str().unwrap();
    assert_eq!(body_token, cookie_token);

    let keys = common::access_keys();
    assert_eq!(verify(body_token, keys.decoding_key()).unwrap(), user_id);
}

#[tokio::test]
async fn test_login_wrong_password_is_unauthorized() {
    let (app, _store) = build_test_app();
    register(app.clone(), "wrongpw@example.com").await;

    let response = login(app, "wrongpw@example.com", "not the password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());

    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_CREDENTIALS");
    assert_eq!(json["error"], "Invalid email or password");
}

#[tokio::test]
async fn test_login_unknown_email_matches_wrong_password() {
    let (app, _store) = build_test_app();

    let response = login(app, "nobody@example.com", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_CREDENTIALS");
    assert_eq!(json["error"], "Invalid email or password");
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_refresh_issues_new_access_token_only() {
    let (app, _store) = build_test_app();
    let (user_id, refresh) = logged_in_user(app.clone(), "refresh@example.com").await;

    let response = get_with_cookie(
        app,
        "/api/auth/refresh",
        &format!("{REFRESH_TOKEN_COOKIE}={refresh}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie_for(&response, ACCESS_TOKEN_COOKIE).is_some());
    assert!(set_cookie_for(&response, LOGGED_IN_COOKIE).is_some());
    assert!(set_cookie_for(&response, REFRESH_TOKEN_COOKIE).is_none());

    let json = body_json(response).await;
    let token = json["data"]["access_token"].as_str().unwrap();
    let keys = common::access_keys();
    assert_eq!(verify(token, keys.decoding_key()).unwrap(), user_id);
}

#[tokio::test]
async fn test_refresh_without_cookie_is_unauthorized() {
    let (app, _store) = build_test_app();

    let response = get(app, "/api/auth/refresh").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_refresh_with_expired_token_is_unauthorized() {
    let (app, _store) = build_test_app();
    let (user_id, _refresh) = logged_in_user(app.clone(), "expired@example.com").await;

    let keys = common::refresh_keys();
    let expired = issue(user_id, Duration::zero(), keys.encoding_key()).unwrap();

    let response = get_with_cookie(
        app,
        "/api/auth/refresh",
        &format!("{REFRESH_TOKEN_COOKIE}={expired}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let (app, _store) = build_test_app();
    register(app.clone(), "swap@example.com").await;
    let response = login(app.clone(), "swap@example.com", PASSWORD).await;
    let access = cookie_value(&response, ACCESS_TOKEN_COOKIE).unwrap();

    let response = get_with_cookie(
        app,
        "/api/auth/refresh",
        &format!("{REFRESH_TOKEN_COOKIE}={access}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_for_deleted_user_is_unauthorized() {
    let (app, store) = build_test_app();
    let (user_id, refresh) = logged_in_user(app.clone(), "deleted@example.com").await;

    assert!(store.delete(user_id).await.unwrap());

    let response = get_with_cookie(
        app,
        "/api/auth/refresh",
        &format!("{REFRESH_TOKEN_COOKIE}={refresh}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["error"],
        "The user belonging to this token no longer exists"
    );
}

// ---------------------------------------------------------------------------
// Logout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_logout_clears_all_cookies() {
    let (app, _store) = build_test_app();

    let response = post_empty(app.clone(), "/api/auth/logout").await;
    assert_eq!(response.status(), StatusCode::OK);

    let cleared = set_cookies(&response);
    assert_eq!(cleared.len(), 3);
    for name in [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, LOGGED_IN_COOKIE] {
        let cookie = set_cookie_for(&response, name).unwrap();
        assert!(cookie.starts_with(&format!("{name}=;")), "{cookie}");
        assert!(cookie.contains("Max-Age=-1"), "{cookie}");
    }
    assert_eq!(body_json(response).await["data"], "Logged out");

    // With the cookie gone the browser has nothing left to refresh with.
    let response = get(app, "/api/auth/refresh").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_me_accepts_bearer_token() {
    let (app, _store) = build_test_app();
    register(app.clone(), "me@example.com").await;
    let response = login(app.clone(), "me@example.com", PASSWORD).await;
    let token = body_json(response).await["data"]["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = get_auth(app, "/api/users/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["email"], "me@example.com");
    assert_eq!(json["data"]["role"], 1);
    assert!(json["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_me_accepts_access_cookie() {
    let (app, _store) = build_test_app();
    register(app.clone(), "cookie@example.com").await;
    let response = login(app.clone(), "cookie@example.com", PASSWORD).await;
    let access = cookie_value(&response, ACCESS_TOKEN_COOKIE).unwrap();

    let response = get_with_cookie(
        app,
        "/api/users/me",
        &format!("{ACCESS_TOKEN_COOKIE}={access}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["data"]["email"],
        "cookie@example.com"
    );
}

#[tokio::test]
async fn test_me_without_token_is_unauthorized() {
    let (app, _store) = build_test_app();

    let response = get(app, "/api/users/me").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "You are not logged in");
}

#[tokio::test]
async fn test_me_rejects_refresh_token_as_bearer() {
    let (app, _store) = build_test_app();
    let (_user_id, refresh) = logged_in_user(app.clone(), "bearer@example.com").await;

    let response = get_auth(app, "/api/users/me", &refresh).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
