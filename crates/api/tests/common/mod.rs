#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, Response};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http_body_util::BodyExt;
use tower::ServiceExt;

use campus_api::auth::jwt::KeyPair;
use campus_api::config::ServerConfig;
use campus_api::router::build_app_router;
use campus_api::state::AppState;
use campus_db::credentials::MemoryCredentialStore;

pub const ACCESS_PRIVATE_PEM: &str = include_str!("../fixtures/access_private.pem");
pub const ACCESS_PUBLIC_PEM: &str = include_str!("../fixtures/access_public.pem");
pub const REFRESH_PRIVATE_PEM: &str = include_str!("../fixtures/refresh_private.pem");
pub const REFRESH_PUBLIC_PEM: &str = include_str!("../fixtures/refresh_public.pem");

/// Build a test `ServerConfig` the same way production does, from
/// base64-wrapped PEM keys, with 15/60 minute token lifetimes.
pub fn test_config() -> ServerConfig {
    let lookup = |key: &str| -> Option<String> {
        let value = match key {
            "DATABASE_URL" => "postgres://localhost/campus_test".to_string(),
            "ACCESS_TOKEN_PRIVATE_KEY" => STANDARD.encode(ACCESS_PRIVATE_PEM),
            "ACCESS_TOKEN_PUBLIC_KEY" => STANDARD.encode(ACCESS_PUBLIC_PEM),
            "REFRESH_TOKEN_PRIVATE_KEY" => STANDARD.encode(REFRESH_PRIVATE_PEM),
            "REFRESH_TOKEN_PUBLIC_KEY" => STANDARD.encode(REFRESH_PUBLIC_PEM),
            "ACCESS_TOKEN_EXPIRES_IN" => "15".to_string(),
            "REFRESH_TOKEN_EXPIRES_IN" => "60".to_string(),
            _ => return None,
        };
        Some(value)
    };
    ServerConfig::from_lookup(&lookup).expect("test config should load")
}

pub fn access_keys() -> KeyPair {
    KeyPair::from_pem(ACCESS_PRIVATE_PEM.as_bytes(), ACCESS_PUBLIC_PEM.as_bytes()).unwrap()
}

pub fn refresh_keys() -> KeyPair {
    KeyPair::from_pem(REFRESH_PRIVATE_PEM.as_bytes(), REFRESH_PUBLIC_PEM.as_bytes()).unwrap()
}

/// Build the full application router backed by an in-memory credential
/// store. The Postgres pool is lazy and never connects, so only routes that
/// stay off the database can be exercised here.
pub fn build_test_app() -> (Router, Arc<MemoryCredentialStore>) {
    let config = test_config();
    let store = Arc::new(MemoryCredentialStore::new());
    let pool = campus_db::create_lazy_pool(&config.database_url).expect("lazy pool");

    let state = AppState {
        pool,
        credentials: store.clone(),
        config: Arc::new(config.clone()),
    };

    (build_app_router(state, &config), store)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn get_with_cookie(app: Router, uri: &str, cookie: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// All `Set-Cookie` header values on a response.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// The `Set-Cookie` header for cookie `name`, if one was sent.
pub fn set_cookie_for(response: &Response<Body>, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    set_cookies(response)
        .into_iter()
        .find(|c| c.starts_with(&prefix))
}

/// Value of cookie `name` from the response `Set-Cookie` headers.
pub fn cookie_value(response: &Response<Body>, name: &str) -> Option<String> {
    set_cookie_for(response, name).map(|c| {
        c.split(';')
            .next()
            .unwrap_or_default()
            .split_once('=')
            .map(|(_, v)| v.to_string())
            .unwrap_or_default()
    })
}

// ---------------------------------------------------------------------------
// Flows
// ---------------------------------------------------------------------------

pub const PASSWORD: &str = "correct horse battery staple";

pub async fn register(app: Router, email: &str) -> Response<Body> {
    post_json(
        app,
        "/api/auth/register",
        serde_json::json!({
            "email": email,
            "password": PASSWORD,
            "passwordConfirm": PASSWORD,
        }),
    )
    .await
}

pub async fn login(app: Router, email: &str, password: &str) -> Response<Body> {
    post_json(
        app,
        "/api/auth/login",
        serde_json::json!({ "email": email, "password": password }),
    )
    .await
}
