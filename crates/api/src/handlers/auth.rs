//! Handlers for the `/auth` resource (register, login, refresh, logout).
//!
//! Sessions are carried in cookies: login sets `access_token`,
//! `refresh_token` and `logged_in`; refresh replaces `access_token` only;
//! logout clears all three.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use campus_core::error::CoreError;
use campus_core::validation::{check_password_confirmation, normalize_email, validate};
use campus_db::models::user::{CreateUser, UserProfile};
use cookie::Cookie;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::cookies::{
    login_cookies, logout_cookies, read_cookie, refresh_cookies, set_cookie_headers,
    REFRESH_TOKEN_COOKIE,
};
use crate::auth::jwt::{issue, verify};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub username: Option<String>,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[serde(alias = "passwordConfirm")]
    pub password_confirm: String,
    pub photo: Option<String>,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/register
///
/// Create an account. Returns 201 with the public profile.
pub async fn register(
    State(state): State<AppState>,
    AppJson(mut input): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<RegisterResponse>>)> {
    input.email = normalize_email(&input.email);
    validate(&input)?;
    check_password_confirmation(&input.password, &input.password_confirm)?;

    let password_hash = hash_password(&input.password).await?;

    let new_user = CreateUser {
        name: input.name.map(|n| n.trim().to_string()).unwrap_or_default(),
        username: input.username.map(|u| u.trim().to_string()),
        email: input.email,
        password_hash,
        photo: input.photo.filter(|p| !p.trim().is_empty()),
    };
    let user = state.credentials.create(&new_user).await?;
    tracing::info!(user_id = user.id, "User registered");

    let data = RegisterResponse {
        user: UserProfile::from(&user),
    };
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// POST /api/auth/login
///
/// Authenticate with email + password. Sets the session cookies and returns
/// the access token.
pub async fn login(
    State(state): State<AppState>,
    AppJson(mut input): AppJson<LoginRequest>,
) -> AppResult<(HeaderMap, Json<DataResponse<TokenResponse>>)> {
    input.email = normalize_email(&input.email);
    validate(&input)?;

    let Some(user) = state.credentials.find_by_email(&input.email).await? else {
        tracing::debug!("Login for unknown email");
        return Err(invalid_credentials());
    };

    if !verify_password(&input.password, &user.password_hash).await? {
        tracing::warn!(user_id = user.id, "Login with wrong password");
        return Err(invalid_credentials());
    }

    let tokens = &state.config.tokens;
    let access_token = issue(user.id, tokens.access_ttl(), tokens.access_keys.encoding_key())?;
    let refresh_token = issue(user.id, tokens.refresh_ttl(), tokens.refresh_keys.encoding_key())?;

    let headers = cookie_headers(&login_cookies(
        &state.config.cookies,
        tokens,
        &access_token,
        &refresh_token,
    ))?;
    tracing::info!(user_id = user.id, "User logged in");

    Ok((
        headers,
        Json(DataResponse {
            data: TokenResponse { access_token },
        }),
    ))
}

/// GET /api/auth/refresh
///
/// Exchange the `refresh_token` cookie for a new access token. The refresh
/// token itself is not rotated.
pub async fn refresh(
    State(state): State<AppState>,
    request_headers: HeaderMap,
) -> AppResult<(HeaderMap, Json<DataResponse<TokenResponse>>)> {
    let refresh_token = read_cookie(&request_headers, REFRESH_TOKEN_COOKIE).ok_or_else(|| {
        AppError::unauthenticated("Could not refresh access token: no refresh token")
    })?;

    let tokens = &state.config.tokens;
    let user_id = verify(&refresh_token, tokens.refresh_keys.decoding_key()).map_err(|e| {
        tracing::debug!(error = %e, "Rejected refresh token");
        AppError::unauthenticated(format!("Could not refresh access token: {e}"))
    })?;

    let user = state
        .credentials
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| {
            AppError::unauthenticated("The user belonging to this token no longer exists")
        })?;

    let access_token = issue(user.id, tokens.access_ttl(), tokens.access_keys.encoding_key())?;

    let headers = cookie_headers(&refresh_cookies(
        &state.config.cookies,
        tokens,
        &access_token,
    ))?;
    tracing::info!(user_id = user.id, "Access token refreshed");

    Ok((
        headers,
        Json(DataResponse {
            data: TokenResponse { access_token },
        }),
    ))
}

/// POST /api/auth/logout
///
/// Clear all session cookies.
pub async fn logout(
    State(state): State<AppState>,
) -> AppResult<(HeaderMap, Json<DataResponse<&'static str>>)> {
    let headers = cookie_headers(&logout_cookies(&state.config.cookies))?;
    tracing::info!("Session cookies cleared");
    Ok((headers, Json(DataResponse { data: "Logged out" })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::InvalidCredentials(
        "Invalid email or password".into(),
    ))
}

fn cookie_headers(cookies: &[Cookie<'_>]) -> AppResult<HeaderMap> {
    set_cookie_headers(cookies)
        .map_err(|e| AppError::InternalError(format!("Invalid cookie header: {e}")))
}
