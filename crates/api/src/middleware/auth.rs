//! Access-token authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use campus_core::types::DbId;
use campus_db::models::user::UserProfile;

use crate::auth::cookies::{read_cookie, ACCESS_TOKEN_COOKIE};
use crate::auth::jwt::verify;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user resolved from the access token.
///
/// The token is read from an `Authorization: Bearer` header, falling back to
/// the `access_token` cookie. The user it names must still exist.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    /// Public profile loaded while resolving the token.
    pub profile: UserProfile,
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .or_else(|| read_cookie(&parts.headers, ACCESS_TOKEN_COOKIE))
            .ok_or_else(|| AppError::unauthenticated("You are not logged in"))?;

        let user_id = verify(&token, state.config.tokens.access_keys.decoding_key())
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected access token");
                AppError::unauthenticated(format!("Invalid access token: {e}"))
            })?;

        let user = state
            .credentials
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| {
                AppError::unauthenticated("The user belonging to this token no longer exists")
            })?;

        Ok(AuthUser {
            user_id: user.id,
            profile: UserProfile::from(&user),
        })
    }
}
