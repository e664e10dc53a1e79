//! Handlers for the `/users` resource.

use axum::Json;
use campus_db::models::user::UserProfile;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;

/// GET /api/users/me
///
/// Public profile of the authenticated user, as loaded by [`AuthUser`].
pub async fn me(user: AuthUser) -> AppResult<Json<DataResponse<UserProfile>>> {
    Ok(Json(DataResponse { data: user.profile }))
}
