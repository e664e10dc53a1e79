pub mod auth;
pub mod health;
pub mod student;
pub mod user;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register          register (public)
/// /auth/login             login (public)
/// /auth/refresh           refresh (refresh_token cookie)
/// /auth/logout            logout (public)
///
/// /users/me               current user (requires auth)
///
/// /students               list, create (requires auth)
/// /students/{id}          get, update, delete (requires auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", user::router())
        .nest("/students", student::router())
}
