//! User entity model and DTOs.

use campus_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserProfile`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub name: String,
    pub username: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub photo: Option<String>,
    pub status: i16,
    pub role: i16,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Public user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: DbId,
    pub name: String,
    pub username: Option<String>,
    pub email: String,
    pub photo: Option<String>,
    pub status: i16,
    pub role: i16,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            photo: user.photo.clone(),
            status: user.status,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// DTO for creating a new user. `email` must already be normalised.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub username: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub photo: Option<String>,
}
