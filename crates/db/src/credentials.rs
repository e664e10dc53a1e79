//! Credential store: the persistence seam used by the session handlers.
//!
//! [`PgCredentialStore`] backs production on top of [`UserRepo`];
//! [`MemoryCredentialStore`] keeps users in process memory for tests and
//! local experimentation.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use campus_core::roles::{ROLE_USER, STATUS_ACTIVE};
use campus_core::types::DbId;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::models::user::{CreateUser, User};
use crate::repositories::UserRepo;
use crate::DbPool;

/// PostgreSQL SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A user with the same email or username already exists.
    #[error("a user with that email or username already exists")]
    Duplicate,

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                StoreError::Duplicate
            }
            _ => StoreError::Database(err),
        }
    }
}

/// Lookup and creation of user records.
///
/// Implementations must treat email addresses case-insensitively.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError>;

    /// Insert a user. Fails with [`StoreError::Duplicate`] when the email or
    /// username is taken.
    async fn create(&self, input: &CreateUser) -> Result<User, StoreError>;

    /// Remove a user. Returns `true` if a record was removed.
    async fn delete(&self, id: DbId) -> Result<bool, StoreError>;
}

/// [`CredentialStore`] backed by the `users` table.
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: DbPool,
}

impl PgCredentialStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::find_by_email(&self.pool, email).await?)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn create(&self, input: &CreateUser) -> Result<User, StoreError> {
        Ok(UserRepo::create(&self.pool, input).await?)
    }

    async fn delete(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(UserRepo::delete(&self.pool, id).await?)
    }
}

/// In-process [`CredentialStore`]. Ids are assigned sequentially from 1.
#[derive(Debug)]
pub struct MemoryCredentialStore {
    users: RwLock<Vec<User>>,
    next_id: AtomicI64,
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self {
            users: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = email.to_lowercase();
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, input: &CreateUser) -> Result<User, StoreError> {
        let email = input.email.to_lowercase();
        let mut users = self.users.write().await;
        if users
            .iter()
            .any(|u| u.email == email || (u.username.is_some() && u.username == input.username))
        {
            return Err(StoreError::Duplicate);
        }

        let now = Utc::now();
        let user = User {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            name: input.name.clone(),
            username: input.username.clone(),
            email,
            password_hash: input.password_hash.clone(),
            photo: input.photo.clone(),
            status: STATUS_ACTIVE,
            role: ROLE_USER,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn delete(&self, id: DbId) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() < before)
    }
}
