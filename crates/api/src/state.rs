use std::sync::Arc;

use campus_db::credentials::CredentialStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything shared is behind `Arc` or is a pool handle.
/// Nothing in here is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: campus_db::DbPool,
    /// User lookup and creation for the session handlers.
    pub credentials: Arc<dyn CredentialStore>,
    /// Immutable server configuration, including token keys.
    pub config: Arc<ServerConfig>,
}
