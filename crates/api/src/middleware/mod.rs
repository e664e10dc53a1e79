//! Authentication extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from an access token.

pub mod auth;
