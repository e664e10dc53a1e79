//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- RS256 token issuance and verification, key material.
//! - [`cookies`] -- Session cookie construction and parsing.

pub mod cookies;
pub mod jwt;
pub mod password;
