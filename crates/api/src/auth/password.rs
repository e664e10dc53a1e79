//! Argon2id password hashing.
//!
//! Hashes are stored in PHC string format, so algorithm parameters and salt
//! travel with the hash. Both operations are CPU-bound and run on the blocking
//! pool so they never stall the async workers.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("could not hash password: {0}")]
    Hash(argon2::password_hash::Error),

    #[error("stored password hash is unreadable: {0}")]
    CorruptHash(argon2::password_hash::Error),

    #[error("password worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

fn hash_blocking(plaintext: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(PasswordError::Hash)
}

fn verify_blocking(plaintext: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(PasswordError::CorruptHash)?;
    match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::CorruptHash(e)),
    }
}

/// Hash `plaintext` with Argon2id and a fresh random salt.
pub async fn hash_password(plaintext: &str) -> Result<String, PasswordError> {
    let plaintext = plaintext.to_owned();
    tokio::task::spawn_blocking(move || hash_blocking(&plaintext)).await?
}

/// Check `plaintext` against a stored PHC hash.
///
/// A mismatch is `Ok(false)`; only an unreadable hash is an error.
pub async fn verify_password(plaintext: &str, hash: &str) -> Result<bool, PasswordError> {
    let plaintext = plaintext.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || verify_blocking(&plaintext, &hash)).await?
}
