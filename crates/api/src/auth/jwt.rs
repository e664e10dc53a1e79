//! Token service: RS256-signed, time-bound assertions about a user id.
//!
//! Access and refresh tokens share one format ([`TokenClaims`]) and differ only
//! in lifetime and key pair. Signing needs the private half; verification only
//! the public half.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use campus_core::types::DbId;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::{env_i64, require, ConfigError};

/// Claims carried by every token. All times are UTC Unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,

    #[error("could not sign token: {0}")]
    Signing(String),
}

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("{name} is not valid base64: {source}")]
    Base64 {
        name: &'static str,
        source: base64::DecodeError,
    },

    #[error("{name} is not a PEM-encoded RSA key: {source}")]
    Pem {
        name: &'static str,
        source: jsonwebtoken::errors::Error,
    },
}

/// Matching RSA signing and verification keys.
#[derive(Clone)]
pub struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    /// Build a key pair from raw PEM documents.
    pub fn from_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self, KeyError> {
        let encoding = EncodingKey::from_rsa_pem(private_pem).map_err(|source| KeyError::Pem {
            name: "private key",
            source,
        })?;
        let decoding = DecodingKey::from_rsa_pem(public_pem).map_err(|source| KeyError::Pem {
            name: "public key",
            source,
        })?;
        Ok(Self { encoding, decoding })
    }

    /// Build a key pair from base64-wrapped PEM strings, as held in the environment.
    pub fn from_base64_pem(private_b64: &str, public_b64: &str) -> Result<Self, KeyError> {
        let private_pem = STANDARD
            .decode(private_b64.trim())
            .map_err(|source| KeyError::Base64 {
                name: "private key",
                source,
            })?;
        let public_pem = STANDARD
            .decode(public_b64.trim())
            .map_err(|source| KeyError::Base64 {
                name: "public key",
                source,
            })?;
        Self::from_pem(&private_pem, &public_pem)
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyPair { .. }")
    }
}

/// Token lifetimes, cookie max-ages and key material for both token kinds.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_keys: KeyPair,
    pub refresh_keys: KeyPair,
    pub access_ttl_mins: i64,
    pub refresh_ttl_mins: i64,
    pub access_max_age_mins: i64,
    pub refresh_max_age_mins: i64,
}

/// Default access token lifetime in minutes.
const DEFAULT_ACCESS_TTL_MINS: i64 = 15;
/// Default refresh token lifetime in minutes.
const DEFAULT_REFRESH_TTL_MINS: i64 = 60;
/// Upper bound for any token lifetime or cookie max-age: one year.
pub const MAX_LIFETIME_MINS: i64 = 366 * 24 * 60;

fn check_minutes(name: &'static str, value: i64) -> Result<i64, ConfigError> {
    if !(0..=MAX_LIFETIME_MINS).contains(&value) {
        return Err(ConfigError::OutOfRange {
            name,
            value,
            max: MAX_LIFETIME_MINS,
        });
    }
    Ok(value)
}

impl TokenConfig {
    /// Assemble a config with cookie max-ages equal to the token lifetimes.
    ///
    /// Both lifetimes must lie in `0..=MAX_LIFETIME_MINS`
    /// ([`ConfigError::OutOfRange`]), and the access TTL must be strictly
    /// shorter than the refresh TTL ([`ConfigError::TtlOrder`]).
    pub fn new(
        access_keys: KeyPair,
        refresh_keys: KeyPair,
        access_ttl_mins: i64,
        refresh_ttl_mins: i64,
    ) -> Result<Self, ConfigError> {
        check_minutes("ACCESS_TOKEN_EXPIRES_IN", access_ttl_mins)?;
        check_minutes("REFRESH_TOKEN_EXPIRES_IN", refresh_ttl_mins)?;
        if access_ttl_mins >= refresh_ttl_mins {
            return Err(ConfigError::TtlOrder {
                access: access_ttl_mins,
                refresh: refresh_ttl_mins,
            });
        }
        Ok(Self {
            access_keys,
            refresh_keys,
            access_ttl_mins,
            refresh_ttl_mins,
            access_max_age_mins: access_ttl_mins,
            refresh_max_age_mins: refresh_ttl_mins,
        })
    }

    /// Load token configuration through `lookup`.
    ///
    /// | Env Var                     | Required | Default           |
    /// |-----------------------------|----------|-------------------|
    /// | `ACCESS_TOKEN_PRIVATE_KEY`  | **yes**  | --                |
    /// | `ACCESS_TOKEN_PUBLIC_KEY`   | **yes**  | --                |
    /// | `REFRESH_TOKEN_PRIVATE_KEY` | **yes**  | --                |
    /// | `REFRESH_TOKEN_PUBLIC_KEY`  | **yes**  | --                |
    /// | `ACCESS_TOKEN_EXPIRES_IN`   | no       | `15` (minutes)    |
    /// | `REFRESH_TOKEN_EXPIRES_IN`  | no       | `60` (minutes)    |
    /// | `ACCESS_TOKEN_MAX_AGE`      | no       | access TTL        |
    /// | `REFRESH_TOKEN_MAX_AGE`     | no       | refresh TTL       |
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_keys = KeyPair::from_base64_pem(
            &require(lookup, "ACCESS_TOKEN_PRIVATE_KEY")?,
            &require(lookup, "ACCESS_TOKEN_PUBLIC_KEY")?,
        )?;
        let refresh_keys = KeyPair::from_base64_pem(
            &require(lookup, "REFRESH_TOKEN_PRIVATE_KEY")?,
            &require(lookup, "REFRESH_TOKEN_PUBLIC_KEY")?,
        )?;

        let access_ttl = env_i64(lookup, "ACCESS_TOKEN_EXPIRES_IN", DEFAULT_ACCESS_TTL_MINS)?;
        let refresh_ttl = env_i64(lookup, "REFRESH_TOKEN_EXPIRES_IN", DEFAULT_REFRESH_TTL_MINS)?;

        let mut config = Self::new(access_keys, refresh_keys, access_ttl, refresh_ttl)?;
        config.access_max_age_mins = check_minutes(
            "ACCESS_TOKEN_MAX_AGE",
            env_i64(lookup, "ACCESS_TOKEN_MAX_AGE", access_ttl)?,
        )?;
        config.refresh_max_age_mins = check_minutes(
            "REFRESH_TOKEN_MAX_AGE",
            env_i64(lookup, "REFRESH_TOKEN_MAX_AGE", refresh_ttl)?,
        )?;
        Ok(config)
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::minutes(self.access_ttl_mins)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::minutes(self.refresh_ttl_mins)
    }
}

/// Sign a token for `subject` valid from now until now + `ttl`.
pub fn issue(subject: DbId, ttl: Duration, key: &EncodingKey) -> Result<String, TokenError> {
    let now = Utc::now().timestamp();
    let claims = TokenClaims {
        sub: subject,
        iat: now,
        nbf: now,
        exp: now
            .checked_add(ttl.num_seconds())
            .ok_or_else(|| TokenError::Signing("token expiry is out of range".into()))?,
    };

    encode(&Header::new(Algorithm::RS256), &claims, key)
        .map_err(|e| TokenError::Signing(e.to_string()))
}

/// Verify `token` against `key` and return its full claims.
///
/// The signature is checked first, so a token from another key pair is
/// always [`TokenError::InvalidSignature`] regardless of its age. A token is
/// expired once the current second reaches `exp`; no leeway is applied.
pub fn decode_claims(token: &str, key: &DecodingKey) -> Result<TokenClaims, TokenError> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.leeway = 0;
    // `exp` is checked below with an inclusive bound.
    validation.validate_exp = false;
    validation.validate_nbf = true;
    validation.set_required_spec_claims(&["exp", "nbf"]);

    let data = decode::<TokenClaims>(token, key, &validation).map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    })?;

    if Utc::now().timestamp() >= data.claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(data.claims)
}

/// Verify `token` against `key` and return its subject claim.
pub fn verify(token: &str, key: &DecodingKey) -> Result<DbId, TokenError> {
    decode_claims(token, key).map(|claims| claims.sub)
}
