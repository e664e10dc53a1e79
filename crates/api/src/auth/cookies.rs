//! Session cookies: `access_token`, `refresh_token` and the script-readable
//! `logged_in` flag.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use cookie::time::{Duration, OffsetDateTime};
use cookie::{Cookie, SameSite};

use super::jwt::TokenConfig;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
pub const LOGGED_IN_COOKIE: &str = "logged_in";

/// Attributes applied to every session cookie.
#[derive(Debug, Clone, Default)]
pub struct CookieConfig {
    /// `Domain` attribute; host-only cookie when `None`.
    pub domain: Option<String>,
    pub secure: bool,
}

fn build(
    name: &'static str,
    value: String,
    http_only: bool,
    config: &CookieConfig,
) -> cookie::CookieBuilder<'static> {
    let builder = Cookie::build((name, value))
        .path("/")
        .http_only(http_only)
        .secure(config.secure)
        .same_site(SameSite::Lax);
    match &config.domain {
        Some(domain) => builder.domain(domain.clone()),
        None => builder,
    }
}

/// A live cookie expiring after `max_age_mins` minutes.
fn live(
    name: &'static str,
    value: &str,
    max_age_mins: i64,
    http_only: bool,
    config: &CookieConfig,
) -> Cookie<'static> {
    build(name, value.to_string(), http_only, config)
        .max_age(Duration::minutes(max_age_mins))
        .build()
}

/// An emptied cookie with negative max-age, telling the browser to drop it.
fn expired(name: &'static str, http_only: bool, config: &CookieConfig) -> Cookie<'static> {
    build(name, String::new(), http_only, config)
        .max_age(Duration::seconds(-1))
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}

/// Cookies set on login: both tokens plus the `logged_in` flag.
pub fn login_cookies(
    config: &CookieConfig,
    tokens: &TokenConfig,
    access_token: &str,
    refresh_token: &str,
) -> Vec<Cookie<'static>> {
    vec![
        live(ACCESS_TOKEN_COOKIE, access_token, tokens.access_max_age_mins, true, config),
        live(REFRESH_TOKEN_COOKIE, refresh_token, tokens.refresh_max_age_mins, true, config),
        live(LOGGED_IN_COOKIE, "true", tokens.access_max_age_mins, false, config),
    ]
}

/// Cookies set on refresh. The refresh token cookie is left as it is.
pub fn refresh_cookies(
    config: &CookieConfig,
    tokens: &TokenConfig,
    access_token: &str,
) -> Vec<Cookie<'static>> {
    vec![
        live(ACCESS_TOKEN_COOKIE, access_token, tokens.access_max_age_mins, true, config),
        live(LOGGED_IN_COOKIE, "true", tokens.access_max_age_mins, false, config),
    ]
}

/// Cookies set on logout: all three cleared.
pub fn logout_cookies(config: &CookieConfig) -> Vec<Cookie<'static>> {
    vec![
        expired(ACCESS_TOKEN_COOKIE, true, config),
        expired(REFRESH_TOKEN_COOKIE, true, config),
        expired(LOGGED_IN_COOKIE, false, config),
    ]
}

/// Render cookies as `Set-Cookie` headers.
pub fn set_cookie_headers(
    cookies: &[Cookie<'_>],
) -> Result<HeaderMap, axum::http::header::InvalidHeaderValue> {
    let mut headers = HeaderMap::new();
    for cookie in cookies {
        headers.append(SET_COOKIE, HeaderValue::from_str(&cookie.to_string())?);
    }
    Ok(headers)
}

/// Value of the request cookie `name`, if present and non-empty.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|part| Cookie::parse(part.trim()).ok())
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}
