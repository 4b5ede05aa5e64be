//! Session boundary: turning an incoming request into identity claims.
//!
//! The token travels in the `admin_token` cookie; a bearer Authorization
//! header is the fallback for non-browser clients. Verification failures are
//! swallowed into "no identity" so callers decide whether absence is fatal.

use axum::http::{
    header::{InvalidHeaderValue, AUTHORIZATION, COOKIE},
    HeaderMap, HeaderValue,
};

use super::token::{Claims, TokenService, TOKEN_TTL_SECONDS};

pub const SESSION_COOKIE_NAME: &str = "admin_token";

/// Pull a session token from the request: cookie first, then bearer header.
#[must_use]
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_cookie_token(headers) {
        return Some(token);
    }
    extract_bearer_token(headers)
}

/// Resolve the caller's identity claims, if any.
///
/// `None` covers every failure mode: no token, bad signature, expiry.
#[must_use]
pub fn current_identity(headers: &HeaderMap, tokens: &TokenService) -> Option<Claims> {
    extract_token(headers).and_then(|token| tokens.verify(&token))
}

/// Build the `Set-Cookie` value for a fresh session.
///
/// `HttpOnly`, `SameSite=Lax`, `Path=/`, max-age matching the token TTL, and
/// `Secure` when the deployment fronts HTTPS.
///
/// # Errors
///
/// Returns an error if the token contains bytes invalid in a header.
pub fn session_cookie(token: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={TOKEN_TTL_SECONDS}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Build the `Set-Cookie` value that clears the session unconditionally.
///
/// # Errors
///
/// Never fails in practice; the signature mirrors `session_cookie`.
pub fn clear_session_cookie(secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn extract_cookie_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME && !val.is_empty() {
            return Some(val.to_string());
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
