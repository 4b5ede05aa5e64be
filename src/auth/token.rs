//! Session token issue and verification.
//!
//! Tokens are HS256 JWTs signed with a server-held secret. Validity is
//! entirely signature plus expiry; nothing is persisted server-side, so a
//! permission change only reaches held sessions through a new login.

use anyhow::{anyhow, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::permission::Role;

/// Fixed token validity window: 7 days, matching the session cookie max-age.
pub const TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Identity and authorization claims embedded in a session token.
///
/// Immutable after issuance; `permissions` is a snapshot taken at login.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub permissions: Vec<String>,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiry (Unix timestamp).
    pub exp: i64,
}

impl Claims {
    #[must_use]
    pub fn new(user_id: Uuid, username: String, role: Role, permissions: Vec<String>) -> Self {
        Self::with_validity(user_id, username, role, permissions, TOKEN_TTL_SECONDS)
    }

    /// Stamp claims with an explicit validity window.
    #[must_use]
    pub(crate) fn with_validity(
        user_id: Uuid,
        username: String,
        role: Role,
        permissions: Vec<String>,
        ttl_seconds: i64,
    ) -> Self {
        let now = Utc::now().timestamp();
        Self {
            user_id,
            username,
            role,
            permissions,
            iat: now,
            exp: now + ttl_seconds,
        }
    }
}

/// Issues and verifies signed session tokens.
///
/// Construction fails on an unusable secret; that is a startup precondition,
/// never a per-request error.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    /// # Errors
    ///
    /// Returns an error if the signing secret is empty.
    pub fn new(secret: &SecretString) -> Result<Self> {
        let secret = secret.expose_secret();
        if secret.is_empty() {
            return Err(anyhow!("JWT signing secret is not configured"));
        }

        let mut validation = Validation::default();
        // No clock-skew allowance; expiry semantics stay exact.
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Serialize and sign claims.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn issue(&self, claims: &Claims) -> Result<String> {
        encode(&Header::default(), claims, &self.encoding)
            .map_err(|err| anyhow!("failed to sign session token: {err}"))
    }

    /// Check signature and expiry. Bad signature, expiry, and malformed input
    /// all collapse into `None`; callers treat every failure as
    /// "re-authenticate".
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&SecretString::from(secret.to_string()))
            .expect("secret should be usable")
    }

    fn sample_claims(ttl_seconds: i64) -> Claims {
        Claims::with_validity(
            Uuid::new_v4(),
            "alice".to_string(),
            Role::Admin,
            vec!["projects:*".to_string()],
            ttl_seconds,
        )
    }

    #[test]
    fn empty_secret_is_a_startup_error() {
        assert!(TokenService::new(&SecretString::default()).is_err());
    }

    #[test]
    fn issue_then_verify_round_trips() -> Result<()> {
        let tokens = service("test-secret");
        let claims = sample_claims(TOKEN_TTL_SECONDS);
        let token = tokens.issue(&claims)?;

        let verified = tokens.verify(&token).expect("fresh token should verify");
        assert_eq!(verified.user_id, claims.user_id);
        assert_eq!(verified.username, "alice");
        assert_eq!(verified.role, Role::Admin);
        assert_eq!(verified.permissions, claims.permissions);
        assert_eq!(verified.exp - verified.iat, TOKEN_TTL_SECONDS);
        Ok(())
    }

    #[test]
    fn expired_token_fails_verification() -> Result<()> {
        let tokens = service("test-secret");
        let token = tokens.issue(&sample_claims(-120))?;
        assert!(tokens.verify(&token).is_none());
        Ok(())
    }

    #[test]
    fn wrong_secret_fails_verification() -> Result<()> {
        let issuer = service("secret-one");
        let verifier = service("secret-two");
        let token = issuer.issue(&sample_claims(TOKEN_TTL_SECONDS))?;
        assert!(verifier.verify(&token).is_none());
        assert!(issuer.verify(&token).is_some());
        Ok(())
    }

    #[test]
    fn malformed_tokens_fail_verification() {
        let tokens = service("test-secret");
        assert!(tokens.verify("").is_none());
        assert!(tokens.verify("not.a.jwt").is_none());
        assert!(tokens.verify("a.b").is_none());
    }

    #[test]
    fn claims_serialize_with_expected_field_names() -> Result<()> {
        let claims = sample_claims(60);
        let value = serde_json::to_value(&claims)?;
        assert!(value.get("userId").is_some());
        assert_eq!(
            value.get("role").and_then(serde_json::Value::as_str),
            Some("admin")
        );
        assert!(value.get("iat").is_some());
        assert!(value.get("exp").is_some());
        Ok(())
    }
}
