//! Request-scoped identity checks shared by the admin handlers.

use axum::http::HeaderMap;

use super::state::AuthState;
use crate::auth::{error::AuthError, permission::has_permission, session, token::Claims};

/// Resolve the caller's claims from the session cookie or bearer header.
/// A missing or invalid token is always 401, never 403.
pub(crate) fn require_auth(headers: &HeaderMap, state: &AuthState) -> Result<Claims, AuthError> {
    session::current_identity(headers, state.tokens()).ok_or(AuthError::Unauthorized)
}

/// Authenticated but insufficient grants is 403.
pub(crate) fn require_permission(claims: &Claims, required: &str) -> Result<(), AuthError> {
    if has_permission(&claims.permissions, required) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::state::AuthConfig;
    use crate::auth::{permission::Role, token::TokenService};
    use axum::http::header::{AUTHORIZATION, COOKIE};
    use secrecy::SecretString;

    fn state() -> AuthState {
        let tokens = TokenService::new(&SecretString::from("test-secret")).unwrap();
        AuthState::new(AuthConfig::new("http://localhost:3000".to_string()), tokens)
    }

    fn claims_with(permissions: &[&str]) -> Claims {
        Claims::new(
            uuid::Uuid::new_v4(),
            "ines".to_string(),
            Role::Editor,
            permissions.iter().map(ToString::to_string).collect(),
        )
    }

    #[test]
    fn missing_token_is_unauthorized() {
        let headers = HeaderMap::new();
        assert!(matches!(
            require_auth(&headers, &state()),
            Err(AuthError::Unauthorized)
        ));
    }

    #[test]
    fn garbage_bearer_is_unauthorized() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer not-a-token".parse().unwrap());
        assert!(matches!(
            require_auth(&headers, &state()),
            Err(AuthError::Unauthorized)
        ));
    }

    #[test]
    fn valid_cookie_resolves_claims() {
        let state = state();
        let token = state.tokens().issue(&claims_with(&["projects:read"])).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, format!("admin_token={token}").parse().unwrap());

        let claims = require_auth(&headers, &state).unwrap();
        assert_eq!(claims.username, "ines");
    }

    #[test]
    fn permission_checks_map_to_forbidden() {
        let claims = claims_with(&["projects:read"]);
        assert!(require_permission(&claims, "projects:read").is_ok());
        assert!(matches!(
            require_permission(&claims, "users:delete"),
            Err(AuthError::Forbidden)
        ));
    }
}
