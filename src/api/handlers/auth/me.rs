//! Current-session introspection endpoint.

use anyhow::Result;
use axum::{Json, extract::Extension, http::HeaderMap};
use sqlx::PgPool;
use std::sync::Arc;

use super::principal::require_auth;
use super::state::AuthState;
use super::storage::{AccountRecord, lookup_account_by_id, with_read_retry};
use super::types::{AccountResponse, MessageResponse};
use crate::auth::error::AuthError;

/// Decide what a token-holder's account re-read means. A vanished account is
/// a revoked session (401, caller drops identity); a store fault is a 500 the
/// caller must not treat as a logout; a deactivated account is 403.
fn resolve_account(lookup: Result<Option<AccountRecord>>) -> Result<AccountRecord, AuthError> {
    let record = lookup?.ok_or(AuthError::Unauthorized)?;
    if !record.is_active {
        return Err(AuthError::AccountDisabled);
    }
    Ok(record)
}

#[utoipa::path(
    get,
    path = "/api/admin/auth/me",
    responses(
        (status = 200, description = "Current account", body = AccountResponse),
        (status = 401, description = "No valid session", body = MessageResponse),
        (status = 403, description = "Account disabled", body = MessageResponse),
        (status = 500, description = "Store unavailable", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn me(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<Json<AccountResponse>, AuthError> {
    let claims = require_auth(&headers, &auth_state)?;

    // Idempotent read: transient store faults retry before surfacing.
    let lookup = with_read_retry(|| lookup_account_by_id(&pool, claims.user_id)).await;
    let record = resolve_account(lookup)?;

    Ok(Json(AccountResponse::from(&record)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::permission::Role;
    use anyhow::anyhow;
    use axum::http::StatusCode;
    use chrono::Utc;
    use uuid::Uuid;

    fn record(is_active: bool) -> AccountRecord {
        AccountRecord {
            id: Uuid::new_v4(),
            username: "theo".to_string(),
            email: "theo@example.com".to_string(),
            display_name: "Theo".to_string(),
            password_hash: "$argon2id$v=19$irrelevant".to_string(),
            role: Role::Editor,
            permissions: Role::Editor.default_permissions(),
            is_active,
            login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn active_account_resolves() {
        let resolved = resolve_account(Ok(Some(record(true)))).expect("active account");
        assert_eq!(resolved.username, "theo");
    }

    #[test]
    fn deleted_account_is_unauthorized() {
        // A valid token whose account is gone means the session is revoked,
        // so the caller clears its identity.
        match resolve_account(Ok(None)) {
            Err(err @ AuthError::Unauthorized) => {
                assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
            }
            other => panic!("expected unauthorized, got {other:?}"),
        }
    }

    #[test]
    fn disabled_account_is_forbidden() {
        match resolve_account(Ok(Some(record(false)))) {
            Err(err @ AuthError::AccountDisabled) => {
                assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
            }
            other => panic!("expected disabled, got {other:?}"),
        }
    }

    #[test]
    fn store_fault_is_transient_not_a_logout() {
        // A failed lookup must surface as 500 so the caller keeps its
        // identity, unlike the 401/403 outcomes above.
        match resolve_account(Err(anyhow!("connection reset"))) {
            Err(err @ AuthError::Store(_)) => {
                assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            }
            other => panic!("expected store error, got {other:?}"),
        }
    }
}
