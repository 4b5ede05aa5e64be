//! Credential login and logout endpoints.

use axum::{
    Json,
    extract::Extension,
    http::{StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};

use super::state::AuthState;
use super::storage::{
    AccountRecord, apply_lockout_update, lookup_account_by_username, record_login_success,
};
use super::types::{AccountResponse, LoginRequest, LoginResponse, MessageResponse};
use crate::auth::{
    error::AuthError,
    lockout::{self, LockoutUpdate},
    password::verify_password,
    session::{clear_session_cookie, session_cookie},
    token::Claims,
};

/// Gate checks that run before the password is ever verified. Order matters:
/// a disabled account reports disabled even while a lock is active.
fn preflight(record: &AccountRecord) -> Result<(), AuthError> {
    if !record.is_active {
        return Err(AuthError::AccountDisabled);
    }
    if lockout::is_locked(record.locked_until) {
        return Err(AuthError::AccountLocked {
            retry_after_seconds: lockout::retry_after_seconds(record.locked_until),
        });
    }
    Ok(())
}

/// State transition for a wrong password: bump the counter and decide
/// whether this attempt crossed the lock threshold.
fn failure_outcome(current_attempts: i32) -> (LockoutUpdate, AuthError) {
    let update = lockout::record_failure(current_attempts);
    let error = match update.locked_until {
        Some(until) => AuthError::AccountLocked {
            retry_after_seconds: lockout::retry_after_seconds(Some(until)),
        },
        None => AuthError::InvalidCredentials,
    };
    (update, error)
}

#[utoipa::path(
    post,
    path = "/api/admin/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login succeeded", body = LoginResponse),
        (status = 400, description = "Missing or malformed payload", body = MessageResponse),
        (status = 401, description = "Invalid credentials", body = MessageResponse),
        (status = 403, description = "Account disabled or locked", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Response, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::MalformedRequest("Missing payload".to_string()));
    };

    // The login write path is not idempotent, so the lookup does not retry.
    let record = lookup_account_by_username(&pool, &request.username)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    preflight(&record)?;

    if !verify_password(&request.password, &record.password_hash) {
        let (update, error) = failure_outcome(record.login_attempts);
        apply_lockout_update(&pool, record.id, &update).await?;
        warn!(
            username = %record.username,
            attempts = update.login_attempts,
            locked = update.locked_until.is_some(),
            "Failed login attempt"
        );
        return Err(error);
    }

    record_login_success(&pool, record.id).await?;

    let claims = Claims::new(
        record.id,
        record.username.clone(),
        record.role,
        record.permissions.clone(),
    );
    let token = auth_state.tokens().issue(&claims)?;
    let cookie = session_cookie(&token, auth_state.config().cookie_secure())
        .map_err(|err| AuthError::Store(err.into()))?;

    info!(username = %record.username, "Admin login");

    let body = LoginResponse {
        token,
        user: AccountResponse::from(&record),
    };
    Ok((StatusCode::OK, [(SET_COOKIE, cookie)], Json(body)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/admin/auth/logout",
    responses(
        (status = 200, description = "Session cleared", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn logout(auth_state: Extension<Arc<AuthState>>) -> Result<Response, AuthError> {
    // Clears the cookie unconditionally; an expired or absent session is not
    // an error from the caller's point of view.
    let cookie = clear_session_cookie(auth_state.config().cookie_secure())
        .map_err(|err| AuthError::Store(err.into()))?;

    let body = MessageResponse {
        message: "Logged out".to_string(),
    };
    Ok((StatusCode::OK, [(SET_COOKIE, cookie)], Json(body)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::lockout::{LOCK_DURATION_SECONDS, MAX_LOGIN_ATTEMPTS};
    use crate::auth::permission::Role;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn record() -> AccountRecord {
        AccountRecord {
            id: Uuid::new_v4(),
            username: "mira".to_string(),
            email: "mira@example.com".to_string(),
            display_name: "Mira".to_string(),
            password_hash: "$argon2id$v=19$irrelevant".to_string(),
            role: Role::Admin,
            permissions: Role::Admin.default_permissions(),
            is_active: true,
            login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn active_unlocked_account_passes_preflight() {
        assert!(preflight(&record()).is_ok());
    }

    #[test]
    fn disabled_account_reported_before_lock() {
        let mut account = record();
        account.is_active = false;
        account.locked_until = Some(Utc::now() + Duration::minutes(10));
        assert!(matches!(preflight(&account), Err(AuthError::AccountDisabled)));
    }

    #[test]
    fn locked_account_short_circuits_with_retry_after() {
        let mut account = record();
        account.login_attempts = MAX_LOGIN_ATTEMPTS;
        account.locked_until = Some(Utc::now() + Duration::minutes(10));
        match preflight(&account) {
            Err(AuthError::AccountLocked {
                retry_after_seconds,
            }) => {
                assert!(retry_after_seconds > 0);
                assert!(i64::try_from(retry_after_seconds).unwrap() <= LOCK_DURATION_SECONDS);
            }
            other => panic!("expected locked, got {other:?}"),
        }
    }

    #[test]
    fn expired_lock_passes_preflight_with_counter_retained() {
        let mut account = record();
        account.login_attempts = MAX_LOGIN_ATTEMPTS;
        account.locked_until = Some(Utc::now() - Duration::seconds(1));
        assert!(preflight(&account).is_ok());

        // The retained counter means the next failure locks again at once.
        let (update, error) = failure_outcome(account.login_attempts);
        assert!(update.locked_until.is_some());
        assert!(matches!(error, AuthError::AccountLocked { .. }));
    }

    #[test]
    fn failures_below_threshold_stay_invalid_credentials() {
        for attempts in 0..MAX_LOGIN_ATTEMPTS - 1 {
            let (update, error) = failure_outcome(attempts);
            assert_eq!(update.login_attempts, attempts + 1);
            assert!(update.locked_until.is_none());
            assert!(matches!(error, AuthError::InvalidCredentials));
        }
    }

    #[test]
    fn fifth_failure_locks_for_the_full_window() {
        let (update, error) = failure_outcome(MAX_LOGIN_ATTEMPTS - 1);
        assert_eq!(update.login_attempts, MAX_LOGIN_ATTEMPTS);
        let until = update.locked_until.expect("lock expected");
        let remaining = (until - Utc::now()).num_seconds();
        assert!((LOCK_DURATION_SECONDS - 5..=LOCK_DURATION_SECONDS).contains(&remaining));
        assert!(matches!(error, AuthError::AccountLocked { .. }));
    }
}
