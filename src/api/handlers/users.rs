//! Admin account management endpoints, gated by `users:*` permissions.

use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use super::auth::principal::{require_auth, require_permission};
use super::auth::state::AuthState;
use super::auth::storage::{
    AccountChanges, NewAccount, WriteOutcome, delete_account, insert_account, list_accounts,
    lookup_account_by_id, set_password, update_account, with_read_retry,
};
use super::auth::types::{AccountResponse, MessageResponse};
use crate::auth::{error::AuthError, password::hash_password, permission::Role};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub role: Role,
    /// Explicit grants; when omitted the role's defaults apply.
    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub permissions: Option<Vec<String>>,
    pub is_active: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

fn conflict_response() -> Response {
    (
        StatusCode::CONFLICT,
        Json(MessageResponse {
            message: "Username or email already in use".to_string(),
        }),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses(
        (status = 200, description = "All admin accounts", body = [AccountResponse]),
        (status = 401, description = "No valid session", body = MessageResponse),
        (status = 403, description = "Missing users:read", body = MessageResponse)
    ),
    tag = "users"
)]
pub async fn list(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<Json<Vec<AccountResponse>>, AuthError> {
    let claims = require_auth(&headers, &auth_state)?;
    require_permission(&claims, "users:read")?;

    let accounts = with_read_retry(|| list_accounts(&pool)).await?;
    Ok(Json(accounts.iter().map(AccountResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account", body = AccountResponse),
        (status = 404, description = "Unknown account", body = MessageResponse)
    ),
    tag = "users"
)]
pub async fn get(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, AuthError> {
    let claims = require_auth(&headers, &auth_state)?;
    require_permission(&claims, "users:read")?;

    match with_read_retry(|| lookup_account_by_id(&pool, id)).await? {
        Some(record) => Ok(Json(AccountResponse::from(&record)).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(MessageResponse {
                message: "User not found".to_string(),
            }),
        )
            .into_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 400, description = "Missing or malformed payload", body = MessageResponse),
        (status = 409, description = "Username or email taken", body = MessageResponse)
    ),
    tag = "users"
)]
pub async fn create(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<CreateUserRequest>>,
) -> Result<Response, AuthError> {
    let claims = require_auth(&headers, &auth_state)?;
    require_permission(&claims, "users:write")?;

    let Some(Json(request)) = payload else {
        return Err(AuthError::MalformedRequest("Missing payload".to_string()));
    };
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err(AuthError::MalformedRequest(
            "Username and password are required".to_string(),
        ));
    }

    let permissions = request
        .permissions
        .unwrap_or_else(|| request.role.default_permissions());
    let password_hash = hash_password(&request.password).map_err(AuthError::Store)?;

    let account = NewAccount {
        username: request.username.trim().to_string(),
        email: request.email.trim().to_string(),
        display_name: request.display_name,
        password_hash,
        role: request.role,
        permissions,
    };

    match insert_account(&pool, &account).await? {
        WriteOutcome::Applied(record) => {
            info!(username = %record.username, "Admin account created");
            Ok((StatusCode::CREATED, Json(AccountResponse::from(&record))).into_response())
        }
        WriteOutcome::Conflict => Ok(conflict_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "Account id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Account updated", body = AccountResponse),
        (status = 404, description = "Unknown account", body = MessageResponse),
        (status = 409, description = "Email taken", body = MessageResponse)
    ),
    tag = "users"
)]
pub async fn update(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Path(id): Path<Uuid>,
    payload: Option<Json<UpdateUserRequest>>,
) -> Result<Response, AuthError> {
    let claims = require_auth(&headers, &auth_state)?;
    require_permission(&claims, "users:write")?;

    let Some(Json(request)) = payload else {
        return Err(AuthError::MalformedRequest("Missing payload".to_string()));
    };

    let changes = AccountChanges {
        email: request.email.trim().to_string(),
        display_name: request.display_name,
        role: request.role,
        permissions: request
            .permissions
            .unwrap_or_else(|| request.role.default_permissions()),
        is_active: request.is_active,
    };

    match update_account(&pool, id, &changes).await? {
        Some(WriteOutcome::Applied(record)) => {
            Ok(Json(AccountResponse::from(&record)).into_response())
        }
        Some(WriteOutcome::Conflict) => Ok(conflict_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(MessageResponse {
                message: "User not found".to_string(),
            }),
        )
            .into_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 403, description = "Cannot delete own account", body = MessageResponse),
        (status = 404, description = "Unknown account", body = MessageResponse)
    ),
    tag = "users"
)]
pub async fn delete(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, AuthError> {
    let claims = require_auth(&headers, &auth_state)?;
    require_permission(&claims, "users:delete")?;

    // A caller can never remove their own account, regardless of grants.
    if claims.user_id == id {
        return Err(AuthError::Forbidden);
    }

    if delete_account(&pool, id).await? {
        info!(%id, deleted_by = %claims.username, "Admin account deleted");
        Ok(Json(MessageResponse {
            message: "User deleted".to_string(),
        })
        .into_response())
    } else {
        Ok((
            StatusCode::NOT_FOUND,
            Json(MessageResponse {
                message: "User not found".to_string(),
            }),
        )
            .into_response())
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/reset-password",
    params(("id" = Uuid, Path, description = "Account id")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced", body = MessageResponse),
        (status = 404, description = "Unknown account", body = MessageResponse)
    ),
    tag = "users"
)]
pub async fn reset_password(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Path(id): Path<Uuid>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> Result<Response, AuthError> {
    let claims = require_auth(&headers, &auth_state)?;
    require_permission(&claims, "users:write")?;

    let Some(Json(request)) = payload else {
        return Err(AuthError::MalformedRequest("Missing payload".to_string()));
    };
    if request.new_password.is_empty() {
        return Err(AuthError::MalformedRequest(
            "New password is required".to_string(),
        ));
    }

    let password_hash = hash_password(&request.new_password).map_err(AuthError::Store)?;
    if set_password(&pool, id, &password_hash).await? {
        info!(%id, reset_by = %claims.username, "Admin password reset");
        Ok(Json(MessageResponse {
            message: "Password updated".to_string(),
        })
        .into_response())
    } else {
        Ok((
            StatusCode::NOT_FOUND,
            Json(MessageResponse {
                message: "User not found".to_string(),
            }),
        )
            .into_response())
    }
}
