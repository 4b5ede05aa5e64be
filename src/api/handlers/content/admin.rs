//! Authenticated content management endpoints.
//!
//! Each resource is gated by its own `resource:action` grant; site settings
//! only require an authenticated session.

use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::storage::{
    self, delete_project, fetch_project, fetch_singleton, insert_project, list_projects,
    set_published, update_project, upsert_singleton,
};
use crate::api::handlers::auth::principal::{require_auth, require_permission};
use crate::api::handlers::auth::state::AuthState;
use crate::api::handlers::auth::storage::with_read_retry;
use crate::api::handlers::auth::types::MessageResponse;
use crate::auth::error::AuthError;

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(MessageResponse {
            message: format!("{what} not found"),
        }),
    )
        .into_response()
}

fn require_object(payload: Option<Json<Value>>) -> Result<Value, AuthError> {
    let Some(Json(data)) = payload else {
        return Err(AuthError::MalformedRequest("Missing payload".to_string()));
    };
    if !data.is_object() {
        return Err(AuthError::MalformedRequest(
            "Expected a JSON object".to_string(),
        ));
    }
    Ok(data)
}

async fn get_singleton(
    headers: &HeaderMap,
    pool: &PgPool,
    auth_state: &AuthState,
    collection: &str,
    permission: Option<&str>,
) -> Result<Json<Value>, AuthError> {
    let claims = require_auth(headers, auth_state)?;
    if let Some(required) = permission {
        require_permission(&claims, required)?;
    }
    let document = with_read_retry(|| fetch_singleton(pool, collection)).await?;
    Ok(Json(document.unwrap_or_else(|| json!({}))))
}

async fn put_singleton(
    headers: &HeaderMap,
    pool: &PgPool,
    auth_state: &AuthState,
    collection: &str,
    permission: Option<&str>,
    payload: Option<Json<Value>>,
) -> Result<Json<Value>, AuthError> {
    let claims = require_auth(headers, auth_state)?;
    if let Some(required) = permission {
        require_permission(&claims, required)?;
    }
    let data = require_object(payload)?;
    let document = upsert_singleton(pool, collection, &data).await?;
    info!(collection, updated_by = %claims.username, "Content updated");
    Ok(Json(document))
}

#[utoipa::path(
    get,
    path = "/api/admin/profile",
    responses((status = 200, description = "Profile document", body = Value)),
    tag = "content"
)]
pub async fn get_profile(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<Json<Value>, AuthError> {
    get_singleton(
        &headers,
        &pool,
        &auth_state,
        storage::PROFILE,
        Some("profile:read"),
    )
    .await
}

#[utoipa::path(
    put,
    path = "/api/admin/profile",
    request_body = Value,
    responses((status = 200, description = "Updated profile", body = Value)),
    tag = "content"
)]
pub async fn put_profile(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<Value>>,
) -> Result<Json<Value>, AuthError> {
    put_singleton(
        &headers,
        &pool,
        &auth_state,
        storage::PROFILE,
        Some("profile:write"),
        payload,
    )
    .await
}

#[utoipa::path(
    get,
    path = "/api/admin/skills",
    responses((status = 200, description = "Skills document", body = Value)),
    tag = "content"
)]
pub async fn get_skills(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<Json<Value>, AuthError> {
    get_singleton(
        &headers,
        &pool,
        &auth_state,
        storage::SKILLS,
        Some("skills:read"),
    )
    .await
}

#[utoipa::path(
    put,
    path = "/api/admin/skills",
    request_body = Value,
    responses((status = 200, description = "Updated skills", body = Value)),
    tag = "content"
)]
pub async fn put_skills(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<Value>>,
) -> Result<Json<Value>, AuthError> {
    put_singleton(
        &headers,
        &pool,
        &auth_state,
        storage::SKILLS,
        Some("skills:write"),
        payload,
    )
    .await
}

#[utoipa::path(
    get,
    path = "/api/admin/contact",
    responses((status = 200, description = "Contact document", body = Value)),
    tag = "content"
)]
pub async fn get_contact(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<Json<Value>, AuthError> {
    get_singleton(
        &headers,
        &pool,
        &auth_state,
        storage::CONTACT,
        Some("contact:read"),
    )
    .await
}

#[utoipa::path(
    put,
    path = "/api/admin/contact",
    request_body = Value,
    responses((status = 200, description = "Updated contact", body = Value)),
    tag = "content"
)]
pub async fn put_contact(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<Value>>,
) -> Result<Json<Value>, AuthError> {
    put_singleton(
        &headers,
        &pool,
        &auth_state,
        storage::CONTACT,
        Some("contact:write"),
        payload,
    )
    .await
}

#[utoipa::path(
    get,
    path = "/api/admin/site-settings",
    responses((status = 200, description = "Site settings document", body = Value)),
    tag = "content"
)]
pub async fn get_site_settings(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<Json<Value>, AuthError> {
    get_singleton(&headers, &pool, &auth_state, storage::SITE_SETTINGS, None).await
}

#[utoipa::path(
    put,
    path = "/api/admin/site-settings",
    request_body = Value,
    responses((status = 200, description = "Updated site settings", body = Value)),
    tag = "content"
)]
pub async fn put_site_settings(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<Value>>,
) -> Result<Json<Value>, AuthError> {
    put_singleton(
        &headers,
        &pool,
        &auth_state,
        storage::SITE_SETTINGS,
        None,
        payload,
    )
    .await
}

#[utoipa::path(
    get,
    path = "/api/admin/projects",
    responses((status = 200, description = "All projects, drafts included", body = [Value])),
    tag = "content"
)]
pub async fn list_all_projects(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<Json<Vec<Value>>, AuthError> {
    let claims = require_auth(&headers, &auth_state)?;
    require_permission(&claims, "projects:read")?;

    let projects = with_read_retry(|| list_projects(&pool, false)).await?;
    Ok(Json(projects))
}

#[utoipa::path(
    get,
    path = "/api/admin/projects/{id}",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project", body = Value),
        (status = 404, description = "Unknown project", body = MessageResponse)
    ),
    tag = "content"
)]
pub async fn get_project(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, AuthError> {
    let claims = require_auth(&headers, &auth_state)?;
    require_permission(&claims, "projects:read")?;

    match with_read_retry(|| fetch_project(&pool, id)).await? {
        Some(document) => Ok(Json(document).into_response()),
        None => Ok(not_found("Project")),
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/projects",
    request_body = Value,
    responses(
        (status = 201, description = "Project created", body = Value),
        (status = 400, description = "Missing or malformed payload", body = MessageResponse)
    ),
    tag = "content"
)]
pub async fn create_project(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<Value>>,
) -> Result<Response, AuthError> {
    let claims = require_auth(&headers, &auth_state)?;
    require_permission(&claims, "projects:write")?;

    let mut data = require_object(payload)?;
    // New projects start as drafts unless the payload says otherwise.
    if let Value::Object(map) = &mut data {
        map.entry("isPublished").or_insert(Value::Bool(false));
    }

    let document = insert_project(&pool, &data).await?;
    info!(created_by = %claims.username, "Project created");
    Ok((StatusCode::CREATED, Json(document)).into_response())
}

#[utoipa::path(
    put,
    path = "/api/admin/projects/{id}",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = Value,
    responses(
        (status = 200, description = "Updated project", body = Value),
        (status = 404, description = "Unknown project", body = MessageResponse)
    ),
    tag = "content"
)]
pub async fn put_project(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Path(id): Path<Uuid>,
    payload: Option<Json<Value>>,
) -> Result<Response, AuthError> {
    let claims = require_auth(&headers, &auth_state)?;
    require_permission(&claims, "projects:write")?;

    let data = require_object(payload)?;
    match update_project(&pool, id, &data).await? {
        Some(document) => Ok(Json(document).into_response()),
        None => Ok(not_found("Project")),
    }
}

#[utoipa::path(
    delete,
    path = "/api/admin/projects/{id}",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project deleted", body = MessageResponse),
        (status = 404, description = "Unknown project", body = MessageResponse)
    ),
    tag = "content"
)]
pub async fn delete_project_handler(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, AuthError> {
    let claims = require_auth(&headers, &auth_state)?;
    require_permission(&claims, "projects:delete")?;

    if delete_project(&pool, id).await? {
        info!(%id, deleted_by = %claims.username, "Project deleted");
        Ok(Json(MessageResponse {
            message: "Project deleted".to_string(),
        })
        .into_response())
    } else {
        Ok(not_found("Project"))
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/projects/{id}/publish",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = Value,
    responses(
        (status = 200, description = "Project with updated publish state", body = Value),
        (status = 404, description = "Unknown project", body = MessageResponse)
    ),
    tag = "content"
)]
pub async fn publish_project(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Path(id): Path<Uuid>,
    payload: Option<Json<Value>>,
) -> Result<Response, AuthError> {
    let claims = require_auth(&headers, &auth_state)?;
    require_permission(&claims, "projects:publish")?;

    // Absent payload or flag means "publish"; an explicit false unpublishes.
    let published = payload
        .as_ref()
        .and_then(|Json(body)| body.get("isPublished"))
        .and_then(Value::as_bool)
        .unwrap_or(true);

    match set_published(&pool, id, published).await? {
        Some(document) => {
            info!(%id, published, changed_by = %claims.username, "Publish state changed");
            Ok(Json(document).into_response())
        }
        None => Ok(not_found("Project")),
    }
}
