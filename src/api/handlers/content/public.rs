//! Public, unauthenticated reads of published site content.

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

use super::storage::{self, fetch_project, fetch_singleton, list_projects};
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

async fn singleton_or_empty(pool: &PgPool, collection: &str) -> Result<Json<Value>, AuthError> {
    let document = with_read_retry(|| fetch_singleton(pool, collection)).await?;
    Ok(Json(document.unwrap_or_else(|| json!({}))))
}

#[utoipa::path(
    get,
    path = "/api/profile",
    responses((status = 200, description = "Profile document", body = Value)),
    tag = "public"
)]
pub async fn profile(pool: Extension<PgPool>) -> Result<Json<Value>, AuthError> {
    singleton_or_empty(&pool, storage::PROFILE).await
}

#[utoipa::path(
    get,
    path = "/api/projects",
    responses((status = 200, description = "Published projects", body = [Value])),
    tag = "public"
)]
pub async fn projects(pool: Extension<PgPool>) -> Result<Json<Vec<Value>>, AuthError> {
    let projects = with_read_retry(|| list_projects(&pool, true)).await?;
    Ok(Json(projects))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Published project", body = Value),
        (status = 404, description = "Unknown or unpublished project", body = MessageResponse)
    ),
    tag = "public"
)]
pub async fn project(
    pool: Extension<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Response, AuthError> {
    let Some(document) = with_read_retry(|| fetch_project(&pool, id)).await? else {
        return Ok(not_found("Project"));
    };

    // Drafts stay invisible on the public surface.
    let published = document
        .get("isPublished")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !published {
        return Ok(not_found("Project"));
    }

    Ok(Json(document).into_response())
}

#[utoipa::path(
    get,
    path = "/api/skills",
    responses((status = 200, description = "Skills document", body = Value)),
    tag = "public"
)]
pub async fn skills(pool: Extension<PgPool>) -> Result<Json<Value>, AuthError> {
    singleton_or_empty(&pool, storage::SKILLS).await
}

#[utoipa::path(
    get,
    path = "/api/contact",
    responses((status = 200, description = "Contact document", body = Value)),
    tag = "public"
)]
pub async fn contact(pool: Extension<PgPool>) -> Result<Json<Value>, AuthError> {
    singleton_or_empty(&pool, storage::CONTACT).await
}

#[utoipa::path(
    get,
    path = "/api/site-settings",
    responses((status = 200, description = "Site settings document", body = Value)),
    tag = "public"
)]
pub async fn site_settings(pool: Extension<PgPool>) -> Result<Json<Value>, AuthError> {
    singleton_or_empty(&pool, storage::SITE_SETTINGS).await
}
