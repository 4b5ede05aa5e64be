//! Database helpers for the jsonb-backed content collections.
//!
//! Profile, skills, contact, and site settings are singleton documents keyed
//! by collection name; projects are a list within one collection.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

pub(crate) const PROFILE: &str = "profile";
pub(crate) const PROJECTS: &str = "projects";
pub(crate) const SKILLS: &str = "skills";
pub(crate) const CONTACT: &str = "contact";
pub(crate) const SITE_SETTINGS: &str = "site_settings";

/// Merge the row's identity and timestamps into the stored payload so
/// clients see one flat document.
fn document_json(row: &PgRow) -> Result<Value> {
    let id: Uuid = row.try_get("id")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;
    let mut data: Value = row.try_get("data")?;

    if let Value::Object(map) = &mut data {
        map.insert("id".to_string(), Value::String(id.to_string()));
        map.insert(
            "createdAt".to_string(),
            Value::String(created_at.to_rfc3339()),
        );
        map.insert(
            "updatedAt".to_string(),
            Value::String(updated_at.to_rfc3339()),
        );
    }
    Ok(data)
}

pub(crate) async fn fetch_singleton(pool: &PgPool, collection: &str) -> Result<Option<Value>> {
    let query = r"
        SELECT id, data, created_at, updated_at FROM documents
        WHERE collection = $1
        ORDER BY created_at
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT"
    );
    let row = sqlx::query(query)
        .bind(collection)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .with_context(|| format!("failed to fetch {collection} document"))?;

    row.as_ref().map(document_json).transpose()
}

/// Insert or replace the single document of a collection.
pub(crate) async fn upsert_singleton(
    pool: &PgPool,
    collection: &str,
    data: &Value,
) -> Result<Value> {
    let query = r"
        WITH existing AS (
            SELECT id FROM documents WHERE collection = $1 ORDER BY created_at LIMIT 1
        ), updated AS (
            UPDATE documents SET data = $2, updated_at = NOW()
            WHERE id IN (SELECT id FROM existing)
            RETURNING id, data, created_at, updated_at
        ), inserted AS (
            INSERT INTO documents (collection, data)
            SELECT $1, $2 WHERE NOT EXISTS (SELECT 1 FROM existing)
            RETURNING id, data, created_at, updated_at
        )
        SELECT * FROM updated UNION ALL SELECT * FROM inserted
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPSERT"
    );
    let row = sqlx::query(query)
        .bind(collection)
        .bind(data)
        .fetch_one(pool)
        .instrument(span)
        .await
        .with_context(|| format!("failed to upsert {collection} document"))?;

    document_json(&row)
}

/// Projects ordered by the client-assigned position, newest first on ties.
pub(crate) async fn list_projects(pool: &PgPool, published_only: bool) -> Result<Vec<Value>> {
    let filter = if published_only {
        "AND COALESCE((data->>'isPublished')::boolean, FALSE)"
    } else {
        ""
    };
    let query = format!(
        "SELECT id, data, created_at, updated_at FROM documents \
         WHERE collection = $1 {filter} \
         ORDER BY COALESCE((data->>'order')::int, 0), created_at DESC"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT"
    );
    let rows = sqlx::query(&query)
        .bind(PROJECTS)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list projects")?;

    rows.iter().map(document_json).collect()
}

pub(crate) async fn fetch_project(pool: &PgPool, id: Uuid) -> Result<Option<Value>> {
    let query = r"
        SELECT id, data, created_at, updated_at FROM documents
        WHERE collection = $1 AND id = $2
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT"
    );
    let row = sqlx::query(query)
        .bind(PROJECTS)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch project")?;

    row.as_ref().map(document_json).transpose()
}

pub(crate) async fn insert_project(pool: &PgPool, data: &Value) -> Result<Value> {
    let query = r"
        INSERT INTO documents (collection, data)
        VALUES ($1, $2)
        RETURNING id, data, created_at, updated_at
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT"
    );
    let row = sqlx::query(query)
        .bind(PROJECTS)
        .bind(data)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to insert project")?;

    document_json(&row)
}

pub(crate) async fn update_project(pool: &PgPool, id: Uuid, data: &Value) -> Result<Option<Value>> {
    let query = r"
        UPDATE documents SET data = $3, updated_at = NOW()
        WHERE collection = $1 AND id = $2
        RETURNING id, data, created_at, updated_at
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE"
    );
    let row = sqlx::query(query)
        .bind(PROJECTS)
        .bind(id)
        .bind(data)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to update project")?;

    row.as_ref().map(document_json).transpose()
}

pub(crate) async fn delete_project(pool: &PgPool, id: Uuid) -> Result<bool> {
    let query = "DELETE FROM documents WHERE collection = $1 AND id = $2";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE"
    );
    let result = sqlx::query(query)
        .bind(PROJECTS)
        .bind(id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete project")?;
    Ok(result.rows_affected() > 0)
}

/// Total and published project counts in one round trip.
pub(crate) async fn project_counts(pool: &PgPool) -> Result<(i64, i64)> {
    let query = r"
        SELECT COUNT(*) AS total,
               COUNT(*) FILTER (
                   WHERE COALESCE((data->>'isPublished')::boolean, FALSE)
               ) AS published
        FROM documents
        WHERE collection = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT"
    );
    let row = sqlx::query(query)
        .bind(PROJECTS)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to count projects")?;

    Ok((row.try_get("total")?, row.try_get("published")?))
}

/// Most recently touched projects, for the dashboard overview.
pub(crate) async fn recent_projects(pool: &PgPool, limit: i64) -> Result<Vec<Value>> {
    let query = r"
        SELECT id, data, created_at, updated_at FROM documents
        WHERE collection = $1
        ORDER BY updated_at DESC
        LIMIT $2
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT"
    );
    let rows = sqlx::query(query)
        .bind(PROJECTS)
        .bind(limit)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list recent projects")?;

    rows.iter().map(document_json).collect()
}

/// Flip the publish flag in place without rewriting the rest of the payload.
pub(crate) async fn set_published(
    pool: &PgPool,
    id: Uuid,
    published: bool,
) -> Result<Option<Value>> {
    let query = r"
        UPDATE documents
        SET data = jsonb_set(data, '{isPublished}', to_jsonb($3::boolean), TRUE),
            updated_at = NOW()
        WHERE collection = $1 AND id = $2
        RETURNING id, data, created_at, updated_at
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE"
    );
    let row = sqlx::query(query)
        .bind(PROJECTS)
        .bind(id)
        .bind(published)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to set publish state")?;

    row.as_ref().map(document_json).transpose()
}
