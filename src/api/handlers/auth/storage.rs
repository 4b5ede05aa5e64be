//! Database helpers for admin accounts and lockout state.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use std::{future::Future, time::Duration};
use tracing::{warn, Instrument};
use uuid::Uuid;

use crate::auth::{lockout::LockoutUpdate, permission::Role};

/// Retries for idempotent reads only; the login/write path never retries.
const READ_RETRIES: u32 = 2;
const READ_RETRY_DELAY: Duration = Duration::from_millis(200);

const ACCOUNT_COLUMNS: &str = "id, username, email, display_name, password_hash, role, \
     permissions, is_active, login_attempts, locked_until, last_login_at, created_at, updated_at";

/// Full account row, including credential and lockout fields.
#[derive(Clone, Debug)]
pub(crate) struct AccountRecord {
    pub(crate) id: Uuid,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) display_name: String,
    pub(crate) password_hash: String,
    pub(crate) role: Role,
    pub(crate) permissions: Vec<String>,
    pub(crate) is_active: bool,
    pub(crate) login_attempts: i32,
    pub(crate) locked_until: Option<DateTime<Utc>>,
    pub(crate) last_login_at: Option<DateTime<Utc>>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

/// Outcome of account inserts/updates that may hit uniqueness constraints.
#[derive(Debug)]
pub(crate) enum WriteOutcome {
    Applied(AccountRecord),
    Conflict,
}

fn account_from_row(row: &PgRow) -> Result<AccountRecord> {
    let role_text: String = row.try_get("role")?;
    let role = Role::parse(&role_text)
        .ok_or_else(|| anyhow!("unknown role in store: {role_text}"))?;

    Ok(AccountRecord {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        display_name: row.try_get("display_name")?,
        password_hash: row.try_get("password_hash")?,
        role,
        permissions: row.try_get("permissions")?,
        is_active: row.try_get("is_active")?,
        login_attempts: row.try_get("login_attempts")?,
        locked_until: row.try_get("locked_until")?,
        last_login_at: row.try_get("last_login_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

/// Run an idempotent read, retrying transient failures with a short fixed
/// delay. Auth-decision errors never pass through here; only store faults do.
pub(crate) async fn with_read_retry<T, F, Fut>(mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err = None;
    for attempt in 0..=READ_RETRIES {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt < READ_RETRIES {
                    warn!(
                        "Store read failed, retrying ({}/{READ_RETRIES}): {err:#}",
                        attempt + 1
                    );
                    tokio::time::sleep(READ_RETRY_DELAY).await;
                }
                last_err = Some(err);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow!("store read failed")))
}

pub(crate) async fn lookup_account_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<AccountRecord>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM admin_users WHERE username = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT"
    );
    let row = sqlx::query(&query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup account by username")?;

    row.as_ref().map(account_from_row).transpose()
}

pub(crate) async fn lookup_account_by_id(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<AccountRecord>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM admin_users WHERE id = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT"
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup account by id")?;

    row.as_ref().map(account_from_row).transpose()
}

/// Persist lockout fields after a failed attempt. Concurrent attempts race
/// here with last-write-wins; the counter is an approximation, not exact.
pub(crate) async fn apply_lockout_update(
    pool: &PgPool,
    id: Uuid,
    update: &LockoutUpdate,
) -> Result<()> {
    let query = r"
        UPDATE admin_users
        SET login_attempts = $2, locked_until = $3, updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE"
    );
    sqlx::query(query)
        .bind(id)
        .bind(update.login_attempts)
        .bind(update.locked_until)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to persist lockout update")?;
    Ok(())
}

/// Reset lockout state and stamp the last successful login.
pub(crate) async fn record_login_success(pool: &PgPool, id: Uuid) -> Result<()> {
    let reset = crate::auth::lockout::record_success();
    let query = r"
        UPDATE admin_users
        SET login_attempts = $2,
            locked_until = $3,
            last_login_at = NOW(),
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE"
    );
    sqlx::query(query)
        .bind(id)
        .bind(reset.login_attempts)
        .bind(reset.locked_until)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to record login success")?;
    Ok(())
}

pub(crate) async fn list_accounts(pool: &PgPool) -> Result<Vec<AccountRecord>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM admin_users ORDER BY created_at");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT"
    );
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list accounts")?;

    rows.iter().map(account_from_row).collect()
}

/// Total and active account counts in one round trip.
pub(crate) async fn account_counts(pool: &PgPool) -> Result<(i64, i64)> {
    let query = r"
        SELECT COUNT(*) AS total,
               COUNT(*) FILTER (WHERE is_active) AS active
        FROM admin_users
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT"
    );
    let row = sqlx::query(query)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to count accounts")?;

    Ok((row.try_get("total")?, row.try_get("active")?))
}

/// Accounts that have logged in, most recent first.
pub(crate) async fn recent_logins(pool: &PgPool, limit: i64) -> Result<Vec<AccountRecord>> {
    let query = format!(
        "SELECT {ACCOUNT_COLUMNS} FROM admin_users \
         WHERE last_login_at IS NOT NULL \
         ORDER BY last_login_at DESC \
         LIMIT $1"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT"
    );
    let rows = sqlx::query(&query)
        .bind(limit)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list recent logins")?;

    rows.iter().map(account_from_row).collect()
}

pub(crate) struct NewAccount {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) display_name: String,
    pub(crate) password_hash: String,
    pub(crate) role: Role,
    pub(crate) permissions: Vec<String>,
}

pub(crate) async fn insert_account(pool: &PgPool, account: &NewAccount) -> Result<WriteOutcome> {
    let query = format!(
        "INSERT INTO admin_users (username, email, display_name, password_hash, role, permissions) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {ACCOUNT_COLUMNS}"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT"
    );
    let row = sqlx::query(&query)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.display_name)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(&account.permissions)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(WriteOutcome::Applied(account_from_row(&row)?)),
        Err(err) if is_unique_violation(&err) => Ok(WriteOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert account"),
    }
}

pub(crate) struct AccountChanges {
    pub(crate) email: String,
    pub(crate) display_name: String,
    pub(crate) role: Role,
    pub(crate) permissions: Vec<String>,
    pub(crate) is_active: bool,
}

pub(crate) async fn update_account(
    pool: &PgPool,
    id: Uuid,
    changes: &AccountChanges,
) -> Result<Option<WriteOutcome>> {
    let query = format!(
        "UPDATE admin_users \
         SET email = $2, display_name = $3, role = $4, permissions = $5, is_active = $6, \
             updated_at = NOW() \
         WHERE id = $1 RETURNING {ACCOUNT_COLUMNS}"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE"
    );
    let row = sqlx::query(&query)
        .bind(id)
        .bind(&changes.email)
        .bind(&changes.display_name)
        .bind(changes.role.as_str())
        .bind(&changes.permissions)
        .bind(changes.is_active)
        .fetch_optional(pool)
        .instrument(span)
        .await;

    match row {
        Ok(Some(row)) => Ok(Some(WriteOutcome::Applied(account_from_row(&row)?))),
        Ok(None) => Ok(None),
        Err(err) if is_unique_violation(&err) => Ok(Some(WriteOutcome::Conflict)),
        Err(err) => Err(err).context("failed to update account"),
    }
}

pub(crate) async fn delete_account(pool: &PgPool, id: Uuid) -> Result<bool> {
    let query = "DELETE FROM admin_users WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE"
    );
    let result = sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete account")?;
    Ok(result.rows_affected() > 0)
}

/// Replace the credential digest and clear lockout state in one write.
pub(crate) async fn set_password(pool: &PgPool, id: Uuid, password_hash: &str) -> Result<bool> {
    let query = r"
        UPDATE admin_users
        SET password_hash = $2,
            login_attempts = 0,
            locked_until = NULL,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE"
    );
    let result = sqlx::query(query)
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to set password")?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn read_retry_returns_first_success() -> Result<()> {
        let calls = AtomicU32::new(0);
        let value = with_read_retry(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, anyhow::Error>(42) }
        })
        .await?;
        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn read_retry_recovers_from_transient_failure() -> Result<()> {
        let calls = AtomicU32::new(0);
        let value = with_read_retry(|| {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(anyhow!("connection reset"))
                } else {
                    Ok(7)
                }
            }
        })
        .await?;
        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[tokio::test]
    async fn read_retry_gives_up_after_bounded_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_read_retry(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(anyhow!("still down")) }
        })
        .await;
        assert!(result.is_err());
        // initial attempt + READ_RETRIES retries
        assert_eq!(calls.load(Ordering::SeqCst), READ_RETRIES + 1);
    }
}
