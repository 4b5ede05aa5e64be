//! Admin dashboard overview: content/account counts and recent activity.

use axum::{Json, extract::Extension, http::HeaderMap};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::ToSchema;

use super::auth::principal::require_auth;
use super::auth::state::AuthState;
use super::auth::storage::{AccountRecord, account_counts, recent_logins, with_read_retry};
use super::content::storage::{project_counts, recent_projects};
use crate::auth::error::AuthError;

const RECENT_LIMIT: i64 = 5;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectStats {
    pub total: i64,
    pub published: i64,
    pub draft: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserStats {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardCounts {
    pub projects: ProjectStats,
    pub users: UserStats,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentUser {
    pub username: String,
    pub display_name: String,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&AccountRecord> for RecentUser {
    fn from(record: &AccountRecord) -> Self {
        Self {
            username: record.username.clone(),
            display_name: record.display_name.clone(),
            last_login_at: record.last_login_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecentActivity {
    pub projects: Vec<Value>,
    pub users: Vec<RecentUser>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub stats: DashboardCounts,
    pub recent: RecentActivity,
}

fn build_counts(projects: (i64, i64), users: (i64, i64)) -> DashboardCounts {
    let (total_projects, published) = projects;
    let (total_users, active) = users;
    DashboardCounts {
        projects: ProjectStats {
            total: total_projects,
            published,
            draft: total_projects - published,
        },
        users: UserStats {
            total: total_users,
            active,
            inactive: total_users - active,
        },
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/dashboard/stats",
    responses(
        (status = 200, description = "Dashboard counts and recent activity", body = DashboardStats),
        (status = 401, description = "No valid session", body = super::auth::types::MessageResponse)
    ),
    tag = "content"
)]
pub async fn stats(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<Json<DashboardStats>, AuthError> {
    require_auth(&headers, &auth_state)?;

    let projects = with_read_retry(|| project_counts(&pool)).await?;
    let users = with_read_retry(|| account_counts(&pool)).await?;
    let latest_projects = with_read_retry(|| recent_projects(&pool, RECENT_LIMIT)).await?;
    let latest_users = with_read_retry(|| recent_logins(&pool, RECENT_LIMIT)).await?;

    Ok(Json(DashboardStats {
        stats: build_counts(projects, users),
        recent: RecentActivity {
            projects: latest_projects,
            users: latest_users.iter().map(RecentUser::from).collect(),
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_derive_draft_and_inactive() {
        let counts = build_counts((7, 4), (3, 2));
        assert_eq!(counts.projects.total, 7);
        assert_eq!(counts.projects.published, 4);
        assert_eq!(counts.projects.draft, 3);
        assert_eq!(counts.users.total, 3);
        assert_eq!(counts.users.active, 2);
        assert_eq!(counts.users.inactive, 1);
    }

    #[test]
    fn recent_user_omits_sensitive_fields() {
        let json = serde_json::to_value(RecentUser {
            username: "theo".to_string(),
            display_name: "Theo".to_string(),
            last_login_at: None,
        })
        .unwrap();
        assert_eq!(json["username"], "theo");
        assert_eq!(json["displayName"], "Theo");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("permissions").is_none());
    }
}
