use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::storage::AccountRecord;
use crate::auth::permission::Role;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Public view of an admin account. Never carries the credential digest.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub permissions: Vec<String>,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&AccountRecord> for AccountResponse {
    fn from(record: &AccountRecord) -> Self {
        Self {
            id: record.id,
            username: record.username.clone(),
            email: record.email.clone(),
            display_name: record.display_name.clone(),
            role: record.role,
            permissions: record.permissions.clone(),
            is_active: record.is_active,
            last_login_at: record.last_login_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: AccountResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_record() -> AccountRecord {
        AccountRecord {
            id: Uuid::new_v4(),
            username: "nadia".to_string(),
            email: "nadia@example.com".to_string(),
            display_name: "Nadia".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            role: Role::Editor,
            permissions: vec!["projects:read".to_string()],
            is_active: true,
            login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn account_response_omits_password_hash() {
        let record = sample_record();
        let json = serde_json::to_value(AccountResponse::from(&record)).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "nadia");
        assert_eq!(json["displayName"], "Nadia");
        assert_eq!(json["isActive"], true);
    }
}
