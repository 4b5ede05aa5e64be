//! Permission strings and wildcard evaluation.
//!
//! A permission is `resource:action` (for example `projects:read`). A granted
//! set satisfies a requirement when it holds `*`, the exact string, or the
//! resource wildcard `resource:*`. The resource is everything before the
//! first `:`; for a requirement without a colon the whole string acts as the
//! resource, so `admin` is also satisfied by `admin:*`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Universal wildcard granting every permission.
pub const WILDCARD: &str = "*";

/// Fixed admin roles. The role only seeds the default permission list at
/// account creation; authorization always evaluates the explicit list.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Editor,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Editor => "editor",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "super_admin" => Some(Self::SuperAdmin),
            "admin" => Some(Self::Admin),
            "editor" => Some(Self::Editor),
            _ => None,
        }
    }

    /// Default permission set granted when an account is created without an
    /// explicit list.
    #[must_use]
    pub fn default_permissions(self) -> Vec<String> {
        let permissions: &[&str] = match self {
            Self::SuperAdmin => &[WILDCARD],
            Self::Admin => &[
                "profile:read",
                "profile:write",
                "projects:read",
                "projects:write",
                "projects:delete",
                "projects:publish",
                "skills:read",
                "skills:write",
                "skills:delete",
                "contact:read",
                "contact:write",
                "users:read",
                "users:write",
            ],
            Self::Editor => &[
                "profile:read",
                "profile:write",
                "projects:read",
                "projects:write",
                "skills:read",
                "skills:write",
                "contact:read",
                "contact:write",
            ],
        };
        permissions.iter().map(ToString::to_string).collect()
    }
}

/// True when `granted` satisfies `required` directly or via a wildcard.
#[must_use]
pub fn has_permission(granted: &[String], required: &str) -> bool {
    if granted.iter().any(|p| p == WILDCARD || p == required) {
        return true;
    }

    let resource = required.split(':').next().unwrap_or(required);
    let resource_wildcard = format!("{resource}:*");
    granted.iter().any(|p| *p == resource_wildcard)
}

/// True when every requirement is satisfied.
#[must_use]
pub fn has_all_permissions(granted: &[String], required: &[&str]) -> bool {
    required.iter().all(|r| has_permission(granted, r))
}

/// True when at least one requirement is satisfied.
#[must_use]
pub fn has_any_permission(granted: &[String], required: &[&str]) -> bool {
    required.iter().any(|r| has_permission(granted, r))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn universal_wildcard_grants_everything() {
        let granted = set(&["*"]);
        assert!(has_permission(&granted, "projects:read"));
        assert!(has_permission(&granted, "users:delete"));
        assert!(has_permission(&granted, "anything"));
    }

    #[test]
    fn exact_match_grants() {
        let granted = set(&["projects:read"]);
        assert!(has_permission(&granted, "projects:read"));
        assert!(!has_permission(&granted, "projects:write"));
    }

    #[test]
    fn resource_wildcard_scoped_to_resource() {
        let granted = set(&["projects:*"]);
        assert!(has_permission(&granted, "projects:read"));
        assert!(has_permission(&granted, "projects:write"));
        assert!(!has_permission(&granted, "users:read"));
    }

    #[test]
    fn empty_set_grants_nothing() {
        assert!(!has_permission(&[], "projects:read"));
    }

    #[test]
    fn requirement_without_colon_uses_whole_string_as_resource() {
        // Pinned behavior: "admin" is satisfied by "admin:*" or "admin" itself.
        assert!(has_permission(&set(&["admin:*"]), "admin"));
        assert!(has_permission(&set(&["admin"]), "admin"));
        assert!(!has_permission(&set(&["admin:read"]), "admin"));
    }

    #[test]
    fn all_and_any_fold_correctly() {
        let granted = set(&["projects:*", "skills:read"]);
        assert!(has_all_permissions(
            &granted,
            &["projects:read", "skills:read"]
        ));
        assert!(!has_all_permissions(
            &granted,
            &["projects:read", "users:read"]
        ));
        assert!(has_any_permission(
            &granted,
            &["users:read", "projects:write"]
        ));
        assert!(!has_any_permission(&granted, &["users:read", "users:write"]));
        assert!(!has_any_permission(&granted, &[]));
        assert!(has_all_permissions(&granted, &[]));
    }

    #[test]
    fn role_defaults_match_table() {
        assert_eq!(Role::SuperAdmin.default_permissions(), vec!["*"]);
        let admin = Role::Admin.default_permissions();
        assert!(admin.contains(&"users:write".to_string()));
        assert!(!admin.contains(&"users:delete".to_string()));
        let editor = Role::Editor.default_permissions();
        assert!(editor.contains(&"projects:write".to_string()));
        assert!(!editor.contains(&"projects:delete".to_string()));
        assert!(!editor.contains(&"users:read".to_string()));
    }

    #[test]
    fn role_parse_round_trips() {
        for role in [Role::SuperAdmin, Role::Admin, Role::Editor] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("owner"), None);
    }
}
