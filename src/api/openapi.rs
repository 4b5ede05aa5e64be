//! `OpenAPI` document assembled from the `#[utoipa::path]` annotations.

use utoipa::OpenApi;
use utoipa::openapi::{Contact, InfoBuilder, License};

use super::handlers::{auth, content, dashboard, health, users};
use crate::auth::permission::Role;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        content::public::profile,
        content::public::projects,
        content::public::project,
        content::public::skills,
        content::public::contact,
        content::public::site_settings,
        auth::login::login,
        auth::login::logout,
        auth::me::me,
        content::admin::get_profile,
        content::admin::put_profile,
        content::admin::get_skills,
        content::admin::put_skills,
        content::admin::get_contact,
        content::admin::put_contact,
        content::admin::get_site_settings,
        content::admin::put_site_settings,
        content::admin::list_all_projects,
        content::admin::get_project,
        content::admin::create_project,
        content::admin::put_project,
        content::admin::delete_project_handler,
        content::admin::publish_project,
        dashboard::stats,
        users::list,
        users::get,
        users::create,
        users::update,
        users::delete,
        users::reset_password,
    ),
    components(schemas(
        health::Health,
        auth::types::LoginRequest,
        auth::types::LoginResponse,
        auth::types::AccountResponse,
        auth::types::MessageResponse,
        dashboard::DashboardStats,
        dashboard::DashboardCounts,
        dashboard::ProjectStats,
        dashboard::UserStats,
        dashboard::RecentActivity,
        dashboard::RecentUser,
        users::CreateUserRequest,
        users::UpdateUserRequest,
        users::ResetPasswordRequest,
        Role,
    )),
    tags(
        (name = "public", description = "Published portfolio content"),
        (name = "auth", description = "Admin session management"),
        (name = "content", description = "Content administration"),
        (name = "users", description = "Admin account administration"),
        (name = "health", description = "Service health")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info = cargo_info();
    doc
}

fn cargo_info() -> utoipa::openapi::Info {
    // Use Cargo.toml metadata instead of the derive defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();
    info
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `:` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(':').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    if let Some(start) = author.find('<') {
        let name = author[..start].trim();
        let email = author[start + 1..].trim_end_matches('>').trim();
        let name = if name.is_empty() { None } else { Some(name) };
        let email = if email.is_empty() { None } else { Some(email) };
        (name, email)
    } else {
        let name = author.trim();
        (if name.is_empty() { None } else { Some(name) }, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(
            spec.info.description.as_deref(),
            Some(env!("CARGO_PKG_DESCRIPTION"))
        );

        let contact = spec.info.contact.expect("contact expected");
        assert_eq!(contact.name.as_deref(), Some("Team Vitrina"));
        assert_eq!(contact.email.as_deref(), Some("team@vitrina.dev"));
    }

    #[test]
    fn parse_author_variants() {
        assert_eq!(
            parse_author("Jane Doe <jane@example.com>"),
            (Some("Jane Doe"), Some("jane@example.com"))
        );
        assert_eq!(parse_author("Jane Doe"), (Some("Jane Doe"), None));
        assert_eq!(
            parse_author("<jane@example.com>"),
            (None, Some("jane@example.com"))
        );
    }

    #[test]
    fn every_admin_route_documented() {
        let spec = openapi();
        for path in [
            "/api/admin/auth/login",
            "/api/admin/auth/logout",
            "/api/admin/auth/me",
            "/api/admin/users",
            "/api/admin/users/{id}",
            "/api/admin/projects/{id}/publish",
            "/api/admin/dashboard/stats",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
