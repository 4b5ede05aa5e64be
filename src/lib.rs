//! # Vitrina (Portfolio content API & admin backend)
//!
//! `vitrina` serves public portfolio content (profile, projects, skills,
//! contact, site settings) from a document-style Postgres store and exposes an
//! authenticated admin area for managing that content.
//!
//! ## Authentication
//!
//! Admin sessions are stateless JWTs (HS256) carried in the `admin_token`
//! cookie, with a bearer-header fallback. Credentials are Argon2id hashes.
//! Repeated login failures lock the account for a fixed window:
//!
//! - **Attempt Limit:** 5 consecutive failures per account.
//! - **Lock Window:** 15 minutes; failed attempts while locked do not
//!   increment the counter, and an expired lock does not reset it.
//!
//! ## Authorization
//!
//! Each account carries a list of `resource:action` permission strings.
//! `*` grants everything; `resource:*` grants every action on one resource.
//! Roles (`super_admin`, `admin`, `editor`) only provide defaults at account
//! creation; the explicit list on the account is what gets evaluated.

pub mod api;
pub mod auth;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn git_commit_hash_is_hex_or_unknown() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(GIT_COMMIT_HASH.len() >= 7);
    }
}
