//! Route handlers for the public site and the admin surface.

pub mod auth;
pub mod content;
pub mod dashboard;
pub mod health;
pub mod users;
