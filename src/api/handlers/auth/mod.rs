//! Admin authentication endpoints and shared session plumbing.

pub mod login;
pub mod me;
pub(crate) mod principal;
pub mod state;
pub(crate) mod storage;
pub mod types;

pub use state::{AuthConfig, AuthState};
