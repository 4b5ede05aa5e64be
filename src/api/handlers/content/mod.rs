//! Portfolio content endpoints, public and admin.

pub mod admin;
pub mod public;
pub(crate) mod storage;
