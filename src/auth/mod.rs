//! Authentication and authorization core.
//!
//! Everything here is independent of the HTTP layer and the database:
//! credential hashing, token issue/verify, the lockout state machine, and
//! permission evaluation are pure or self-contained so they can be tested
//! without a running store.

pub mod error;
pub mod lockout;
pub mod password;
pub mod permission;
pub mod session;
pub mod token;

pub use error::AuthError;
pub use permission::{has_all_permissions, has_any_permission, has_permission, Role};
pub use token::{Claims, TokenService};
