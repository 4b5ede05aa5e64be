//! Error taxonomy for the auth path.
//!
//! Expected auth outcomes (bad password, locked, disabled) are values, not
//! faults; only store connectivity rides the error channel. Responses keep
//! credential failures generic so the boundary never reveals whether the
//! handle or the password was wrong.

use axum::{
    http::{header::RETRY_AFTER, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown handle or wrong password; deliberately indistinguishable.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Account exists but is deactivated.
    #[error("Account is disabled")]
    AccountDisabled,

    /// Account is in its lock window.
    #[error("Account is locked, try again in {retry_after_seconds} seconds")]
    AccountLocked { retry_after_seconds: u64 },

    /// No token, or a token that failed verification.
    #[error("Authentication required")]
    Unauthorized,

    /// Valid token, insufficient permissions.
    #[error("Insufficient permissions")]
    Forbidden,

    /// Request rejected before any business logic ran.
    #[error("{0}")]
    MalformedRequest(String),

    /// Store round-trip failed; callers must not treat this as a logout.
    #[error("Store operation failed")]
    Store(#[from] anyhow::Error),
}

impl AuthError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::AccountDisabled | Self::AccountLocked { .. } | Self::Forbidden => {
                StatusCode::FORBIDDEN
            }
            Self::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            Self::AccountLocked {
                retry_after_seconds,
            } => {
                let mut headers = HeaderMap::new();
                if let Ok(value) = retry_after_seconds.to_string().parse() {
                    headers.insert(RETRY_AFTER, value);
                }
                (status, headers, self.to_string()).into_response()
            }
            Self::Store(err) => {
                // Log the detail here; the client only sees the class.
                error!("Store failure on auth path: {err:#}");
                (status, "Internal error".to_string()).into_response()
            }
            other => (status, other.to_string()).into_response(),
        }
    }
}
