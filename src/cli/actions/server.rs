use crate::{
    api,
    api::handlers::auth::{AuthConfig, AuthState},
    auth::token::TokenService,
    cli::actions::Action,
};
use anyhow::Result;
use std::sync::Arc;

/// Execute the server action.
///
/// The token service is constructed here so a missing or empty signing secret
/// fails startup instead of surfacing per-request.
///
/// # Errors
///
/// Returns an error if the signing secret is unusable or the server fails to
/// start.
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            jwt_secret,
            frontend_url,
        } => {
            let tokens = TokenService::new(&jwt_secret)?;
            let config = AuthConfig::new(frontend_url);
            let state = Arc::new(AuthState::new(config, tokens));

            api::new(port, dsn, state).await?;
        }
    }

    Ok(())
}
