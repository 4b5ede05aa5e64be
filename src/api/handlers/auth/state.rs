//! Auth configuration and shared state.

use crate::auth::token::TokenService;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_url: String,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_url: String) -> Self {
        Self { frontend_url }
    }

    #[must_use]
    pub fn frontend_url(&self) -> &str {
        &self.frontend_url
    }

    /// Only mark cookies secure when the frontend is served over HTTPS.
    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }
}

/// Explicitly constructed at startup and injected into handlers; there is no
/// ambient secret or connection lookup anywhere below this.
pub struct AuthState {
    config: AuthConfig,
    tokens: TokenService,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, tokens: TokenService) -> Self {
        Self { config, tokens }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use secrecy::SecretString;

    #[test]
    fn cookie_secure_follows_frontend_scheme() {
        assert!(AuthConfig::new("https://vitrina.dev".to_string()).cookie_secure());
        assert!(!AuthConfig::new("http://localhost:3000".to_string()).cookie_secure());
    }

    #[test]
    fn auth_state_exposes_parts() -> Result<()> {
        let tokens = TokenService::new(&SecretString::from("secret".to_string()))?;
        let state = AuthState::new(AuthConfig::new("https://vitrina.dev".to_string()), tokens);
        assert_eq!(state.config().frontend_url(), "https://vitrina.dev");
        assert!(state.tokens().verify("garbage").is_none());
        Ok(())
    }
}
