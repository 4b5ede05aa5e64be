use crate::cli::{actions::Action, commands};
use anyhow::{anyhow, Result};
use secrecy::SecretString;

/// Turn parsed arguments into the action the binary executes.
///
/// # Errors
///
/// Returns an error if a required argument is missing (clap enforces this
/// before we get here, but the lookup is still fallible).
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    Ok(Action::Server {
        port: matches
            .get_one::<u16>(commands::ARG_PORT)
            .copied()
            .unwrap_or(8080),
        dsn: matches
            .get_one::<String>(commands::ARG_DSN)
            .cloned()
            .ok_or_else(|| anyhow!("missing required argument: --dsn"))?,
        jwt_secret: matches
            .get_one::<String>(commands::ARG_JWT_SECRET)
            .map(|s| SecretString::from(s.clone()))
            .ok_or_else(|| anyhow!("missing required argument: --jwt-secret"))?,
        frontend_url: matches
            .get_one::<String>(commands::ARG_FRONTEND_URL)
            .cloned()
            .ok_or_else(|| anyhow!("missing required argument: --frontend-url"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn handler_builds_server_action() -> Result<()> {
        temp_env::with_vars(
            [
                ("VITRINA_PORT", None::<&str>),
                ("VITRINA_DSN", None),
                ("VITRINA_JWT_SECRET", None),
                ("VITRINA_FRONTEND_URL", None),
                ("VITRINA_LOG_LEVEL", None),
            ],
            || {
                let matches = commands::new().try_get_matches_from(vec![
                    "vitrina",
                    "--port",
                    "9000",
                    "--dsn",
                    "postgres://localhost/vitrina",
                    "--jwt-secret",
                    "s3cret",
                ])?;

                let Action::Server {
                    port,
                    dsn,
                    jwt_secret,
                    frontend_url,
                } = handler(&matches)?;

                assert_eq!(port, 9000);
                assert_eq!(dsn, "postgres://localhost/vitrina");
                assert_eq!(jwt_secret.expose_secret(), "s3cret");
                assert_eq!(frontend_url, "http://localhost:3000");
                Ok(())
            },
        )
    }
}
