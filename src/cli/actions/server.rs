use crate::cli::actions::Action;
use crate::credo::new;
use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use url::Url;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server { port, dsn } => {
            // Fail early on a malformed DSN instead of inside the pool
            let parsed = Url::parse(dsn.expose_secret()).context("Invalid database DSN")?;

            anyhow::ensure!(
                matches!(parsed.scheme(), "postgres" | "postgresql"),
                "Unsupported DSN scheme: {}",
                parsed.scheme()
            );

            new(port, &dsn).await?;
        }
    }

    Ok(())
}
