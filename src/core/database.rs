use crate::core::config::DatabaseConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// Connect the metadata store pool
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!(
        "Connecting to database at {} (max_connections={})",
        redacted_url(&config.url),
        config.max_connections
    );

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .connect(&config.url)
        .await
}

/// Connection URL with credentials stripped, for logs
fn redacted_url(url: &str) -> &str {
    url.rsplit('@').next().unwrap_or("***")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_url_drops_credentials() {
        assert_eq!(
            redacted_url("postgres://user:pass@db:5432/tubely"),
            "db:5432/tubely"
        );
        assert_eq!(redacted_url("postgres://db/tubely"), "postgres://db/tubely");
    }
}
