use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::errors::RepositoryError;

/// Creates the PostgreSQL pool backing `PgCandidateRepository`.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, RepositoryError> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect(database_url)
        .await?;

    info!(max_connections, "PostgreSQL connection pool established");
    Ok(pool)
}
