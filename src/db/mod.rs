use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;

/// Type alias for the PostgreSQL connection pool
pub type DbPool = PgPool;

/// Creates a new database connection pool with the provided configuration
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    log::info!("Connecting to database {}:{}...", config.host, config.port);

    let mut options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.dbname)
        .username(&config.user)
        .password(&config.password);

    if let Some(sslmode) = config.sslmode {
        options = options.ssl_mode(sslmode);
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                // Set timezone to UTC for all connections
                sqlx::query("SET timezone = 'UTC'").execute(conn).await?;
                Ok(())
            })
        })
        .connect_with(options)
        .await?;

    log::info!(
        "Database connection pool established (max: {})",
        config.max_connections
    );

    Ok(pool)
}

/// Performs a health check on the database connection
pub async fn health_check(pool: &DbPool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}
