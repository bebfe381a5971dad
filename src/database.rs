use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;

/// Пул соединений Postgres для `PgBookingStore`.
#[derive(Clone)]
pub struct Database {
    pub pool: Pool<Postgres>,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .connect(&config.url)
            .await?;

        info!("Booking database connected (pool size {})", config.pool_size);
        Ok(Database { pool })
    }

    /// Схема users/bookings.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Applying booking schema migrations...");
        sqlx::migrate!("./src/migrations").run(&self.pool).await?;
        info!("Booking schema is up to date");
        Ok(())
    }
}
