use crate::config::DatabaseConfig;
use rocket::fairing::AdHoc;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

pub(crate) async fn init_pool(db_config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(db_config.max_connections)
        .min_connections(db_config.min_connections)
        .acquire_timeout(Duration::from_secs(db_config.acquire_timeout))
        .idle_timeout(Duration::from_secs(30))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&db_config.url)
        .await
}

async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Connects the pool, applies pending migrations when enabled, and manages the
/// pool as Rocket state. Ignition fails if either step fails.
pub fn stage_db(db_config: DatabaseConfig) -> AdHoc {
    AdHoc::try_on_ignite("Postgres (sqlx)", |rocket| async move {
        let pool = match init_pool(&db_config).await {
            Ok(pool) => pool,
            Err(e) => {
                tracing::error!(error = %e, "failed to initialize database pool");
                return Err(rocket);
            }
        };
        tracing::info!("database pool initialized");

        if db_config.run_migrations {
            if let Err(e) = run_migrations(&pool).await {
                tracing::error!(error = %e, "failed to apply migrations");
                return Err(rocket);
            }
            tracing::info!("migrations applied");
        }

        Ok(rocket.manage(pool))
    })
}
