use config::Config;
use log::info;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tokio::time::Duration;

pub mod config;
pub mod logging;

/// PostgreSQL schema holding every table this service owns.
pub const DATABASE_SCHEMA: &str = "notify_hub";

pub async fn init_database(config: &Config) -> Result<DatabaseConnection, DbErr> {
    info!(
        "Database pool config: max_connections={}, min_connections={}, \
         connect_timeout={}s, acquire_timeout={}s, idle_timeout={}s, max_lifetime={}s",
        config.db_max_connections,
        config.db_min_connections,
        config.db_connect_timeout_secs,
        config.db_acquire_timeout_secs,
        config.db_idle_timeout_secs,
        config.db_max_lifetime_secs,
    );

    let mut opt = ConnectOptions::new::<&str>(config.database_url());
    opt.max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .connect_timeout(Duration::from_secs(config.db_connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime_secs))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug)
        .set_schema_search_path(DATABASE_SCHEMA);

    let db = Database::connect(opt).await?;

    // Every pooled connection searches this schema, so it has to exist before
    // anything (including the migration ledger) is created.
    db.execute_unprepared(&format!("CREATE SCHEMA IF NOT EXISTS {DATABASE_SCHEMA};"))
        .await?;

    Ok(db)
}
