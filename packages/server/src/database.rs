use std::time::Duration;

use common::poll::{self, PollError};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use crate::config::DatabaseConfig;

/// Connect and bring the schema in line with the entities under `server::entity`.
pub async fn init_db(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(config.url.to_owned());

    // Set connection pool options
    opt.max_connections(config.max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("server::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

/// Block until the database accepts connections.
///
/// Retries every `wait_interval_secs`; `max_attempts = None` waits forever.
pub async fn wait_for_db(
    config: &DatabaseConfig,
    max_attempts: Option<u32>,
) -> Result<u32, PollError> {
    let url = config.url.as_str();
    poll::wait_for(
        "database",
        || async move {
            let db = Database::connect(url).await?;
            db.ping().await?;
            db.close().await
        },
        Duration::from_secs(config.wait_interval_secs),
        max_attempts,
    )
    .await
}
