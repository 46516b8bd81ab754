use crate::settings::DatabaseSettings;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;

/// Builds the process-wide pool. The pool is lazy, so an unreachable database
/// does not fail startup; the first query surfaces the error instead.
pub async fn establish_connection(
    settings: &DatabaseSettings,
) -> Result<DatabaseConnection, DbErr> {
    let timeout = Duration::from_secs(settings.connect_timeout_seconds);
    let mut options = ConnectOptions::new(settings.url.clone());
    options
        .max_connections(settings.max_connections)
        .connect_timeout(timeout)
        .acquire_timeout(timeout)
        .connect_lazy(true)
        .sqlx_logging(false);

    Database::connect(options).await
}
