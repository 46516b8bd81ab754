use anyhow::Context;
use common::settings::{Settings, StorageBackendKind};
use common::storage::S3BlobBackend;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 30;
const RETRY_DELAY: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting setup...");

    let settings = Settings::new().context("Failed to load settings")?;

    let db = wait_for_db(&settings).await?;

    tracing::info!("Running migrations...");
    Migrator::up(&db, None).await?;
    tracing::info!("Migrations applied.");

    match settings.storage.backend {
        StorageBackendKind::S3 => setup_s3(&settings).await?,
        StorageBackendKind::Memory => {
            tracing::info!("Memory blob backend configured, skipping bucket setup")
        }
    }

    tracing::info!("Setup completed successfully!");
    Ok(())
}

async fn wait_for_db(settings: &Settings) -> anyhow::Result<DatabaseConnection> {
    let mut attempt = 1;
    loop {
        let mut options = ConnectOptions::new(settings.database.url.clone());
        options
            .max_connections(settings.database.max_connections)
            .connect_timeout(Duration::from_secs(settings.database.connect_timeout_seconds))
            .sqlx_logging(false);

        match Database::connect(options).await {
            Ok(db) => {
                tracing::info!("Database connected!");
                return Ok(db);
            }
            Err(e) => {
                if attempt >= MAX_ATTEMPTS {
                    return Err(anyhow::anyhow!(
                        "Failed to connect to DB after {} attempts: {}",
                        MAX_ATTEMPTS,
                        e
                    ));
                }
                tracing::warn!(
                    "Failed to connect to DB (attempt {}): {}. Retrying in 2s...",
                    attempt,
                    e
                );
                tokio::time::sleep(RETRY_DELAY).await;
                attempt += 1;
            }
        }
    }
}

async fn setup_s3(settings: &Settings) -> anyhow::Result<()> {
    let backend = S3BlobBackend::new(&settings.s3).await;
    tracing::info!("Setting up S3 (Bucket: {})...", backend.bucket());

    let mut attempt = 1;
    while let Err(e) = backend.ping().await {
        if attempt >= MAX_ATTEMPTS {
            return Err(e.context(format!(
                "Failed to reach S3 after {} attempts",
                MAX_ATTEMPTS
            )));
        }
        tracing::warn!("Waiting for S3 (attempt {})...", attempt);
        tokio::time::sleep(RETRY_DELAY).await;
        attempt += 1;
    }

    backend.ensure_bucket().await
}
