#![allow(dead_code)]

use anyhow::Result;
use bytes::Bytes;
use common::builders::{build_repositories, build_services, Repositories, Services};
use common::entities::products::ProductType;
use common::services::assets::Upload;
use common::services::catalog::{FileUpload, ProductDraft, ProductDto};
use common::settings::Settings;
use common::storage::MemoryBlobBackend;
use common::entities::product_files::FileType;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;

pub struct TestContext {
    pub db: Arc<DatabaseConnection>,
    pub repos: Repositories,
    pub services: Services,
    pub blobs: Arc<MemoryBlobBackend>,
}

/// One shared in-memory connection, so every query sees the same database.
pub async fn setup() -> Result<TestContext> {
    setup_with(Settings::default()).await
}

pub async fn setup_with(settings: Settings) -> Result<TestContext> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;

    let db = Arc::new(db);
    let blobs = Arc::new(MemoryBlobBackend::new());
    let repos = build_repositories(db.clone());
    let services = build_services(&repos, blobs.clone(), &settings);

    Ok(TestContext {
        db,
        repos,
        services,
        blobs,
    })
}

pub fn draft(title: &str, categories: &[&str]) -> ProductDraft {
    ProductDraft {
        title: title.to_string(),
        description: format!("{} description", title),
        license: Some("MIT".to_string()),
        product_type: ProductType::Project,
        version: "1.0.0".to_string(),
        price_cents: None,
        tags: vec!["game".to_string()],
        categories: categories.iter().map(|c| c.to_string()).collect(),
    }
}

pub fn upload(filename: &str, content_type: &str, data: &'static [u8]) -> Upload {
    Upload::new(Bytes::from_static(data), filename, content_type)
}

pub fn main_file() -> FileUpload {
    FileUpload {
        file_type: FileType::Main,
        upload: upload("game.zip", "application/zip", b"PK\x03\x04 game"),
    }
}

/// Submits a product with one main file as `user_id`.
pub async fn submit(
    ctx: &TestContext,
    user_id: i64,
    draft: ProductDraft,
) -> Result<ProductDto> {
    Ok(ctx
        .services
        .catalog_service
        .submit(user_id, draft, None, None, vec![main_file()])
        .await?)
}

pub async fn approve(ctx: &TestContext, product_id: uuid::Uuid) -> Result<()> {
    ctx.services
        .moderation_service
        .transition(product_id, 900, "approved", "looks good")
        .await?;
    Ok(())
}

/// Keeps created_at values distinct between consecutive inserts.
pub async fn tick() {
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
}
