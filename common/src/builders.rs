use crate::repositories::{
    AssetRepository, AssetRepositoryImpl, CategoryRepository, CategoryRepositoryImpl,
    DeveloperRepository, DeveloperRepositoryImpl, DownloadRepository, DownloadRepositoryImpl,
    ModerationRepository, ModerationRepositoryImpl, ProductRepository, ProductRepositoryImpl,
    ReviewRepository, ReviewRepositoryImpl,
};
use crate::services::{
    assets::{AssetService, AssetServiceImpl},
    catalog::{CatalogService, CatalogServiceImpl},
    categories::{CategoryService, CategoryServiceImpl},
    developers::{DeveloperService, DeveloperServiceImpl},
    downloads::{DownloadService, DownloadServiceImpl},
    moderation::{ModerationService, ModerationServiceImpl},
    ratings::{RatingService, RatingServiceImpl},
};
use crate::settings::{Settings, StorageBackendKind};
use crate::storage::{BlobBackend, MemoryBlobBackend, S3BlobBackend};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

#[derive(Clone)]
pub struct Repositories {
    pub asset_repo: Arc<dyn AssetRepository>,
    pub category_repo: Arc<dyn CategoryRepository>,
    pub developer_repo: Arc<dyn DeveloperRepository>,
    pub download_repo: Arc<dyn DownloadRepository>,
    pub moderation_repo: Arc<dyn ModerationRepository>,
    pub product_repo: Arc<dyn ProductRepository>,
    pub review_repo: Arc<dyn ReviewRepository>,
}

#[derive(Clone)]
pub struct Services {
    pub asset_service: Arc<dyn AssetService>,
    pub catalog_service: Arc<dyn CatalogService>,
    pub category_service: Arc<dyn CategoryService>,
    pub developer_service: Arc<dyn DeveloperService>,
    pub download_service: Arc<dyn DownloadService>,
    pub moderation_service: Arc<dyn ModerationService>,
    pub rating_service: Arc<dyn RatingService>,
}

pub fn build_repositories(db: Arc<DatabaseConnection>) -> Repositories {
    Repositories {
        asset_repo: Arc::new(AssetRepositoryImpl::new(db.clone())),
        category_repo: Arc::new(CategoryRepositoryImpl::new(db.clone())),
        developer_repo: Arc::new(DeveloperRepositoryImpl::new(db.clone())),
        download_repo: Arc::new(DownloadRepositoryImpl::new(db.clone())),
        moderation_repo: Arc::new(ModerationRepositoryImpl::new(db.clone())),
        product_repo: Arc::new(ProductRepositoryImpl::new(db.clone())),
        review_repo: Arc::new(ReviewRepositoryImpl::new(db)),
    }
}

pub async fn build_blob_backend(settings: &Settings) -> Arc<dyn BlobBackend> {
    match settings.storage.backend {
        StorageBackendKind::S3 => Arc::new(S3BlobBackend::new(&settings.s3).await),
        StorageBackendKind::Memory => {
            tracing::warn!("Using in-memory blob storage; uploads are lost on restart");
            Arc::new(MemoryBlobBackend::new())
        }
    }
}

pub fn build_services(
    repos: &Repositories,
    backend: Arc<dyn BlobBackend>,
    settings: &Settings,
) -> Services {
    let asset_service: Arc<dyn AssetService> = Arc::new(AssetServiceImpl::new(
        repos.asset_repo.clone(),
        backend,
        settings.storage.compute_checksums,
    ));

    let catalog_service = Arc::new(CatalogServiceImpl::new(
        repos.product_repo.clone(),
        repos.developer_repo.clone(),
        asset_service.clone(),
    ));

    let developer_service = Arc::new(DeveloperServiceImpl::new(
        repos.developer_repo.clone(),
        repos.product_repo.clone(),
        asset_service.clone(),
    ));

    let download_service = Arc::new(DownloadServiceImpl::new(
        repos.download_repo.clone(),
        repos.product_repo.clone(),
    ));

    Services {
        asset_service,
        catalog_service,
        category_service: Arc::new(CategoryServiceImpl::new(repos.category_repo.clone())),
        developer_service,
        download_service,
        moderation_service: Arc::new(ModerationServiceImpl::new(repos.moderation_repo.clone())),
        rating_service: Arc::new(RatingServiceImpl::new(repos.review_repo.clone())),
    }
}

pub async fn build_all(
    db: Arc<DatabaseConnection>,
    settings: &Settings,
) -> (Repositories, Services) {
    let repos = build_repositories(db);
    let backend = build_blob_backend(settings).await;
    let services = build_services(&repos, backend, settings);
    (repos, services)
}
