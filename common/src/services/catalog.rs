use super::assets::{remove_orphans, AssetService, StoredAsset, Upload};
use super::ServiceError;
use crate::domain::listing::{page_window, ProductFilter, SortKey};
use crate::domain::tags::split_tags;
use crate::domain::visibility::{can_view, Viewer};
use crate::entities::assets::Bucket;
use crate::entities::product_files::{FileType, ScanStatus};
use crate::entities::products::{self, ProductStatus, ProductType};
use crate::entities::{licenses, product_files};
use crate::repositories::developers::DeveloperRepository;
use crate::repositories::products::{
    NewProduct, NewProductFile, ProductRecord, ProductRepository, ProductUpdate, StoredFile,
};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

pub const RELATED_LIMIT: u64 = 4;

#[derive(Debug, Clone, Serialize)]
pub struct ProductDto {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub developer_id: Uuid,
    pub license: Option<String>,
    pub product_type: ProductType,
    pub version: String,
    pub price_cents: Option<i64>,
    pub is_free: bool,
    pub status: ProductStatus,
    pub download_count: i64,
    pub rating: f64,
    pub review_count: i32,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub thumbnail_asset_id: Option<Uuid>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl ProductDto {
    pub fn from_model(product: products::Model, categories: Vec<String>) -> Self {
        Self {
            tags: split_tags(&product.tags),
            id: product.id,
            title: product.title,
            description: product.description,
            developer_id: product.developer_id,
            license: product.license,
            product_type: product.product_type,
            version: product.version,
            price_cents: product.price_cents,
            is_free: product.is_free,
            status: product.status,
            download_count: product.download_count,
            rating: product.rating,
            review_count: product.review_count,
            categories,
            thumbnail_asset_id: product.thumbnail_asset_id,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

impl From<ProductRecord> for ProductDto {
    fn from(record: ProductRecord) -> Self {
        Self::from_model(record.product, record.categories)
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedProductsResponse {
    pub items: Vec<ProductDto>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub has_next: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ListProductsParams {
    pub filter: ProductFilter,
    pub sort: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Submitted product fields. Files travel separately.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub title: String,
    pub description: String,
    pub license: Option<String>,
    pub product_type: ProductType,
    pub version: String,
    pub price_cents: Option<i64>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_type: FileType,
    pub upload: Upload,
}

#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Stores every upload and creates the product. When any step fails the
    /// blobs written so far are removed again.
    async fn submit(
        &self,
        user_id: i64,
        draft: ProductDraft,
        thumbnail: Option<Upload>,
        license_file: Option<Upload>,
        files: Vec<FileUpload>,
    ) -> Result<ProductDto, ServiceError>;

    async fn get(&self, id: Uuid, status: Option<ProductStatus>)
        -> Result<ProductDto, ServiceError>;

    /// Public, owner and staff viewers may see the product. Everyone else
    /// gets `NotFound`.
    async fn get_visible(&self, id: Uuid, viewer: &Viewer) -> Result<ProductDto, ServiceError>;

    async fn list(
        &self,
        params: ListProductsParams,
    ) -> Result<PaginatedProductsResponse, ServiceError>;

    async fn count(&self, filter: &ProductFilter) -> Result<u64, ServiceError>;

    async fn update(
        &self,
        user_id: i64,
        id: Uuid,
        update: ProductUpdate,
    ) -> Result<ProductDto, ServiceError>;

    async fn related_to(
        &self,
        category: &str,
        exclude_id: Uuid,
        limit: u64,
    ) -> Result<Vec<ProductDto>, ServiceError>;

    /// Related products share the first category of `id`.
    async fn related(&self, id: Uuid, limit: u64) -> Result<Vec<ProductDto>, ServiceError>;

    async fn files_for(&self, id: Uuid) -> Result<Vec<product_files::Model>, ServiceError>;

    async fn license_for(&self, id: Uuid) -> Result<Option<licenses::Model>, ServiceError>;

    async fn record_scan(
        &self,
        file_id: Uuid,
        status: ScanStatus,
        results: serde_json::Value,
    ) -> Result<(), ServiceError>;

    /// Staff removal. Rows go in one transaction, blobs afterwards.
    async fn delete(&self, id: Uuid) -> Result<(), ServiceError>;

    async fn increment_download_count(&self, id: Uuid) -> Result<(), ServiceError>;

    /// Raw atomic +1 on `review_count`. Review flows go through the rating
    /// aggregator instead, whose next recompute overwrites this value with the
    /// count derived from the stored reviews.
    async fn increment_review_count(&self, id: Uuid) -> Result<(), ServiceError>;
}

pub struct CatalogServiceImpl {
    product_repo: Arc<dyn ProductRepository>,
    developer_repo: Arc<dyn DeveloperRepository>,
    assets: Arc<dyn AssetService>,
}

impl CatalogServiceImpl {
    pub fn new(
        product_repo: Arc<dyn ProductRepository>,
        developer_repo: Arc<dyn DeveloperRepository>,
        assets: Arc<dyn AssetService>,
    ) -> Self {
        Self {
            product_repo,
            developer_repo,
            assets,
        }
    }

    async fn with_categories(
        &self,
        items: Vec<products::Model>,
    ) -> Result<Vec<ProductDto>, ServiceError> {
        let ids = items.iter().map(|p| p.id).collect::<Vec<_>>();
        let mut categories = self.product_repo.categories_for(&ids).await?;
        Ok(items
            .into_iter()
            .map(|p| {
                let names = categories.remove(&p.id).unwrap_or_default();
                ProductDto::from_model(p, names)
            })
            .collect())
    }

    async fn to_dto(&self, product: products::Model) -> Result<ProductDto, ServiceError> {
        let mut items = self.with_categories(vec![product]).await?;
        items
            .pop()
            .ok_or_else(|| ServiceError::Internal("product vanished while loading".to_string()))
    }

    async fn store_all(
        &self,
        draft: ProductDraft,
        developer_id: Uuid,
        thumbnail: Option<Upload>,
        license_file: Option<Upload>,
        files: Vec<FileUpload>,
        stored: &mut Vec<(Uuid, Bucket)>,
    ) -> Result<ProductRecord, ServiceError> {
        let mut thumbnail_asset_id = None;
        if let Some(upload) = thumbnail {
            let asset = self.assets.store(upload, Bucket::Thumbnails, None).await?;
            stored.push((asset.id, asset.bucket));
            thumbnail_asset_id = Some(asset.id);
        }

        let mut license_row = None;
        if let Some(upload) = license_file {
            let asset = self.assets.store(upload, Bucket::License, None).await?;
            stored.push((asset.id, asset.bucket));
            license_row = Some(stored_file(asset));
        }

        let mut file_rows = Vec::with_capacity(files.len());
        for file in files {
            let asset = self
                .assets
                .store(file.upload, file.file_type.bucket(), None)
                .await?;
            stored.push((asset.id, asset.bucket));
            file_rows.push(NewProductFile {
                file_type: file.file_type,
                file: stored_file(asset),
            });
        }

        Ok(self
            .product_repo
            .create(NewProduct {
                title: draft.title,
                description: draft.description,
                developer_id,
                license: draft.license,
                product_type: draft.product_type,
                version: draft.version,
                price_cents: draft.price_cents,
                tags: draft.tags,
                categories: draft.categories,
                thumbnail_asset_id,
                files: file_rows,
                license_file: license_row,
            })
            .await?)
    }
}

fn stored_file(asset: StoredAsset) -> StoredFile {
    StoredFile {
        asset_id: asset.id,
        bucket: asset.bucket,
        filename: asset.filename,
        size: asset.size,
        checksum: asset.checksum,
        content_type: asset.content_type,
    }
}

fn validate_draft(draft: &ProductDraft) -> Result<(), ServiceError> {
    if draft.title.trim().is_empty() {
        return Err(ServiceError::validation(
            super::ValidationKind::InvalidField,
            "title must not be blank",
        ));
    }
    if draft.price_cents.is_some_and(|p| p < 0) {
        return Err(ServiceError::validation(
            super::ValidationKind::InvalidField,
            "price must not be negative",
        ));
    }
    Ok(())
}

#[async_trait]
impl CatalogService for CatalogServiceImpl {
    async fn submit(
        &self,
        user_id: i64,
        draft: ProductDraft,
        thumbnail: Option<Upload>,
        license_file: Option<Upload>,
        files: Vec<FileUpload>,
    ) -> Result<ProductDto, ServiceError> {
        validate_draft(&draft)?;

        let developer = self.developer_repo.get_or_create(user_id).await?;

        // Reject bad uploads before any blob is written.
        for upload in thumbnail
            .iter()
            .chain(license_file.iter())
            .chain(files.iter().map(|f| &f.upload))
        {
            upload.validate()?;
        }

        let mut stored = Vec::new();
        let result = self
            .store_all(
                draft,
                developer.id,
                thumbnail,
                license_file,
                files,
                &mut stored,
            )
            .await;

        match result {
            Ok(record) => {
                tracing::info!(
                    product_id = %record.product.id,
                    developer_id = %developer.id,
                    assets = stored.len(),
                    "Submitted product"
                );
                Ok(record.into())
            }
            Err(err) => {
                tracing::warn!(user_id, assets = stored.len(), error = %err, "Submission failed, removing stored assets");
                for (asset_id, bucket) in stored {
                    if let Err(cleanup) = self.assets.remove(asset_id, bucket).await {
                        tracing::error!(%asset_id, %bucket, error = %cleanup, "Failed to remove asset");
                    }
                }
                Err(err)
            }
        }
    }

    async fn get(
        &self,
        id: Uuid,
        status: Option<ProductStatus>,
    ) -> Result<ProductDto, ServiceError> {
        let product = self
            .product_repo
            .get(id, status)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("product {}", id)))?;
        self.to_dto(product).await
    }

    async fn get_visible(&self, id: Uuid, viewer: &Viewer) -> Result<ProductDto, ServiceError> {
        let product = self
            .product_repo
            .get(id, None)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("product {}", id)))?;

        let developer_id = match viewer.user_id {
            Some(user_id) => self
                .developer_repo
                .find_by_user(user_id)
                .await?
                .map(|d| d.id),
            None => None,
        };

        if !can_view(&product, viewer, developer_id) {
            return Err(ServiceError::not_found(format!("product {}", id)));
        }
        self.to_dto(product).await
    }

    async fn list(
        &self,
        params: ListProductsParams,
    ) -> Result<PaginatedProductsResponse, ServiceError> {
        let (offset, limit) = page_window(params.page, params.per_page);
        let sort = SortKey::parse(params.sort.as_deref());

        let total = self.product_repo.count(&params.filter).await?;
        let items = if offset >= total {
            Vec::new()
        } else {
            let items = self
                .product_repo
                .find(&params.filter, sort, offset, limit)
                .await?;
            self.with_categories(items).await?
        };

        Ok(PaginatedProductsResponse {
            has_next: offset.saturating_add(items.len() as u64) < total,
            items,
            total,
            page: offset / limit + 1,
            per_page: limit,
        })
    }

    async fn count(&self, filter: &ProductFilter) -> Result<u64, ServiceError> {
        Ok(self.product_repo.count(filter).await?)
    }

    async fn update(
        &self,
        user_id: i64,
        id: Uuid,
        update: ProductUpdate,
    ) -> Result<ProductDto, ServiceError> {
        let product = self
            .product_repo
            .get(id, None)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("product {}", id)))?;

        let developer = self.developer_repo.find_by_user(user_id).await?;
        if developer.map(|d| d.id) != Some(product.developer_id) {
            return Err(ServiceError::Forbidden(format!(
                "user {} does not own product {}",
                user_id, id
            )));
        }

        if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ServiceError::validation(
                super::ValidationKind::InvalidField,
                "title must not be blank",
            ));
        }
        if update
            .price_cents
            .is_some_and(|p| p.is_some_and(|p| p < 0))
        {
            return Err(ServiceError::validation(
                super::ValidationKind::InvalidField,
                "price must not be negative",
            ));
        }

        let record = self.product_repo.update(id, update).await?;
        tracing::info!(product_id = %id, revision = record.product.revision, "Updated product");
        Ok(record.into())
    }

    async fn related_to(
        &self,
        category: &str,
        exclude_id: Uuid,
        limit: u64,
    ) -> Result<Vec<ProductDto>, ServiceError> {
        let items = self
            .product_repo
            .related_to(category, exclude_id, limit)
            .await?;
        self.with_categories(items).await
    }

    async fn related(&self, id: Uuid, limit: u64) -> Result<Vec<ProductDto>, ServiceError> {
        let product = self.get(id, None).await?;
        match product.categories.first() {
            Some(category) => self.related_to(category, id, limit).await,
            None => Ok(Vec::new()),
        }
    }

    async fn files_for(&self, id: Uuid) -> Result<Vec<product_files::Model>, ServiceError> {
        Ok(self.product_repo.files_for(id).await?)
    }

    async fn license_for(&self, id: Uuid) -> Result<Option<licenses::Model>, ServiceError> {
        Ok(self.product_repo.license_for(id).await?)
    }

    async fn record_scan(
        &self,
        file_id: Uuid,
        status: ScanStatus,
        results: serde_json::Value,
    ) -> Result<(), ServiceError> {
        self.product_repo
            .record_scan(file_id, status, results)
            .await?;
        tracing::info!(%file_id, ?status, "Recorded scan result");
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let blobs = self.product_repo.delete(id).await?;
        remove_orphans(self.assets.as_ref(), &blobs).await;
        tracing::info!(product_id = %id, blobs = blobs.len(), "Deleted product");
        Ok(())
    }

    async fn increment_download_count(&self, id: Uuid) -> Result<(), ServiceError> {
        Ok(self.product_repo.increment_download_count(id).await?)
    }

    async fn increment_review_count(&self, id: Uuid) -> Result<(), ServiceError> {
        Ok(self.product_repo.increment_review_count(id).await?)
    }
}
