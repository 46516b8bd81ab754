use super::assets::{remove_orphans, AssetService, Upload};
use super::catalog::ProductDto;
use super::ServiceError;
use crate::domain::listing::{ProductFilter, SortKey};
use crate::entities::assets::Bucket;
use crate::entities::developers;
use crate::entities::products::ProductStatus;
use crate::repositories::developers::{DeveloperRepository, ProfileUpdate};
use crate::repositories::products::ProductRepository;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct ProfileInput {
    pub company_name: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeveloperDashboard {
    pub developer: developers::Model,
    pub total_products: u64,
    pub total_downloads: i64,
    pub pending_products: u64,
}

/// A developer with their products, as seen by a given audience.
#[derive(Debug, Serialize)]
pub struct DeveloperProfile {
    pub developer: developers::Model,
    pub products: Vec<ProductDto>,
}

#[async_trait]
pub trait DeveloperService: Send + Sync {
    async fn get_or_create(&self, user_id: i64) -> Result<developers::Model, ServiceError>;

    /// Empty strings clear the optional fields. A new avatar replaces the
    /// previous one, which is removed afterwards.
    async fn update_profile(
        &self,
        user_id: i64,
        input: ProfileInput,
        avatar: Option<Upload>,
    ) -> Result<developers::Model, ServiceError>;

    /// Newest first. `status` narrows the list, `None` returns every product.
    async fn products_of(
        &self,
        developer_id: Uuid,
        status: Option<ProductStatus>,
    ) -> Result<Vec<ProductDto>, ServiceError>;

    async fn dashboard(&self, user_id: i64) -> Result<DeveloperDashboard, ServiceError>;

    /// Public pages pass `Some(Approved)`, staff views pass `None`.
    async fn profile(
        &self,
        developer_id: Uuid,
        status: Option<ProductStatus>,
    ) -> Result<DeveloperProfile, ServiceError>;

    async fn list(&self) -> Result<Vec<developers::Model>, ServiceError>;

    /// Removes the developer together with every product they own.
    async fn delete(&self, developer_id: Uuid) -> Result<(), ServiceError>;
}

pub struct DeveloperServiceImpl {
    developer_repo: Arc<dyn DeveloperRepository>,
    product_repo: Arc<dyn ProductRepository>,
    assets: Arc<dyn AssetService>,
}

impl DeveloperServiceImpl {
    pub fn new(
        developer_repo: Arc<dyn DeveloperRepository>,
        product_repo: Arc<dyn ProductRepository>,
        assets: Arc<dyn AssetService>,
    ) -> Self {
        Self {
            developer_repo,
            product_repo,
            assets,
        }
    }
}

fn optional(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| {
        let v = v.trim().to_string();
        (!v.is_empty()).then_some(v)
    })
}

#[async_trait]
impl DeveloperService for DeveloperServiceImpl {
    async fn get_or_create(&self, user_id: i64) -> Result<developers::Model, ServiceError> {
        Ok(self.developer_repo.get_or_create(user_id).await?)
    }

    async fn update_profile(
        &self,
        user_id: i64,
        input: ProfileInput,
        avatar: Option<Upload>,
    ) -> Result<developers::Model, ServiceError> {
        let current = self.developer_repo.get_or_create(user_id).await?;

        let new_avatar = match avatar {
            Some(upload) => Some(self.assets.store(upload, Bucket::Avatars, None).await?),
            None => None,
        };

        let update = ProfileUpdate {
            company_name: optional(input.company_name),
            bio: input.bio.map(|b| b.trim().to_string()),
            website: optional(input.website),
            avatar_asset_id: new_avatar.as_ref().map(|a| Some(a.id)),
        };

        let updated = match self.developer_repo.update_profile(user_id, update).await {
            Ok(updated) => updated,
            Err(err) => {
                if let Some(asset) = new_avatar {
                    if let Err(cleanup) = self.assets.remove(asset.id, Bucket::Avatars).await {
                        tracing::error!(asset_id = %asset.id, error = %cleanup, "Failed to remove avatar");
                    }
                }
                return Err(err.into());
            }
        };

        if new_avatar.is_some() {
            if let Some(previous) = current.avatar_asset_id {
                if let Err(err) = self.assets.remove(previous, Bucket::Avatars).await {
                    tracing::warn!(asset_id = %previous, error = %err, "Failed to remove replaced avatar");
                }
            }
        }

        tracing::info!(developer_id = %updated.id, user_id, "Updated developer profile");
        Ok(updated)
    }

    async fn products_of(
        &self,
        developer_id: Uuid,
        status: Option<ProductStatus>,
    ) -> Result<Vec<ProductDto>, ServiceError> {
        let filter = ProductFilter {
            developer_id: Some(developer_id),
            status,
            ..Default::default()
        };
        let total = self.product_repo.count(&filter).await?;
        let items = self
            .product_repo
            .find(&filter, SortKey::default(), 0, total)
            .await?;

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

    async fn dashboard(&self, user_id: i64) -> Result<DeveloperDashboard, ServiceError> {
        let developer = self.developer_repo.get_or_create(user_id).await?;
        let products = self.products_of(developer.id, None).await?;

        Ok(DeveloperDashboard {
            total_products: products.len() as u64,
            total_downloads: products.iter().map(|p| p.download_count).sum(),
            pending_products: products
                .iter()
                .filter(|p| p.status == ProductStatus::Pending)
                .count() as u64,
            developer,
        })
    }

    async fn profile(
        &self,
        developer_id: Uuid,
        status: Option<ProductStatus>,
    ) -> Result<DeveloperProfile, ServiceError> {
        let developer = self
            .developer_repo
            .find_by_id(developer_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("developer {}", developer_id)))?;
        let products = self.products_of(developer.id, status).await?;
        Ok(DeveloperProfile {
            developer,
            products,
        })
    }

    async fn list(&self) -> Result<Vec<developers::Model>, ServiceError> {
        Ok(self.developer_repo.list().await?)
    }

    async fn delete(&self, developer_id: Uuid) -> Result<(), ServiceError> {
        let blobs = self.developer_repo.delete(developer_id).await?;
        remove_orphans(self.assets.as_ref(), &blobs).await;
        tracing::info!(%developer_id, blobs = blobs.len(), "Deleted developer");
        Ok(())
    }
}
