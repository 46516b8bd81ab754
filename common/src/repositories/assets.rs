use crate::entities::{assets, assets::Bucket, prelude::*};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use uuid::Uuid;

pub struct NewAsset {
    pub id: Uuid,
    pub bucket: Bucket,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub checksum: String,
}

#[async_trait::async_trait]
pub trait AssetRepository: Send + Sync {
    async fn insert(&self, asset: NewAsset) -> Result<assets::Model, DbErr>;

    /// Looks the asset up inside one bucket only.
    async fn find(&self, id: Uuid, bucket: Bucket) -> Result<Option<assets::Model>, DbErr>;

    async fn delete(&self, id: Uuid, bucket: Bucket) -> Result<bool, DbErr>;
}

pub struct AssetRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl AssetRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl AssetRepository for AssetRepositoryImpl {
    async fn insert(&self, asset: NewAsset) -> Result<assets::Model, DbErr> {
        assets::ActiveModel {
            id: Set(asset.id),
            bucket: Set(asset.bucket),
            filename: Set(asset.filename),
            content_type: Set(asset.content_type),
            size: Set(asset.size),
            checksum: Set(asset.checksum),
            created_at: Set(chrono::Utc::now().naive_utc()),
        }
        .insert(self.db.as_ref())
        .await
    }

    async fn find(&self, id: Uuid, bucket: Bucket) -> Result<Option<assets::Model>, DbErr> {
        Assets::find_by_id(id)
            .filter(assets::Column::Bucket.eq(bucket))
            .one(self.db.as_ref())
            .await
    }

    async fn delete(&self, id: Uuid, bucket: Bucket) -> Result<bool, DbErr> {
        let res = Assets::delete_many()
            .filter(assets::Column::Id.eq(id))
            .filter(assets::Column::Bucket.eq(bucket))
            .exec(self.db.as_ref())
            .await?;
        Ok(res.rows_affected > 0)
    }
}
