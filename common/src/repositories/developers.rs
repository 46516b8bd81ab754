use crate::entities::assets::Bucket;
use crate::entities::{developers, prelude::*, products};
use crate::repositories::products::{delete_product_on, BlobRef};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub company_name: Option<Option<String>>,
    pub bio: Option<String>,
    pub website: Option<Option<String>>,
    pub avatar_asset_id: Option<Option<Uuid>>,
}

#[async_trait::async_trait]
pub trait DeveloperRepository: Send + Sync {
    /// Exactly one developer exists per user; the unique user_id index settles
    /// concurrent first visits.
    async fn get_or_create(&self, user_id: i64) -> Result<developers::Model, DbErr>;

    async fn find_by_user(&self, user_id: i64) -> Result<Option<developers::Model>, DbErr>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<developers::Model>, DbErr>;

    async fn update_profile(
        &self,
        user_id: i64,
        update: ProfileUpdate,
    ) -> Result<developers::Model, DbErr>;

    /// Newest first.
    async fn list(&self) -> Result<Vec<developers::Model>, DbErr>;

    /// Deletes the developer and every product they own in one transaction.
    async fn delete(&self, id: Uuid) -> Result<Vec<BlobRef>, DbErr>;
}

pub struct DeveloperRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl DeveloperRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl DeveloperRepository for DeveloperRepositoryImpl {
    async fn get_or_create(&self, user_id: i64) -> Result<developers::Model, DbErr> {
        if let Some(existing) = self.find_by_user(user_id).await? {
            return Ok(existing);
        }

        Developers::insert(developers::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            company_name: Set(None),
            bio: Set(String::new()),
            website: Set(None),
            avatar_asset_id: Set(None),
            is_verified: Set(false),
            rating: Set(0.0),
            total_sales: Set(0),
            created_at: Set(chrono::Utc::now().naive_utc()),
        })
        .on_conflict(
            OnConflict::column(developers::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(self.db.as_ref())
        .await?;

        self.find_by_user(user_id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("developer for user {}", user_id)))
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Option<developers::Model>, DbErr> {
        Developers::find()
            .filter(developers::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<developers::Model>, DbErr> {
        Developers::find_by_id(id).one(self.db.as_ref()).await
    }

    async fn update_profile(
        &self,
        user_id: i64,
        update: ProfileUpdate,
    ) -> Result<developers::Model, DbErr> {
        let current = self.get_or_create(user_id).await?;

        let mut active = developers::ActiveModel {
            id: sea_orm::ActiveValue::Unchanged(current.id),
            ..Default::default()
        };
        if let Some(company_name) = update.company_name {
            active.company_name = Set(company_name);
        }
        if let Some(bio) = update.bio {
            active.bio = Set(bio);
        }
        if let Some(website) = update.website {
            active.website = Set(website);
        }
        if let Some(avatar) = update.avatar_asset_id {
            active.avatar_asset_id = Set(avatar);
        }

        Developers::update_many()
            .set(active)
            .filter(developers::Column::Id.eq(current.id))
            .exec(self.db.as_ref())
            .await?;

        self.find_by_id(current.id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("developer {}", current.id)))
    }

    async fn list(&self) -> Result<Vec<developers::Model>, DbErr> {
        Developers::find()
            .order_by_desc(developers::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
    }

    async fn delete(&self, id: Uuid) -> Result<Vec<BlobRef>, DbErr> {
        let txn = self.db.begin().await?;

        let developer = Developers::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("developer {}", id)))?;

        let product_ids: Vec<Uuid> = Products::find()
            .select_only()
            .column(products::Column::Id)
            .filter(products::Column::DeveloperId.eq(id))
            .into_tuple()
            .all(&txn)
            .await?;

        let mut blobs = Vec::new();
        for product_id in product_ids {
            blobs.extend(delete_product_on(&txn, product_id).await?);
        }
        if let Some(avatar) = developer.avatar_asset_id {
            blobs.push(BlobRef {
                bucket: Bucket::Avatars,
                asset_id: avatar,
            });
        }

        Developers::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(blobs)
    }
}
