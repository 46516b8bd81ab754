use crate::entities::{downloads, prelude::*};
use crate::repositories::products::increment_download_count_on;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

pub struct DownloadRequest {
    pub user_id: i64,
    pub product_id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[async_trait::async_trait]
pub trait DownloadRepository: Send + Sync {
    /// Returns the ledger row for the pair and whether this call created it.
    /// The product counter moves only when `created` is true.
    async fn record_if_absent(
        &self,
        request: DownloadRequest,
    ) -> Result<(downloads::Model, bool), DbErr>;

    async fn find(&self, user_id: i64, product_id: Uuid)
        -> Result<Option<downloads::Model>, DbErr>;

    async fn count_for_product(&self, product_id: Uuid) -> Result<u64, DbErr>;
}

pub struct DownloadRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl DownloadRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl DownloadRepository for DownloadRepositoryImpl {
    async fn record_if_absent(
        &self,
        request: DownloadRequest,
    ) -> Result<(downloads::Model, bool), DbErr> {
        let txn = self.db.begin().await?;

        if Products::find_by_id(request.product_id)
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(DbErr::RecordNotFound(format!(
                "product {}",
                request.product_id
            )));
        }

        // The unique (user_id, product_id) index decides which request wins.
        let inserted = Downloads::insert(downloads::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(request.user_id),
            product_id: Set(request.product_id),
            downloaded_at: Set(chrono::Utc::now().naive_utc()),
            ip_address: Set(request.ip_address),
            user_agent: Set(request.user_agent),
        })
        .on_conflict(
            OnConflict::columns([downloads::Column::UserId, downloads::Column::ProductId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        let created = inserted == 1;
        if created {
            increment_download_count_on(&txn, request.product_id).await?;
        }

        let record = Downloads::find()
            .filter(downloads::Column::UserId.eq(request.user_id))
            .filter(downloads::Column::ProductId.eq(request.product_id))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                DbErr::RecordNotFound(format!(
                    "download of {} by {}",
                    request.product_id, request.user_id
                ))
            })?;

        txn.commit().await?;
        Ok((record, created))
    }

    async fn find(
        &self,
        user_id: i64,
        product_id: Uuid,
    ) -> Result<Option<downloads::Model>, DbErr> {
        Downloads::find()
            .filter(downloads::Column::UserId.eq(user_id))
            .filter(downloads::Column::ProductId.eq(product_id))
            .one(self.db.as_ref())
            .await
    }

    async fn count_for_product(&self, product_id: Uuid) -> Result<u64, DbErr> {
        Downloads::find()
            .filter(downloads::Column::ProductId.eq(product_id))
            .count(self.db.as_ref())
            .await
    }
}
