use crate::entities::moderation_logs::{self, ModerationAction};
use crate::entities::products::{self, ProductStatus};
use crate::entities::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ExprTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

pub struct TransitionOutcome {
    pub product: products::Model,
    pub entry: moderation_logs::Model,
}

#[async_trait::async_trait]
pub trait ModerationRepository: Send + Sync {
    /// Sets the product status and appends the audit entry in one transaction.
    async fn transition(
        &self,
        product_id: Uuid,
        moderator_id: i64,
        action: ModerationAction,
        reason: &str,
    ) -> Result<TransitionOutcome, DbErr>;

    async fn queue(&self) -> Result<Vec<products::Model>, DbErr>;

    /// Oldest first, in the order the transitions were applied.
    async fn history(&self, product_id: Uuid) -> Result<Vec<moderation_logs::Model>, DbErr>;
}

pub struct ModerationRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl ModerationRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl ModerationRepository for ModerationRepositoryImpl {
    async fn transition(
        &self,
        product_id: Uuid,
        moderator_id: i64,
        action: ModerationAction,
        reason: &str,
    ) -> Result<TransitionOutcome, DbErr> {
        let now = chrono::Utc::now().naive_utc();
        let txn = self.db.begin().await?;

        let updated = Products::update_many()
            .set(products::ActiveModel {
                status: Set(action.target_status()),
                updated_at: Set(now),
                ..Default::default()
            })
            .col_expr(
                products::Column::Revision,
                Expr::col(products::Column::Revision).add(1),
            )
            .filter(products::Column::Id.eq(product_id))
            .exec(&txn)
            .await?;
        if updated.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("product {}", product_id)));
        }

        let product = Products::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("product {}", product_id)))?;

        let entry = moderation_logs::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            moderator_id: Set(moderator_id),
            action: Set(action),
            reason: Set(reason.to_string()),
            revision: Set(product.revision),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(TransitionOutcome { product, entry })
    }

    async fn queue(&self) -> Result<Vec<products::Model>, DbErr> {
        Products::find()
            .filter(products::Column::Status.eq(ProductStatus::Pending))
            .order_by_desc(products::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
    }

    async fn history(&self, product_id: Uuid) -> Result<Vec<moderation_logs::Model>, DbErr> {
        ModerationLogs::find()
            .filter(moderation_logs::Column::ProductId.eq(product_id))
            .order_by_asc(moderation_logs::Column::Revision)
            .all(self.db.as_ref())
            .await
    }
}
