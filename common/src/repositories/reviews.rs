use crate::domain::rating::aggregate;
use crate::entities::{prelude::*, products, reviews};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, ExprTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Optimistic writes give up after this many lost races.
const RECOMPUTE_ATTEMPTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSnapshot {
    pub rating: f64,
    pub review_count: i32,
}

pub struct NewReview {
    pub user_id: i64,
    pub product_id: Uuid,
    pub rating: i32,
    pub comment: String,
}

#[async_trait::async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Inserts the review and recomputes the product rating in the same
    /// transaction. A second review for the pair fails with
    /// `DbErr::RecordNotInserted`.
    async fn add_review(&self, review: NewReview)
        -> Result<(reviews::Model, RatingSnapshot), DbErr>;

    async fn recompute(&self, product_id: Uuid) -> Result<RatingSnapshot, DbErr>;

    async fn list_for_product(&self, product_id: Uuid) -> Result<Vec<reviews::Model>, DbErr>;

    async fn find_by_user(
        &self,
        user_id: i64,
        product_id: Uuid,
    ) -> Result<Option<reviews::Model>, DbErr>;
}

pub struct ReviewRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl ReviewRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

/// Rewrites rating and review_count from the full review set. The write only
/// lands if the product revision is unchanged since the read.
pub(crate) async fn recompute_on<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
) -> Result<RatingSnapshot, DbErr> {
    for attempt in 1..=RECOMPUTE_ATTEMPTS {
        let product = Products::find_by_id(product_id)
            .one(conn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("product {}", product_id)))?;

        let ratings: Vec<i32> = Reviews::find()
            .select_only()
            .column(reviews::Column::Rating)
            .filter(reviews::Column::ProductId.eq(product_id))
            .into_tuple()
            .all(conn)
            .await?;
        let (rating, review_count) = aggregate(&ratings);

        let result = Products::update_many()
            .col_expr(products::Column::Rating, Expr::value(rating))
            .col_expr(products::Column::ReviewCount, Expr::value(review_count))
            .col_expr(
                products::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().naive_utc()),
            )
            .col_expr(
                products::Column::Revision,
                Expr::col(products::Column::Revision).add(1),
            )
            .filter(products::Column::Id.eq(product_id))
            .filter(products::Column::Revision.eq(product.revision))
            .exec(conn)
            .await?;

        if result.rows_affected == 1 {
            return Ok(RatingSnapshot {
                rating,
                review_count,
            });
        }

        tracing::debug!(%product_id, attempt, "rating recompute lost a revision race, retrying");
    }

    Err(DbErr::Custom(format!(
        "rating recompute for product {} did not converge",
        product_id
    )))
}

#[async_trait::async_trait]
impl ReviewRepository for ReviewRepositoryImpl {
    async fn add_review(
        &self,
        review: NewReview,
    ) -> Result<(reviews::Model, RatingSnapshot), DbErr> {
        let txn = self.db.begin().await?;

        if Products::find_by_id(review.product_id)
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(DbErr::RecordNotFound(format!(
                "product {}",
                review.product_id
            )));
        }

        let model = reviews::Model {
            id: Uuid::new_v4(),
            user_id: review.user_id,
            product_id: review.product_id,
            rating: review.rating,
            comment: review.comment,
            created_at: chrono::Utc::now().naive_utc(),
        };

        let inserted = Reviews::insert(reviews::ActiveModel {
            id: Set(model.id),
            user_id: Set(model.user_id),
            product_id: Set(model.product_id),
            rating: Set(model.rating),
            comment: Set(model.comment.clone()),
            created_at: Set(model.created_at),
        })
        .on_conflict(
            OnConflict::columns([reviews::Column::UserId, reviews::Column::ProductId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;
        if inserted == 0 {
            return Err(DbErr::RecordNotInserted);
        }

        let snapshot = recompute_on(&txn, model.product_id).await?;
        txn.commit().await?;

        Ok((model, snapshot))
    }

    async fn recompute(&self, product_id: Uuid) -> Result<RatingSnapshot, DbErr> {
        recompute_on(self.db.as_ref(), product_id).await
    }

    async fn list_for_product(&self, product_id: Uuid) -> Result<Vec<reviews::Model>, DbErr> {
        Reviews::find()
            .filter(reviews::Column::ProductId.eq(product_id))
            .order_by_desc(reviews::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
    }

    async fn find_by_user(
        &self,
        user_id: i64,
        product_id: Uuid,
    ) -> Result<Option<reviews::Model>, DbErr> {
        Reviews::find()
            .filter(reviews::Column::UserId.eq(user_id))
            .filter(reviews::Column::ProductId.eq(product_id))
            .one(self.db.as_ref())
            .await
    }
}
