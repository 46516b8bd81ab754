use super::{ServiceError, ValidationKind};
use crate::domain::rating::{is_valid_rating, MAX_RATING, MIN_RATING};
use crate::entities::reviews;
use crate::repositories::reviews::{NewReview, RatingSnapshot, ReviewRepository};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ReviewResult {
    pub review: reviews::Model,
    pub rating: f64,
    pub review_count: i32,
}

#[async_trait]
pub trait RatingService: Send + Sync {
    async fn add_review(
        &self,
        user_id: i64,
        product_id: Uuid,
        rating: i32,
        comment: String,
    ) -> Result<ReviewResult, ServiceError>;

    async fn recompute(&self, product_id: Uuid) -> Result<RatingSnapshot, ServiceError>;

    async fn reviews_for(&self, product_id: Uuid) -> Result<Vec<reviews::Model>, ServiceError>;

    async fn review_by(
        &self,
        user_id: i64,
        product_id: Uuid,
    ) -> Result<Option<reviews::Model>, ServiceError>;
}

pub struct RatingServiceImpl {
    review_repo: Arc<dyn ReviewRepository>,
}

impl RatingServiceImpl {
    pub fn new(review_repo: Arc<dyn ReviewRepository>) -> Self {
        Self { review_repo }
    }
}

#[async_trait]
impl RatingService for RatingServiceImpl {
    async fn add_review(
        &self,
        user_id: i64,
        product_id: Uuid,
        rating: i32,
        comment: String,
    ) -> Result<ReviewResult, ServiceError> {
        if !is_valid_rating(rating) {
            return Err(ServiceError::validation(
                ValidationKind::RatingOutOfRange,
                format!(
                    "rating must be between {} and {}, got {}",
                    MIN_RATING, MAX_RATING, rating
                ),
            ));
        }

        let (review, snapshot) = self
            .review_repo
            .add_review(NewReview {
                user_id,
                product_id,
                rating,
                comment,
            })
            .await
            .map_err(|err| match ServiceError::from(err) {
                ServiceError::Duplicate(_) => ServiceError::Duplicate(format!(
                    "user {} already reviewed product {}",
                    user_id, product_id
                )),
                ServiceError::NotFound(_) => {
                    ServiceError::not_found(format!("product {}", product_id))
                }
                other => other,
            })?;

        tracing::info!(
            %product_id,
            user_id,
            rating = snapshot.rating,
            review_count = snapshot.review_count,
            "Added review"
        );

        Ok(ReviewResult {
            review,
            rating: snapshot.rating,
            review_count: snapshot.review_count,
        })
    }

    async fn recompute(&self, product_id: Uuid) -> Result<RatingSnapshot, ServiceError> {
        Ok(self.review_repo.recompute(product_id).await?)
    }

    async fn reviews_for(&self, product_id: Uuid) -> Result<Vec<reviews::Model>, ServiceError> {
        Ok(self.review_repo.list_for_product(product_id).await?)
    }

    async fn review_by(
        &self,
        user_id: i64,
        product_id: Uuid,
    ) -> Result<Option<reviews::Model>, ServiceError> {
        Ok(self.review_repo.find_by_user(user_id, product_id).await?)
    }
}
