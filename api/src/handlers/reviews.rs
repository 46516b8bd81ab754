use crate::auth::AuthUser;
use crate::error::{ok, ApiResult};
use crate::models::AddReviewRequest;
use crate::AppState;
use axum::extract::{Path, State};
use axum::Json;
use common::entities::products::ProductStatus;
use common::entities::reviews;
use common::services::ratings::ReviewResult;
use std::sync::Arc;
use uuid::Uuid;

pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<reviews::Model>> {
    state
        .services
        .catalog_service
        .get(id, Some(ProductStatus::Approved))
        .await?;
    ok(state.services.rating_service.reviews_for(id).await?)
}

/// Only approved products take reviews.
pub async fn add_review(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<AddReviewRequest>,
) -> ApiResult<ReviewResult> {
    state
        .services
        .catalog_service
        .get(id, Some(ProductStatus::Approved))
        .await?;
    ok(state
        .services
        .rating_service
        .add_review(user.user_id, id, req.rating, req.comment)
        .await?)
}
