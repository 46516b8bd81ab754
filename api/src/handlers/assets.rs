use crate::download_response::{AssetResponse, Disposition};
use crate::error::ApiError;
use crate::AppState;
use axum::extract::{Path, State};
use common::entities::assets::Bucket;
use common::services::ServiceError;
use std::sync::Arc;
use uuid::Uuid;

/// Inline delivery for image buckets. Product and license files are only
/// served through their own routes.
pub async fn get_asset(
    State(state): State<Arc<AppState>>,
    Path((bucket, id)): Path<(String, Uuid)>,
) -> Result<AssetResponse, ApiError> {
    let bucket = bucket
        .parse::<Bucket>()
        .ok()
        .filter(Bucket::serves_inline)
        .ok_or_else(|| ServiceError::not_found(format!("bucket '{}'", bucket)))?;

    let content = state.services.asset_service.retrieve(id, bucket).await?;
    Ok(AssetResponse {
        content,
        disposition: Disposition::Inline,
    })
}
