use super::{read_text, read_upload};
use crate::auth::AuthUser;
use crate::error::{ok, ApiError, ApiResult};
use crate::AppState;
use axum::extract::{Multipart, Path, State};
use common::entities::developers;
use common::entities::products::ProductStatus;
use common::services::developers::{DeveloperDashboard, DeveloperProfile, ProfileInput};
use std::sync::Arc;
use uuid::Uuid;

pub async fn get_me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<DeveloperDashboard> {
    ok(state
        .services
        .developer_service
        .dashboard(user.user_id)
        .await?)
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<developers::Model> {
    let mut input = ProfileInput::default();
    let mut avatar = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "company_name" => input.company_name = Some(read_text(field).await?),
            "bio" => input.bio = Some(read_text(field).await?),
            "website" => input.website = Some(read_text(field).await?),
            "avatar" => avatar = Some(read_upload(field).await?),
            _ => {}
        }
    }

    ok(state
        .services
        .developer_service
        .update_profile(user.user_id, input, avatar)
        .await?)
}

/// Public page of a developer. Only approved products are listed.
pub async fn get_developer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<DeveloperProfile> {
    ok(state
        .services
        .developer_service
        .profile(id, Some(ProductStatus::Approved))
        .await?)
}
