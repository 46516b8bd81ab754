use crate::auth::{require_staff, AuthUser};
use crate::error::{ok, ApiResult};
use crate::models::ModerateRequest;
use crate::AppState;
use axum::extract::{Path, State};
use axum::Json;
use common::entities::{moderation_logs, products};
use common::services::moderation::TransitionResult;
use std::sync::Arc;
use uuid::Uuid;

pub async fn queue(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Vec<products::Model>> {
    require_staff(&user)?;
    ok(state.services.moderation_service.queue().await?)
}

pub async fn moderate(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ModerateRequest>,
) -> ApiResult<TransitionResult> {
    require_staff(&user)?;
    ok(state
        .services
        .moderation_service
        .transition(id, user.user_id, &req.action, &req.reason)
        .await?)
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<moderation_logs::Model>> {
    require_staff(&user)?;
    ok(state.services.moderation_service.history(id).await?)
}
