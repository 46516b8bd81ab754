use crate::auth::{require_staff, AuthUser};
use crate::error::{ok, ApiResult};
use crate::models::{AddCategoriesRequest, RenameCategoryRequest, RenameCategoryResponse};
use crate::AppState;
use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;

pub async fn list_categories(State(state): State<Arc<AppState>>) -> ApiResult<Vec<String>> {
    ok(state.services.category_service.list().await?)
}

pub async fn add_categories(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<AddCategoriesRequest>,
) -> ApiResult<Vec<String>> {
    require_staff(&user)?;
    ok(state.services.category_service.add(&req.names).await?)
}

pub async fn rename_category(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(name): Path<String>,
    Json(req): Json<RenameCategoryRequest>,
) -> ApiResult<RenameCategoryResponse> {
    require_staff(&user)?;
    let products_updated = state
        .services
        .category_service
        .rename(&name, &req.name)
        .await?;
    ok(RenameCategoryResponse {
        name: req.name.trim().to_string(),
        products_updated,
    })
}

pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(name): Path<String>,
) -> ApiResult<()> {
    require_staff(&user)?;
    state.services.category_service.delete(&name).await?;
    ok(())
}
