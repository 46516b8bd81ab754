use crate::auth::{require_staff, AuthUser};
use crate::error::{ok, ApiError, ApiResult};
use crate::models::{AdminProductsQuery, AdminStats};
use crate::AppState;
use axum::extract::{Path, Query, State};
use common::domain::listing::ProductFilter;
use common::entities::developers;
use common::entities::products::ProductStatus;
use common::services::catalog::{ListProductsParams, PaginatedProductsResponse};
use common::services::developers::DeveloperProfile;
use std::sync::Arc;
use uuid::Uuid;

pub async fn stats(State(state): State<Arc<AppState>>, user: AuthUser) -> ApiResult<AdminStats> {
    require_staff(&user)?;
    let catalog = &state.services.catalog_service;
    let with_status = |status| ProductFilter {
        status: Some(status),
        ..Default::default()
    };

    ok(AdminStats {
        total_products: catalog.count(&ProductFilter::default()).await?,
        pending_products: catalog.count(&with_status(ProductStatus::Pending)).await?,
        approved_products: catalog.count(&with_status(ProductStatus::Approved)).await?,
        categories: state.services.category_service.list().await?,
    })
}

pub async fn list_products(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<AdminProductsQuery>,
) -> ApiResult<PaginatedProductsResponse> {
    require_staff(&user)?;
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<ProductStatus>().map_err(ApiError::bad_request))
        .transpose()?;

    ok(state
        .services
        .catalog_service
        .list(ListProductsParams {
            filter: ProductFilter {
                status,
                query: query.q,
                ..Default::default()
            },
            sort: query.sort,
            page: query.page,
            per_page: query.per_page,
        })
        .await?)
}

pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    require_staff(&user)?;
    state.services.catalog_service.delete(id).await?;
    ok(())
}

pub async fn list_developers(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Vec<developers::Model>> {
    require_staff(&user)?;
    ok(state.services.developer_service.list().await?)
}

pub async fn get_developer(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<DeveloperProfile> {
    require_staff(&user)?;
    ok(state.services.developer_service.profile(id, None).await?)
}

pub async fn delete_developer(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    require_staff(&user)?;
    state.services.developer_service.delete(id).await?;
    ok(())
}
