use super::{read_text, read_upload, split_list};
use crate::auth::{AuthUser, OptionalAuthUser};
use crate::download_response::{AssetResponse, Disposition};
use crate::error::{ok, ApiError, ApiResult};
use crate::models::{ListProductsQuery, ProductDetail, UpdateProductRequest};
use crate::AppState;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use axum::Json;
use common::domain::listing::{PriceClass, ProductFilter};
use common::entities::product_files::FileType;
use common::entities::products::ProductType;
use common::repositories::products::ProductUpdate;
use common::services::assets::Upload;
use common::services::ServiceError;
use common::services::catalog::{
    FileUpload, ListProductsParams, PaginatedProductsResponse, ProductDraft, ProductDto,
    RELATED_LIMIT,
};
use std::sync::Arc;
use uuid::Uuid;

fn parse_product_type(raw: &str) -> Result<ProductType, ApiError> {
    raw.trim().parse::<ProductType>().map_err(ApiError::bad_request)
}

pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListProductsQuery>,
) -> ApiResult<PaginatedProductsResponse> {
    let product_type = query
        .product_type
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(parse_product_type)
        .transpose()?;

    let filter = ProductFilter {
        query: query.q,
        category: query.category.filter(|c| !c.trim().is_empty()),
        product_type,
        price: PriceClass::parse(query.price.as_deref()),
        ..ProductFilter::approved()
    };

    ok(state
        .services
        .catalog_service
        .list(ListProductsParams {
            filter,
            sort: query.sort,
            page: query.page,
            per_page: query.per_page,
        })
        .await?)
}

#[derive(Default)]
struct SubmissionForm {
    title: Option<String>,
    description: String,
    license: Option<String>,
    product_type: Option<ProductType>,
    version: Option<String>,
    price_cents: Option<i64>,
    tags: Vec<String>,
    categories: Vec<String>,
    thumbnail: Option<Upload>,
    license_file: Option<Upload>,
    files: Vec<FileUpload>,
}

impl SubmissionForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("invalid multipart: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "title" => form.title = Some(read_text(field).await?),
                "description" => form.description = read_text(field).await?,
                "license" => {
                    form.license = Some(read_text(field).await?).filter(|l| !l.trim().is_empty())
                }
                "product_type" => {
                    form.product_type = Some(parse_product_type(&read_text(field).await?)?)
                }
                "version" => form.version = Some(read_text(field).await?),
                "price_cents" => {
                    let raw = read_text(field).await?;
                    let raw = raw.trim();
                    if !raw.is_empty() {
                        form.price_cents = Some(raw.parse::<i64>().map_err(|_| {
                            ApiError::bad_request(format!("invalid price_cents '{}'", raw))
                        })?);
                    }
                }
                "tags" => form.tags.extend(split_list(&read_text(field).await?)),
                "categories" => form
                    .categories
                    .extend(split_list(&read_text(field).await?)),
                "thumbnail" => form.thumbnail = Some(read_upload(field).await?),
                "license_file" => form.license_file = Some(read_upload(field).await?),
                other => match other.parse::<FileType>() {
                    Ok(file_type) => form.files.push(FileUpload {
                        file_type,
                        upload: read_upload(field).await?,
                    }),
                    Err(_) => tracing::debug!(field = other, "Ignoring unknown form field"),
                },
            }
        }

        Ok(form)
    }
}

pub async fn create_product(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    multipart: Multipart,
) -> ApiResult<ProductDto> {
    let form = SubmissionForm::read(multipart).await?;

    let title = form
        .title
        .ok_or_else(|| ApiError::bad_request("missing 'title' field"))?;
    if !form.files.iter().any(|f| f.file_type == FileType::Main) {
        return Err(ApiError::bad_request("missing 'main' file"));
    }

    let draft = ProductDraft {
        title,
        description: form.description,
        license: form.license,
        product_type: form.product_type.unwrap_or(ProductType::Project),
        version: form.version.unwrap_or_else(|| "1.0.0".to_string()),
        price_cents: form.price_cents,
        tags: form.tags,
        categories: form.categories,
    };

    ok(state
        .services
        .catalog_service
        .submit(
            user.user_id,
            draft,
            form.thumbnail,
            form.license_file,
            form.files,
        )
        .await?)
}

pub async fn get_product(
    State(state): State<Arc<AppState>>,
    viewer: OptionalAuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<ProductDetail> {
    let catalog = &state.services.catalog_service;
    let product = catalog.get_visible(id, &viewer.viewer()).await?;

    ok(ProductDetail {
        files: catalog.files_for(id).await?,
        license_file: catalog.license_for(id).await?,
        reviews: state.services.rating_service.reviews_for(id).await?,
        product,
    })
}

pub async fn update_product(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> ApiResult<ProductDto> {
    let update = ProductUpdate {
        title: req.title,
        description: req.description,
        license: req.license,
        product_type: req
            .product_type
            .as_deref()
            .map(parse_product_type)
            .transpose()?,
        version: req.version,
        price_cents: req.price_cents,
        tags: req.tags,
        categories: req.categories,
        thumbnail_asset_id: req.thumbnail_asset_id,
    };

    ok(state
        .services
        .catalog_service
        .update(user.user_id, id, update)
        .await?)
}

pub async fn related_products(
    State(state): State<Arc<AppState>>,
    viewer: OptionalAuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<ProductDto>> {
    let catalog = &state.services.catalog_service;
    catalog.get_visible(id, &viewer.viewer()).await?;
    ok(catalog.related(id, RELATED_LIMIT).await?)
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Records the download once per user and streams the main file.
pub async fn download_product(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<AssetResponse, ApiError> {
    state
        .services
        .catalog_service
        .get_visible(id, &user.viewer())
        .await?;

    let file = state.services.download_service.main_file_for(id).await?;
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    state
        .services
        .download_service
        .record_if_absent(user.user_id, id, client_ip(&headers), user_agent)
        .await?;

    let content = state
        .services
        .asset_service
        .retrieve(file.asset_id, file.bucket)
        .await?;

    Ok(AssetResponse {
        content,
        disposition: Disposition::Attachment,
    })
}

/// Streams any file attached to a visible product. Unlike `/download`, this
/// does not touch the ledger.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    viewer: OptionalAuthUser,
    Path((id, file_id)): Path<(Uuid, Uuid)>,
) -> Result<AssetResponse, ApiError> {
    let catalog = &state.services.catalog_service;
    catalog.get_visible(id, &viewer.viewer()).await?;

    let file = catalog
        .files_for(id)
        .await?
        .into_iter()
        .find(|f| f.id == file_id)
        .ok_or_else(|| ServiceError::not_found(format!("file {}", file_id)))?;

    let content = state
        .services
        .asset_service
        .retrieve(file.asset_id, file.bucket)
        .await?;
    Ok(AssetResponse {
        content,
        disposition: Disposition::Attachment,
    })
}

pub async fn download_license(
    State(state): State<Arc<AppState>>,
    viewer: OptionalAuthUser,
    Path(id): Path<Uuid>,
) -> Result<AssetResponse, ApiError> {
    let catalog = &state.services.catalog_service;
    catalog.get_visible(id, &viewer.viewer()).await?;

    let license = catalog
        .license_for(id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("license file of product {}", id)))?;

    let content = state
        .services
        .asset_service
        .retrieve(license.asset_id, license.bucket)
        .await?;
    Ok(AssetResponse {
        content,
        disposition: Disposition::Attachment,
    })
}
