use crate::domain::listing::{
    escape_like, PriceClass, ProductFilter, SortField, SortKey, LIKE_ESCAPE,
};
use crate::domain::tags::{clean_names, join_tags};
use crate::entities::assets::Bucket;
use crate::entities::product_files::{FileType, ScanStatus};
use crate::entities::products::{ProductStatus, ProductType};
use crate::entities::{
    categories, downloads, licenses, moderation_logs, prelude::*, product_categories,
    product_files, products, reviews,
};
use crate::repositories::categories::ensure_names;
use sea_orm::sea_query::{Expr, Func, LikeExpr, Query, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, ExprTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    Set, TransactionTrait,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Metadata of a blob already written to the asset store.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub asset_id: Uuid,
    pub bucket: Bucket,
    pub filename: String,
    pub size: i64,
    pub checksum: String,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub struct NewProductFile {
    pub file_type: FileType,
    pub file: StoredFile,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub developer_id: Uuid,
    pub license: Option<String>,
    pub product_type: ProductType,
    pub version: String,
    pub price_cents: Option<i64>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub thumbnail_asset_id: Option<Uuid>,
    pub files: Vec<NewProductFile>,
    pub license_file: Option<StoredFile>,
}

/// Owner-editable fields. Status, rating and counters are deliberately absent:
/// they belong to moderation and rating aggregation.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub license: Option<Option<String>>,
    pub product_type: Option<ProductType>,
    pub version: Option<String>,
    pub price_cents: Option<Option<i64>>,
    pub tags: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub thumbnail_asset_id: Option<Option<Uuid>>,
}

/// A blob still referenced by rows that were just deleted. Removing it is
/// left to the caller, after the transaction has committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobRef {
    pub bucket: Bucket,
    pub asset_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductRecord {
    #[serde(flatten)]
    pub product: products::Model,
    pub categories: Vec<String>,
}

#[async_trait::async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create(&self, new: NewProduct) -> Result<ProductRecord, DbErr>;

    async fn get(
        &self,
        id: Uuid,
        status: Option<ProductStatus>,
    ) -> Result<Option<products::Model>, DbErr>;

    async fn categories_for(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<String>>, DbErr>;

    async fn find(
        &self,
        filter: &ProductFilter,
        sort: SortKey,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<products::Model>, DbErr>;

    async fn count(&self, filter: &ProductFilter) -> Result<u64, DbErr>;

    async fn increment_download_count(&self, id: Uuid) -> Result<(), DbErr>;

    async fn increment_review_count(&self, id: Uuid) -> Result<(), DbErr>;

    async fn update(&self, id: Uuid, update: ProductUpdate) -> Result<ProductRecord, DbErr>;

    /// Removes the product with its files, license, categories, reviews,
    /// downloads and moderation log in one transaction. Category names it
    /// registered stay in the index.
    async fn delete(&self, id: Uuid) -> Result<Vec<BlobRef>, DbErr>;

    async fn related_to(
        &self,
        category: &str,
        exclude_id: Uuid,
        limit: u64,
    ) -> Result<Vec<products::Model>, DbErr>;

    async fn files_for(&self, id: Uuid) -> Result<Vec<product_files::Model>, DbErr>;

    async fn main_file_for(&self, id: Uuid) -> Result<Option<product_files::Model>, DbErr>;

    async fn license_for(&self, id: Uuid) -> Result<Option<licenses::Model>, DbErr>;

    /// Write slot for the external scanner. Accepts a product file or a
    /// license file id.
    async fn record_scan(
        &self,
        file_id: Uuid,
        status: ScanStatus,
        results: serde_json::Value,
    ) -> Result<(), DbErr>;
}

pub struct ProductRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl ProductRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn is_free(price_cents: Option<i64>) -> bool {
    price_cents.is_none_or(|p| p == 0)
}

fn contains_ci<C: ColumnTrait>(col: C, needle: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(&needle.to_lowercase()));
    Expr::expr(Func::lower(Expr::col(col))).like(LikeExpr::new(pattern).escape(LIKE_ESCAPE))
}

fn in_category(name: &str) -> SimpleExpr {
    products::Column::Id.in_subquery(
        Query::select()
            .column(product_categories::Column::ProductId)
            .from(ProductCategories)
            .and_where(product_categories::Column::Name.eq(name))
            .to_owned(),
    )
}

fn apply_filter(mut query: Select<Products>, filter: &ProductFilter) -> Select<Products> {
    if let Some(status) = filter.status {
        query = query.filter(products::Column::Status.eq(status));
    }
    if let Some(q) = filter.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(contains_ci(products::Column::Title, q))
                .add(contains_ci(products::Column::Description, q))
                .add(contains_ci(products::Column::Tags, q)),
        );
    }
    if let Some(category) = filter.category.as_deref() {
        query = query.filter(in_category(category));
    }
    if let Some(product_type) = filter.product_type {
        query = query.filter(products::Column::ProductType.eq(product_type));
    }
    match filter.price {
        Some(PriceClass::Free) => query = query.filter(products::Column::IsFree.eq(true)),
        Some(PriceClass::Paid) => query = query.filter(products::Column::IsFree.eq(false)),
        None => {}
    }
    if let Some(developer_id) = filter.developer_id {
        query = query.filter(products::Column::DeveloperId.eq(developer_id));
    }
    query
}

fn apply_sort(query: Select<Products>, sort: SortKey) -> Select<Products> {
    let column = match sort.field {
        SortField::CreatedAt => products::Column::CreatedAt,
        SortField::DownloadCount => products::Column::DownloadCount,
        SortField::Rating => products::Column::Rating,
        SortField::Price => products::Column::PriceCents,
    };
    let order = if sort.descending {
        Order::Desc
    } else {
        Order::Asc
    };
    query
        .order_by(column, order)
        .order_by_desc(products::Column::CreatedAt)
        .order_by_asc(products::Column::Id)
}

/// Replaces the ordered category list of a product.
pub(crate) async fn replace_categories<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    names: &[String],
) -> Result<(), DbErr> {
    ProductCategories::delete_many()
        .filter(product_categories::Column::ProductId.eq(product_id))
        .exec(conn)
        .await?;

    if names.is_empty() {
        return Ok(());
    }

    let rows = names
        .iter()
        .enumerate()
        .map(|(position, name)| product_categories::ActiveModel {
            product_id: Set(product_id),
            position: Set(position as i32),
            name: Set(name.clone()),
            ..Default::default()
        });
    ProductCategories::insert_many(rows)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

pub(crate) async fn category_list<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
) -> Result<Vec<String>, DbErr> {
    ProductCategories::find()
        .select_only()
        .column(product_categories::Column::Name)
        .filter(product_categories::Column::ProductId.eq(product_id))
        .order_by_asc(product_categories::Column::Position)
        .into_tuple()
        .all(conn)
        .await
}

pub(crate) async fn delete_product_on<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<Vec<BlobRef>, DbErr> {
    let product = Products::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("product {}", id)))?;

    let mut blobs: Vec<BlobRef> = ProductFiles::find()
        .filter(product_files::Column::ProductId.eq(id))
        .all(conn)
        .await?
        .into_iter()
        .map(|f| BlobRef {
            bucket: f.bucket,
            asset_id: f.asset_id,
        })
        .collect();
    if let Some(license) = Licenses::find()
        .filter(licenses::Column::ProductId.eq(id))
        .one(conn)
        .await?
    {
        blobs.push(BlobRef {
            bucket: license.bucket,
            asset_id: license.asset_id,
        });
    }
    if let Some(thumbnail) = product.thumbnail_asset_id {
        blobs.push(BlobRef {
            bucket: Bucket::Thumbnails,
            asset_id: thumbnail,
        });
    }

    ModerationLogs::delete_many()
        .filter(moderation_logs::Column::ProductId.eq(id))
        .exec(conn)
        .await?;
    Reviews::delete_many()
        .filter(reviews::Column::ProductId.eq(id))
        .exec(conn)
        .await?;
    Downloads::delete_many()
        .filter(downloads::Column::ProductId.eq(id))
        .exec(conn)
        .await?;
    ProductFiles::delete_many()
        .filter(product_files::Column::ProductId.eq(id))
        .exec(conn)
        .await?;
    Licenses::delete_many()
        .filter(licenses::Column::ProductId.eq(id))
        .exec(conn)
        .await?;
    ProductCategories::delete_many()
        .filter(product_categories::Column::ProductId.eq(id))
        .exec(conn)
        .await?;
    Categories::update_many()
        .set(categories::ActiveModel {
            product_id: Set(None),
            ..Default::default()
        })
        .filter(categories::Column::ProductId.eq(id))
        .exec(conn)
        .await?;
    Products::delete_by_id(id).exec(conn).await?;

    Ok(blobs)
}

pub(crate) async fn increment_download_count_on<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<(), DbErr> {
    let result = Products::update_many()
        .col_expr(
            products::Column::DownloadCount,
            Expr::col(products::Column::DownloadCount).add(1),
        )
        .filter(products::Column::Id.eq(id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(DbErr::RecordNotFound(format!("product {}", id)));
    }

    Ok(())
}

fn file_row(
    product_id: Uuid,
    file: NewProductFile,
    now: chrono::NaiveDateTime,
) -> product_files::ActiveModel {
    product_files::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        file_type: Set(file.file_type),
        bucket: Set(file.file.bucket),
        asset_id: Set(file.file.asset_id),
        filename: Set(file.file.filename),
        size: Set(file.file.size),
        checksum: Set(file.file.checksum),
        content_type: Set(file.file.content_type),
        scan_status: Set(ScanStatus::Pending),
        scan_results: Set(serde_json::json!({})),
        uploaded_at: Set(now),
    }
}

fn license_row(
    product_id: Uuid,
    file: StoredFile,
    now: chrono::NaiveDateTime,
) -> licenses::ActiveModel {
    licenses::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        bucket: Set(file.bucket),
        asset_id: Set(file.asset_id),
        filename: Set(file.filename),
        size: Set(file.size),
        checksum: Set(file.checksum),
        content_type: Set(file.content_type),
        scan_status: Set(ScanStatus::Pending),
        scan_results: Set(serde_json::json!({})),
        uploaded_at: Set(now),
    }
}

#[async_trait::async_trait]
impl ProductRepository for ProductRepositoryImpl {
    async fn create(&self, new: NewProduct) -> Result<ProductRecord, DbErr> {
        let now = chrono::Utc::now().naive_utc();
        let id = Uuid::new_v4();
        let categories = clean_names(&new.categories);

        let txn = self.db.begin().await?;

        let product = products::ActiveModel {
            id: Set(id),
            title: Set(new.title),
            description: Set(new.description),
            developer_id: Set(new.developer_id),
            license: Set(new.license),
            product_type: Set(new.product_type),
            version: Set(new.version),
            price_cents: Set(new.price_cents),
            is_free: Set(is_free(new.price_cents)),
            status: Set(ProductStatus::Pending),
            download_count: Set(0),
            rating: Set(0.0),
            review_count: Set(0),
            tags: Set(join_tags(&new.tags)),
            thumbnail_asset_id: Set(new.thumbnail_asset_id),
            revision: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        replace_categories(&txn, id, &categories).await?;
        ensure_names(&txn, &categories, Some(id)).await?;

        for file in new.files {
            file_row(id, file, now).insert(&txn).await?;
        }
        if let Some(license_file) = new.license_file {
            license_row(id, license_file, now).insert(&txn).await?;
        }

        txn.commit().await?;

        Ok(ProductRecord {
            product,
            categories,
        })
    }

    async fn get(
        &self,
        id: Uuid,
        status: Option<ProductStatus>,
    ) -> Result<Option<products::Model>, DbErr> {
        let mut query = Products::find_by_id(id);
        if let Some(status) = status {
            query = query.filter(products::Column::Status.eq(status));
        }
        query.one(self.db.as_ref()).await
    }

    async fn categories_for(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<String>>, DbErr> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = ProductCategories::find()
            .filter(product_categories::Column::ProductId.is_in(ids.to_vec()))
            .order_by_asc(product_categories::Column::ProductId)
            .order_by_asc(product_categories::Column::Position)
            .all(self.db.as_ref())
            .await?;

        let mut by_product: HashMap<Uuid, Vec<String>> = HashMap::with_capacity(ids.len());
        for row in rows {
            by_product.entry(row.product_id).or_default().push(row.name);
        }
        Ok(by_product)
    }

    async fn find(
        &self,
        filter: &ProductFilter,
        sort: SortKey,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<products::Model>, DbErr> {
        apply_sort(apply_filter(Products::find(), filter), sort)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
    }

    async fn count(&self, filter: &ProductFilter) -> Result<u64, DbErr> {
        apply_filter(Products::find(), filter)
            .count(self.db.as_ref())
            .await
    }

    async fn increment_download_count(&self, id: Uuid) -> Result<(), DbErr> {
        increment_download_count_on(self.db.as_ref(), id).await
    }

    async fn increment_review_count(&self, id: Uuid) -> Result<(), DbErr> {
        let result = Products::update_many()
            .col_expr(
                products::Column::ReviewCount,
                Expr::col(products::Column::ReviewCount).add(1),
            )
            .col_expr(
                products::Column::Revision,
                Expr::col(products::Column::Revision).add(1),
            )
            .filter(products::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("product {}", id)));
        }

        Ok(())
    }

    async fn update(&self, id: Uuid, update: ProductUpdate) -> Result<ProductRecord, DbErr> {
        let txn = self.db.begin().await?;

        let mut active = products::ActiveModel {
            updated_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };
        if let Some(title) = update.title {
            active.title = Set(title);
        }
        if let Some(description) = update.description {
            active.description = Set(description);
        }
        if let Some(license) = update.license {
            active.license = Set(license);
        }
        if let Some(product_type) = update.product_type {
            active.product_type = Set(product_type);
        }
        if let Some(version) = update.version {
            active.version = Set(version);
        }
        if let Some(price_cents) = update.price_cents {
            active.price_cents = Set(price_cents);
            active.is_free = Set(is_free(price_cents));
        }
        if let Some(tags) = update.tags {
            active.tags = Set(join_tags(&tags));
        }
        if let Some(thumbnail) = update.thumbnail_asset_id {
            active.thumbnail_asset_id = Set(thumbnail);
        }

        let result = Products::update_many()
            .set(active)
            .col_expr(
                products::Column::Revision,
                Expr::col(products::Column::Revision).add(1),
            )
            .filter(products::Column::Id.eq(id))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("product {}", id)));
        }

        if let Some(categories) = update.categories {
            let categories = clean_names(&categories);
            replace_categories(&txn, id, &categories).await?;
            ensure_names(&txn, &categories, Some(id)).await?;
        }

        let product = Products::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("product {}", id)))?;
        let categories = category_list(&txn, id).await?;

        txn.commit().await?;
        Ok(ProductRecord {
            product,
            categories,
        })
    }

    async fn delete(&self, id: Uuid) -> Result<Vec<BlobRef>, DbErr> {
        let txn = self.db.begin().await?;
        let blobs = delete_product_on(&txn, id).await?;
        txn.commit().await?;
        Ok(blobs)
    }

    async fn related_to(
        &self,
        category: &str,
        exclude_id: Uuid,
        limit: u64,
    ) -> Result<Vec<products::Model>, DbErr> {
        Products::find()
            .filter(products::Column::Status.eq(ProductStatus::Approved))
            .filter(products::Column::Id.ne(exclude_id))
            .filter(in_category(category))
            .order_by_desc(products::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
    }

    async fn files_for(&self, id: Uuid) -> Result<Vec<product_files::Model>, DbErr> {
        ProductFiles::find()
            .filter(product_files::Column::ProductId.eq(id))
            .order_by_asc(product_files::Column::UploadedAt)
            .all(self.db.as_ref())
            .await
    }

    async fn main_file_for(&self, id: Uuid) -> Result<Option<product_files::Model>, DbErr> {
        ProductFiles::find()
            .filter(product_files::Column::ProductId.eq(id))
            .filter(product_files::Column::FileType.eq(FileType::Main))
            .order_by_desc(product_files::Column::UploadedAt)
            .one(self.db.as_ref())
            .await
    }

    async fn license_for(&self, id: Uuid) -> Result<Option<licenses::Model>, DbErr> {
        Licenses::find()
            .filter(licenses::Column::ProductId.eq(id))
            .one(self.db.as_ref())
            .await
    }

    async fn record_scan(
        &self,
        file_id: Uuid,
        status: ScanStatus,
        results: serde_json::Value,
    ) -> Result<(), DbErr> {
        let updated = ProductFiles::update_many()
            .set(product_files::ActiveModel {
                scan_status: Set(status),
                scan_results: Set(results.clone()),
                ..Default::default()
            })
            .filter(product_files::Column::Id.eq(file_id))
            .exec(self.db.as_ref())
            .await?;
        if updated.rows_affected > 0 {
            return Ok(());
        }

        let updated = Licenses::update_many()
            .set(licenses::ActiveModel {
                scan_status: Set(status),
                scan_results: Set(results),
                ..Default::default()
            })
            .filter(licenses::Column::Id.eq(file_id))
            .exec(self.db.as_ref())
            .await?;
        if updated.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("file {}", file_id)));
        }
        Ok(())
    }
}
