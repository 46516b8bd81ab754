use crate::entities::{categories, prelude::*, product_categories, products};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, ExprTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

#[async_trait::async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Inserts the names that do not exist yet and returns those it created.
    async fn ensure(&self, names: &[String], origin: Option<Uuid>) -> Result<Vec<String>, DbErr>;

    async fn list_names(&self) -> Result<Vec<String>, DbErr>;

    async fn exists(&self, name: &str) -> Result<bool, DbErr>;

    /// Renames the category and every product list entry carrying the old
    /// name. Returns the number of products touched.
    async fn rename(&self, old: &str, new: &str) -> Result<u64, DbErr>;

    async fn delete(&self, name: &str) -> Result<bool, DbErr>;
}

pub struct CategoryRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl CategoryRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

/// Names must already be trimmed and non-blank. Existing names are left
/// alone, including when a concurrent writer inserts the same name first.
pub(crate) async fn ensure_names<C: ConnectionTrait>(
    conn: &C,
    names: &[String],
    origin: Option<Uuid>,
) -> Result<Vec<String>, DbErr> {
    let mut created = Vec::new();
    let unique: BTreeSet<&String> = names.iter().collect();

    for name in unique {
        let inserted = Categories::insert(categories::ActiveModel {
            name: Set(name.clone()),
            product_id: Set(origin),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::column(categories::Column::Name)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

        if inserted > 0 {
            created.push(name.clone());
        }
    }

    Ok(created)
}

#[async_trait::async_trait]
impl CategoryRepository for CategoryRepositoryImpl {
    async fn ensure(&self, names: &[String], origin: Option<Uuid>) -> Result<Vec<String>, DbErr> {
        ensure_names(self.db.as_ref(), names, origin).await
    }

    async fn list_names(&self) -> Result<Vec<String>, DbErr> {
        Categories::find()
            .select_only()
            .column(categories::Column::Name)
            .order_by_asc(categories::Column::Name)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
    }

    async fn exists(&self, name: &str) -> Result<bool, DbErr> {
        Ok(Categories::find()
            .filter(categories::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await?
            .is_some())
    }

    async fn rename(&self, old: &str, new: &str) -> Result<u64, DbErr> {
        let txn = self.db.begin().await?;

        let renamed = Categories::update_many()
            .col_expr(categories::Column::Name, Expr::value(new))
            .filter(categories::Column::Name.eq(old))
            .exec(&txn)
            .await?;
        if renamed.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("category '{}'", old)));
        }

        let product_ids: Vec<Uuid> = ProductCategories::find()
            .select_only()
            .column(product_categories::Column::ProductId)
            .distinct()
            .filter(product_categories::Column::Name.eq(old))
            .into_tuple()
            .all(&txn)
            .await?;

        // Each matching slot keeps its position, so the list order is untouched.
        ProductCategories::update_many()
            .col_expr(product_categories::Column::Name, Expr::value(new))
            .filter(product_categories::Column::Name.eq(old))
            .exec(&txn)
            .await?;

        if !product_ids.is_empty() {
            Products::update_many()
                .col_expr(
                    products::Column::UpdatedAt,
                    Expr::value(chrono::Utc::now().naive_utc()),
                )
                .col_expr(
                    products::Column::Revision,
                    Expr::col(products::Column::Revision).add(1),
                )
                .filter(products::Column::Id.is_in(product_ids.clone()))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(product_ids.len() as u64)
    }

    async fn delete(&self, name: &str) -> Result<bool, DbErr> {
        let res = Categories::delete_many()
            .filter(categories::Column::Name.eq(name))
            .exec(self.db.as_ref())
            .await?;
        Ok(res.rows_affected > 0)
    }
}
