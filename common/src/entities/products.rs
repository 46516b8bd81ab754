use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "suspended")]
    Suspended,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Pending => "pending",
            ProductStatus::Approved => "approved",
            ProductStatus::Rejected => "rejected",
            ProductStatus::Suspended => "suspended",
        }
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProductStatus::Pending),
            "approved" => Ok(ProductStatus::Approved),
            "rejected" => Ok(ProductStatus::Rejected),
            "suspended" => Ok(ProductStatus::Suspended),
            other => Err(format!("unknown product status '{}'", other)),
        }
    }
}

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    #[sea_orm(string_value = "project")]
    Project,
    #[sea_orm(string_value = "apk")]
    Apk,
    #[sea_orm(string_value = "template")]
    Template,
    #[sea_orm(string_value = "plugin")]
    Plugin,
}

impl std::str::FromStr for ProductType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project" => Ok(ProductType::Project),
            "apk" => Ok(ProductType::Apk),
            "template" => Ok(ProductType::Template),
            "plugin" => Ok(ProductType::Plugin),
            other => Err(format!("unknown product type '{}'", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub developer_id: Uuid,
    #[sea_orm(nullable)]
    pub license: Option<String>,
    pub product_type: ProductType,
    pub version: String,
    #[sea_orm(nullable)]
    pub price_cents: Option<i64>,
    pub is_free: bool,
    pub status: ProductStatus,
    pub download_count: i64,
    pub rating: f64,
    pub review_count: i32,
    /// Comma separated, see `domain::tags`.
    #[sea_orm(column_type = "Text")]
    pub tags: String,
    #[sea_orm(nullable)]
    pub thumbnail_asset_id: Option<Uuid>,
    pub revision: i32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::developers::Entity",
        from = "Column::DeveloperId",
        to = "super::developers::Column::Id"
    )]
    Developer,
    #[sea_orm(has_many = "super::product_categories::Entity")]
    Categories,
    #[sea_orm(has_many = "super::product_files::Entity")]
    Files,
    #[sea_orm(has_one = "super::licenses::Entity")]
    LicenseFile,
    #[sea_orm(has_many = "super::reviews::Entity")]
    Reviews,
    #[sea_orm(has_many = "super::downloads::Entity")]
    Downloads,
    #[sea_orm(has_many = "super::moderation_logs::Entity")]
    ModerationLogs,
}

impl Related<super::developers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Developer.def()
    }
}

impl Related<super::product_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::product_files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Files.def()
    }
}

impl Related<super::licenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LicenseFile.def()
    }
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::downloads::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Downloads.def()
    }
}

impl Related<super::moderation_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ModerationLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
