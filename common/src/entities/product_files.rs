use super::assets::Bucket;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    #[sea_orm(string_value = "main")]
    Main,
    #[sea_orm(string_value = "demo")]
    Demo,
    #[sea_orm(string_value = "documentation")]
    Documentation,
    #[sea_orm(string_value = "screenshot")]
    Screenshot,
}

impl FileType {
    pub fn bucket(&self) -> Bucket {
        match self {
            FileType::Screenshot => Bucket::Screenshots,
            _ => Bucket::Products,
        }
    }
}

impl std::str::FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(FileType::Main),
            "demo" => Ok(FileType::Demo),
            "documentation" => Ok(FileType::Documentation),
            "screenshot" => Ok(FileType::Screenshot),
            other => Err(format!("unknown file type '{}'", other)),
        }
    }
}

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "clean")]
    Clean,
    #[sea_orm(string_value = "flagged")]
    Flagged,
}

impl std::str::FromStr for ScanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ScanStatus::Pending),
            "clean" => Ok(ScanStatus::Clean),
            "flagged" => Ok(ScanStatus::Flagged),
            other => Err(format!("unknown scan status '{}'", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_files")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    pub file_type: FileType,
    pub bucket: Bucket,
    pub asset_id: Uuid,
    pub filename: String,
    pub size: i64,
    pub checksum: String,
    pub content_type: String,
    pub scan_status: ScanStatus,
    pub scan_results: Json,
    pub uploaded_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id"
    )]
    Product,
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
