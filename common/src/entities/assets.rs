use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    #[sea_orm(string_value = "products")]
    Products,
    #[sea_orm(string_value = "thumbnails")]
    Thumbnails,
    #[sea_orm(string_value = "avatars")]
    Avatars,
    #[sea_orm(string_value = "license")]
    License,
    #[sea_orm(string_value = "screenshots")]
    Screenshots,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Products => "products",
            Bucket::Thumbnails => "thumbnails",
            Bucket::Avatars => "avatars",
            Bucket::License => "license",
            Bucket::Screenshots => "screenshots",
        }
    }

    /// Images are rendered in place, everything else is handed out as a file.
    pub fn serves_inline(&self) -> bool {
        matches!(
            self,
            Bucket::Thumbnails | Bucket::Avatars | Bucket::Screenshots
        )
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Bucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "products" => Ok(Bucket::Products),
            "thumbnails" => Ok(Bucket::Thumbnails),
            "avatars" => Ok(Bucket::Avatars),
            "license" => Ok(Bucket::License),
            "screenshots" => Ok(Bucket::Screenshots),
            other => Err(format!("unknown bucket '{}'", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub bucket: Bucket,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub checksum: String,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
