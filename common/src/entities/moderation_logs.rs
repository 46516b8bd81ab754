use super::products::ProductStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "suspended")]
    Suspended,
}

impl ModerationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationAction::Approved => "approved",
            ModerationAction::Rejected => "rejected",
            ModerationAction::Suspended => "suspended",
        }
    }

    /// Status a product ends up in after this action.
    pub fn target_status(&self) -> ProductStatus {
        match self {
            ModerationAction::Approved => ProductStatus::Approved,
            ModerationAction::Rejected => ProductStatus::Rejected,
            ModerationAction::Suspended => ProductStatus::Suspended,
        }
    }
}

impl std::str::FromStr for ModerationAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(ModerationAction::Approved),
            "rejected" => Ok(ModerationAction::Rejected),
            "suspended" => Ok(ModerationAction::Suspended),
            other => Err(format!("invalid moderation action '{}'", other)),
        }
    }
}

/// Append-only audit trail. Rows are inserted by the moderation transition and
/// never updated.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "moderation_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    pub moderator_id: i64,
    pub action: ModerationAction,
    #[sea_orm(column_type = "Text")]
    pub reason: String,
    /// Product revision produced by this transition. Orders the log even
    /// when timestamps collide.
    pub revision: i32,
    pub created_at: DateTime,
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
