//! Shop counters run by a pumper during a shift.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ShiftStatus, ShopItem, util::parse_id};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopAssignment {
    pub id: Uuid,
    pub shift_id: Uuid,
    pub pumper_id: Uuid,
    pub status: ShiftStatus,
    pub total_revenue_minor: Money,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub items: Vec<ShopItem>,
}

impl TryFrom<Model> for ShopAssignment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&model.id)?,
            shift_id: parse_id(&model.shift_id)?,
            pumper_id: parse_id(&model.pumper_id)?,
            status: ShiftStatus::try_from(model.status.as_str())?,
            total_revenue_minor: Money::new(model.total_revenue_minor),
            opened_at: model.opened_at,
            closed_at: model.closed_at,
            items: Vec::new(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "shop_assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub shift_id: String,
    pub pumper_id: String,
    pub status: String,
    pub total_revenue_minor: i64,
    pub opened_at: DateTimeUtc,
    pub closed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::shop_items::Entity")]
    Items,
}

impl Related<super::shop_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
