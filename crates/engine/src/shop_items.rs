//! Per-product stock lines of a shop assignment.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, Quantity, util::parse_id};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub opening_stock_milli: Quantity,
    pub added_stock_milli: Quantity,
    pub closing_stock_milli: Option<Quantity>,
    pub sold_quantity_milli: Option<Quantity>,
    pub revenue_minor: Option<Money>,
}

impl TryFrom<Model> for ShopItem {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&model.id)?,
            product_id: parse_id(&model.product_id)?,
            opening_stock_milli: Quantity::from_milli(model.opening_stock_milli),
            added_stock_milli: Quantity::from_milli(model.added_stock_milli),
            closing_stock_milli: model.closing_stock_milli.map(Quantity::from_milli),
            sold_quantity_milli: model.sold_quantity_milli.map(Quantity::from_milli),
            revenue_minor: model.revenue_minor.map(Money::new),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "shop_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub assignment_id: String,
    pub product_id: String,
    pub opening_stock_milli: i64,
    pub added_stock_milli: i64,
    pub closing_stock_milli: Option<i64>,
    pub sold_quantity_milli: Option<i64>,
    pub revenue_minor: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shop_assignments::Entity",
        from = "Column::AssignmentId",
        to = "super::shop_assignments::Column::Id"
    )]
    Assignment,
}

impl Related<super::shop_assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
