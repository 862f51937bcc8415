//! Purchase batches. `current_quantity_milli` is what FIFO draws down.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "shop_batches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub product_id: String,
    pub purchase_date: DateTimeUtc,
    pub cost_price_minor: i64,
    pub original_quantity_milli: i64,
    pub current_quantity_milli: i64,
    pub supplier: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shop_products::Entity",
        from = "Column::ProductId",
        to = "super::shop_products::Column::Id"
    )]
    Product,
}

impl Related<super::shop_products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
