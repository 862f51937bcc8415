//! One row per batch touched when a shop item is closed. `batch_id = NULL`
//! marks quantity no batch could cover; its cost is zero.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "shop_sales")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub item_id: String,
    pub product_id: String,
    pub batch_id: Option<String>,
    pub quantity_milli: i64,
    pub cost_price_minor: i64,
    pub selling_price_minor: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
