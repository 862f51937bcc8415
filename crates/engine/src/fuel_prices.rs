//! Fuel price history.
//!
//! A row with `station_id = NULL` is an organization-wide price.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "fuel_prices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub organization_id: String,
    pub fuel_id: String,
    pub station_id: Option<String>,
    pub price_minor: i64,
    pub effective_date: DateTimeUtc,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Which rule produced an effective price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// Active row for the station, effective at the requested time.
    Station,
    /// Newest row for the fuel regardless of station and date.
    Latest,
    /// No row at all: [`FALLBACK_PRICE`].
    Fallback,
}

impl PriceSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Station => "station",
            Self::Latest => "latest",
            Self::Fallback => "fallback",
        }
    }
}

/// Price used when a fuel has no price row at all.
pub const FALLBACK_PRICE: crate::Money = crate::Money::new(470_00);
