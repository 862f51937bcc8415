use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, Quantity, util::parse_id};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditSale {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub station_id: Option<Uuid>,
    pub shift_id: Option<Uuid>,
    pub fuel_id: Option<Uuid>,
    pub amount_minor: Money,
    pub litres_milli: Option<Quantity>,
    pub timestamp: DateTime<Utc>,
    pub recorded_by: String,
}

impl TryFrom<Model> for CreditSale {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&model.id)?,
            customer_id: parse_id(&model.customer_id)?,
            station_id: model.station_id.as_deref().map(parse_id).transpose()?,
            shift_id: model.shift_id.as_deref().map(parse_id).transpose()?,
            fuel_id: model.fuel_id.as_deref().map(parse_id).transpose()?,
            amount_minor: Money::new(model.amount_minor),
            litres_milli: model.litres_milli.map(Quantity::from_milli),
            timestamp: model.timestamp,
            recorded_by: model.recorded_by,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "credit_sales")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub customer_id: String,
    pub station_id: Option<String>,
    pub shift_id: Option<String>,
    pub fuel_id: Option<String>,
    pub amount_minor: i64,
    pub litres_milli: Option<i64>,
    pub timestamp: DateTimeUtc,
    pub recorded_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
