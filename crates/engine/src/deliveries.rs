use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Quantity, delivery::DeliveryStatus, util::parse_id};

/// A tanker drop into one tank, verified later by dipping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: Uuid,
    pub station_id: Uuid,
    pub tank_id: Uuid,
    pub supplier: String,
    pub invoice_number: Option<String>,
    pub invoice_quantity_milli: Quantity,
    pub before_dip_milli: Quantity,
    pub after_dip_milli: Option<Quantity>,
    pub sold_during_milli: Quantity,
    pub received_milli: Option<Quantity>,
    pub status: DeliveryStatus,
    pub delivered_at: DateTime<Utc>,
    pub recorded_by: String,
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl Delivery {
    /// `received - invoice` once verified.
    #[must_use]
    pub fn invoice_variance(&self) -> Option<Quantity> {
        self.received_milli
            .map(|received| received - self.invoice_quantity_milli)
    }
}

impl TryFrom<Model> for Delivery {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&model.id)?,
            station_id: parse_id(&model.station_id)?,
            tank_id: parse_id(&model.tank_id)?,
            supplier: model.supplier,
            invoice_number: model.invoice_number,
            invoice_quantity_milli: Quantity::from_milli(model.invoice_quantity_milli),
            before_dip_milli: Quantity::from_milli(model.before_dip_milli),
            after_dip_milli: model.after_dip_milli.map(Quantity::from_milli),
            sold_during_milli: Quantity::from_milli(model.sold_during_milli),
            received_milli: model.received_milli.map(Quantity::from_milli),
            status: DeliveryStatus::try_from(model.status.as_str())?,
            delivered_at: model.delivered_at,
            recorded_by: model.recorded_by,
            verified_by: model.verified_by,
            verified_at: model.verified_at,
            notes: model.notes,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "deliveries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub organization_id: String,
    pub station_id: String,
    pub tank_id: String,
    pub supplier: String,
    pub invoice_number: Option<String>,
    pub invoice_quantity_milli: i64,
    pub before_dip_milli: i64,
    pub after_dip_milli: Option<i64>,
    pub sold_during_milli: i64,
    pub received_milli: Option<i64>,
    pub status: String,
    pub delivered_at: DateTimeUtc,
    pub recorded_by: String,
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTimeUtc>,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
