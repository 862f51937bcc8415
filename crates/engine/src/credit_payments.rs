use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, util::parse_id};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Cheque,
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::Cheque => "CHEQUE",
            Self::BankTransfer => "BANK_TRANSFER",
        }
    }
}

impl TryFrom<&str> for PaymentMethod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "CASH" => Ok(Self::Cash),
            "CHEQUE" => Ok(Self::Cheque),
            "BANK_TRANSFER" => Ok(Self::BankTransfer),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid payment method: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditPayment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub station_id: Option<Uuid>,
    pub amount_minor: Money,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub recorded_by: String,
}

impl TryFrom<Model> for CreditPayment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&model.id)?,
            customer_id: parse_id(&model.customer_id)?,
            station_id: model.station_id.as_deref().map(parse_id).transpose()?,
            amount_minor: Money::new(model.amount_minor),
            method: PaymentMethod::try_from(model.method.as_str())?,
            reference: model.reference,
            timestamp: model.timestamp,
            recorded_by: model.recorded_by,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "credit_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub customer_id: String,
    pub station_id: Option<String>,
    pub amount_minor: i64,
    pub method: String,
    pub reference: Option<String>,
    pub timestamp: DateTimeUtc,
    pub recorded_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
