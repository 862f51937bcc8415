//! Credit customers.
//!
//! `balance_minor` is the amount owed: the sum of credit sales minus the sum
//! of payments, updated in the same DB transaction as each sale or payment.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CreditPayment, CreditSale, EngineError, Money, util::parse_id};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCustomer {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    /// Zero means no limit.
    pub credit_limit_minor: Money,
    pub balance_minor: Money,
    pub created_at: DateTime<Utc>,
    pub recent_sales: Vec<CreditSale>,
    pub recent_payments: Vec<CreditPayment>,
}

impl TryFrom<Model> for CreditCustomer {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&model.id)?,
            name: model.name,
            phone: model.phone,
            credit_limit_minor: Money::new(model.credit_limit_minor),
            balance_minor: Money::new(model.balance_minor),
            created_at: model.created_at,
            recent_sales: Vec::new(),
            recent_payments: Vec::new(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "credit_customers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub credit_limit_minor: i64,
    pub balance_minor: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
