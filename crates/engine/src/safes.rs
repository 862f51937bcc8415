//! Station safes.
//!
//! `current_balance_minor` is the running balance kept in step with every
//! ledger insert; `opening_balance_minor` is where a full replay starts.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, SafeTransaction, util::parse_id};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Safe {
    pub id: Uuid,
    pub station_id: Uuid,
    pub opening_balance_minor: Money,
    pub current_balance_minor: Money,
    pub updated_at: DateTime<Utc>,
    /// Most recent transactions, newest first.
    pub recent_transactions: Vec<SafeTransaction>,
}

impl TryFrom<Model> for Safe {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&model.id)?,
            station_id: parse_id(&model.station_id)?,
            opening_balance_minor: Money::new(model.opening_balance_minor),
            current_balance_minor: Money::new(model.current_balance_minor),
            updated_at: model.updated_at,
            recent_transactions: Vec::new(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "safes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub organization_id: String,
    #[sea_orm(unique)]
    pub station_id: String,
    pub opening_balance_minor: i64,
    pub current_balance_minor: i64,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::safe_transactions::Entity")]
    Transactions,
}

impl Related<super::safe_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
