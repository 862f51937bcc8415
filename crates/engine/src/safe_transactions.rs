//! Safe ledger rows.
//!
//! Rows are ordered by `timestamp`, then by `sequence` (insertion order within
//! the safe). Each row stores the balance before and after it was applied.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine, ledger::SafeTransactionKind, ledger::validate_amount,
    util::parse_id,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeTransaction {
    pub id: Uuid,
    pub safe_id: Uuid,
    pub kind: SafeTransactionKind,
    pub amount_minor: Money,
    pub balance_before_minor: Money,
    pub balance_after_minor: Money,
    pub timestamp: DateTime<Utc>,
    pub shift_id: Option<Uuid>,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub performed_by: String,
}

impl SafeTransaction {
    /// Builds an unsaved row; balances are filled in when it is placed in the
    /// ledger.
    pub fn new(
        safe_id: Uuid,
        kind: SafeTransactionKind,
        amount: Money,
        timestamp: DateTime<Utc>,
        performed_by: String,
    ) -> ResultEngine<Self> {
        validate_amount(kind, amount)?;
        Ok(Self {
            id: Uuid::new_v4(),
            safe_id,
            kind,
            amount_minor: amount,
            balance_before_minor: Money::ZERO,
            balance_after_minor: Money::ZERO,
            timestamp,
            shift_id: None,
            reference: None,
            description: None,
            performed_by,
        })
    }
}

impl TryFrom<Model> for SafeTransaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&model.id)?,
            safe_id: parse_id(&model.safe_id)?,
            kind: SafeTransactionKind::try_from(model.kind.as_str())?,
            amount_minor: Money::new(model.amount_minor),
            balance_before_minor: Money::new(model.balance_before_minor),
            balance_after_minor: Money::new(model.balance_after_minor),
            timestamp: model.timestamp,
            shift_id: model.shift_id.as_deref().map(parse_id).transpose()?,
            reference: model.reference,
            description: model.description,
            performed_by: model.performed_by,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "safe_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub safe_id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub balance_before_minor: i64,
    pub balance_after_minor: i64,
    pub timestamp: DateTimeUtc,
    pub sequence: i64,
    pub shift_id: Option<String>,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub performed_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::safes::Entity",
        from = "Column::SafeId",
        to = "super::safes::Column::Id"
    )]
    Safe,
}

impl Related<super::safes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Safe.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&SafeTransaction> for ActiveModel {
    fn from(tx: &SafeTransaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            safe_id: ActiveValue::Set(tx.safe_id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount_minor.minor()),
            balance_before_minor: ActiveValue::Set(tx.balance_before_minor.minor()),
            balance_after_minor: ActiveValue::Set(tx.balance_after_minor.minor()),
            timestamp: ActiveValue::Set(tx.timestamp),
            sequence: ActiveValue::NotSet,
            shift_id: ActiveValue::Set(tx.shift_id.map(|id| id.to_string())),
            reference: ActiveValue::Set(tx.reference.clone()),
            description: ActiveValue::Set(tx.description.clone()),
            performed_by: ActiveValue::Set(tx.performed_by.clone()),
            created_at: ActiveValue::NotSet,
        }
    }
}
