//! Pumper-to-nozzle assignments within a shift.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Quantity, util::parse_id};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Active,
    Closed,
}

impl AssignmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Closed => "CLOSED",
        }
    }
}

impl TryFrom<&str> for AssignmentStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "ACTIVE" => Ok(Self::Active),
            "CLOSED" => Ok(Self::Closed),
            other => Err(EngineError::InvalidState(format!(
                "invalid assignment status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftAssignment {
    pub id: Uuid,
    pub shift_id: Uuid,
    pub nozzle_id: Uuid,
    pub pumper_id: Uuid,
    pub start_meter_milli: Quantity,
    pub end_meter_milli: Option<Quantity>,
    pub status: AssignmentStatus,
    pub closed_at: Option<DateTime<Utc>>,
}

impl TryFrom<Model> for ShiftAssignment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&model.id)?,
            shift_id: parse_id(&model.shift_id)?,
            nozzle_id: parse_id(&model.nozzle_id)?,
            pumper_id: parse_id(&model.pumper_id)?,
            start_meter_milli: Quantity::from_milli(model.start_meter_milli),
            end_meter_milli: model.end_meter_milli.map(Quantity::from_milli),
            status: AssignmentStatus::try_from(model.status.as_str())?,
            closed_at: model.closed_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "shift_assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub shift_id: String,
    pub nozzle_id: String,
    pub pumper_id: String,
    pub start_meter_milli: i64,
    pub end_meter_milli: Option<i64>,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub closed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shifts::Entity",
        from = "Column::ShiftId",
        to = "super::shifts::Column::Id"
    )]
    Shift,
}

impl Related<super::shifts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shift.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
