//! Shifts.
//!
//! A `Shift` is the working period of a station. While it is `OPEN`, pumpers
//! are assigned to nozzles; closing it freezes the statistics and the
//! declared tender as JSON blobs on the row.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Money, PriceSource, Quantity, ResultEngine, ShiftAssignment,
    util::parse_id,
    variance::{Tender, Variance},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftStatus {
    Open,
    Closed,
}

impl ShiftStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        }
    }
}

impl TryFrom<&str> for ShiftStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "OPEN" => Ok(Self::Open),
            "CLOSED" => Ok(Self::Closed),
            other => Err(EngineError::InvalidState(format!(
                "invalid shift status: {other}"
            ))),
        }
    }
}

/// Litres and sales attributed to one pumper.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PumperBreakdown {
    pub pumper_id: Uuid,
    pub pumper_name: String,
    pub assignments: usize,
    pub litres_milli: Quantity,
    pub sales_minor: Money,
}

/// Litres and sales for one fuel, with the price used.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelBreakdown {
    pub fuel_id: Uuid,
    pub fuel_name: String,
    pub price_minor: Money,
    pub price_source: PriceSource,
    pub litres_milli: Quantity,
    pub sales_minor: Money,
}

/// Figures computed from the assignments of a shift.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftStatistics {
    pub duration_minutes: i64,
    pub total_litres_milli: Quantity,
    pub total_sales_minor: Money,
    /// Total sales over total litres, zero when nothing was dispensed.
    pub average_price_minor: Money,
    pub total_assignments: usize,
    pub closed_assignments: usize,
    /// Readings that went backwards without a rollover and were counted as zero.
    pub discarded_readings: usize,
    pub pumpers: Vec<PumperBreakdown>,
    pub fuels: Vec<FuelBreakdown>,
    /// Present once the shift is closed.
    pub variance: Option<Variance>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    pub id: Uuid,
    pub station_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: ShiftStatus,
    pub opened_by: String,
    pub closed_by: Option<String>,
    pub statistics: Option<ShiftStatistics>,
    pub declared_amounts: Option<Tender>,
    pub assignments: Vec<ShiftAssignment>,
}

impl TryFrom<Model> for Shift {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let statistics = model
            .statistics
            .as_deref()
            .map(serde_json::from_str::<ShiftStatistics>)
            .transpose()
            .map_err(|err| EngineError::InvalidState(format!("corrupt statistics: {err}")))?;
        let declared_amounts = model
            .declared_amounts
            .as_deref()
            .map(serde_json::from_str::<Tender>)
            .transpose()
            .map_err(|err| {
                EngineError::InvalidState(format!("corrupt declared amounts: {err}"))
            })?;
        Ok(Self {
            id: parse_id(&model.id)?,
            station_id: parse_id(&model.station_id)?,
            start_time: model.start_time,
            end_time: model.end_time,
            status: ShiftStatus::try_from(model.status.as_str())?,
            opened_by: model.opened_by,
            closed_by: model.closed_by,
            statistics,
            declared_amounts,
            assignments: Vec::new(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "shifts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub organization_id: String,
    pub station_id: String,
    pub start_time: DateTimeUtc,
    pub end_time: Option<DateTimeUtc>,
    pub status: String,
    pub opened_by: String,
    pub closed_by: Option<String>,
    pub statistics: Option<String>,
    pub declared_amounts: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::shift_assignments::Entity")]
    Assignments,
}

impl Related<super::shift_assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn encode_json<T: Serialize>(value: &T) -> ResultEngine<String> {
    serde_json::to_string(value)
        .map_err(|err| EngineError::InvalidState(format!("cannot encode shift data: {err}")))
}
