//! Calibration pours drawn from a nozzle during a shift.
//!
//! A `returned` pour goes back into the tank and is subtracted from the
//! litres sold on that nozzle.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "test_pours")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub shift_id: String,
    pub nozzle_id: String,
    pub litres_milli: i64,
    pub returned: bool,
    pub note: Option<String>,
    pub recorded_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
