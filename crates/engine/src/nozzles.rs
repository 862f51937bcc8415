//! Nozzles. The fuel a nozzle dispenses is the fuel of its tank.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "nozzles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub station_id: String,
    pub tank_id: String,
    pub pump_number: i32,
    pub nozzle_number: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tanks::Entity",
        from = "Column::TankId",
        to = "super::tanks::Column::Id"
    )]
    Tank,
}

impl Related<super::tanks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tank.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
