#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Engine, Money, NewNozzleCmd, NewPriceCmd, NewPumperCmd, NewTankCmd, Principal, Quantity, Role,
};
use migration::MigratorTrait;
use uuid::Uuid;

pub struct Fixture {
    pub engine: Engine,
    pub db: DatabaseConnection,
    pub owner: Principal,
    pub viewer: Principal,
    pub station_id: Uuid,
    pub fuel_id: Uuid,
    pub tank_id: Uuid,
    pub nozzle_id: Uuid,
    pub pumper_id: Uuid,
}

pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
}

pub fn litres(value: i64) -> Quantity {
    Quantity::from_whole(value)
}

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .password_cost(4)
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// Organization with an owner, a viewer and one station carrying a single
/// diesel tank, nozzle and pumper.
pub async fn fixture() -> Fixture {
    let (engine, db) = engine_with_db().await;
    let org = engine.new_organization("Lanka Fuels").await.unwrap();
    engine
        .new_user("alice", "secret", org, Role::Owner)
        .await
        .unwrap();
    engine
        .new_user("victor", "secret", org, Role::Viewer)
        .await
        .unwrap();
    let owner = engine.principal("alice").await.unwrap();
    let viewer = engine.principal("victor").await.unwrap();

    let station_id = engine
        .new_station(&owner, "Colombo 07", Some("Ward Place"))
        .await
        .unwrap();
    let fuel_id = engine.new_fuel(&owner, "Diesel").await.unwrap();
    let tank_id = engine
        .new_tank(
            &owner,
            NewTankCmd::new(station_id, fuel_id, "T1", litres(20_000)).current_level(litres(10_000)),
        )
        .await
        .unwrap();
    let nozzle_id = engine
        .new_nozzle(&owner, NewNozzleCmd::new(station_id, tank_id, 1, 1))
        .await
        .unwrap();
    let pumper_id = engine
        .new_pumper(&owner, NewPumperCmd::new("Kamal").station_id(station_id))
        .await
        .unwrap();

    Fixture {
        engine,
        db,
        owner,
        viewer,
        station_id,
        fuel_id,
        tank_id,
        nozzle_id,
        pumper_id,
    }
}

impl Fixture {
    pub async fn set_price(&self, price_minor: i64) {
        self.engine
            .new_price(
                &self.owner,
                NewPriceCmd::new(self.fuel_id, Money::new(price_minor), at(0))
                    .station_id(self.station_id),
            )
            .await
            .unwrap();
    }

    /// A second organization with its own owner.
    pub async fn outsider(&self) -> Principal {
        let org = self.engine.new_organization("Rival").await.unwrap();
        self.engine
            .new_user("mallory", "secret", org, Role::Owner)
            .await
            .unwrap();
        self.engine.principal("mallory").await.unwrap()
    }
}
