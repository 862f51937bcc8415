pub use sea_orm_migration::prelude::*;

mod m20240301_000001_tenancy;
mod m20240301_000002_shifts;
mod m20240301_000003_safe;
mod m20240301_000004_shop;
mod m20240301_000005_credit;
mod m20240315_000006_deliveries;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_tenancy::Migration),
            Box::new(m20240301_000002_shifts::Migration),
            Box::new(m20240301_000003_safe::Migration),
            Box::new(m20240301_000004_shop::Migration),
            Box::new(m20240301_000005_credit::Migration),
            Box::new(m20240315_000006_deliveries::Migration),
        ]
    }
}
