//! Tenants, logins and station infrastructure.
//!
//! - `organizations`: tenants, carrying the variance tolerance
//! - `users`: Basic auth logins with a role inside one organization
//! - `stations`, `fuels`, `tanks`, `nozzles`, `pumpers`
//! - `fuel_prices`: per station or organization-wide price rows

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub(crate) enum Organizations {
    Table,
    Id,
    Name,
    ToleranceBp,
    ToleranceFlatMinor,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
    OrganizationId,
    Role,
}

#[derive(Iden)]
pub(crate) enum Stations {
    Table,
    Id,
    OrganizationId,
    Name,
    Location,
    CreatedAt,
}

#[derive(Iden)]
pub(crate) enum Fuels {
    Table,
    Id,
    OrganizationId,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum FuelPrices {
    Table,
    Id,
    OrganizationId,
    FuelId,
    StationId,
    PriceMinor,
    EffectiveDate,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
pub(crate) enum Tanks {
    Table,
    Id,
    StationId,
    FuelId,
    Name,
    CapacityMilli,
    CurrentLevelMilli,
}

#[derive(Iden)]
pub(crate) enum Nozzles {
    Table,
    Id,
    StationId,
    TankId,
    PumpNumber,
    NozzleNumber,
}

#[derive(Iden)]
pub(crate) enum Pumpers {
    Table,
    Id,
    OrganizationId,
    StationId,
    Name,
    EmployeeCode,
    Active,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Organizations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Organizations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Organizations::Name).string().not_null())
                    .col(
                        ColumnDef::new(Organizations::ToleranceBp)
                            .big_integer()
                            .not_null()
                            .default(30),
                    )
                    .col(
                        ColumnDef::new(Organizations::ToleranceFlatMinor)
                            .big_integer()
                            .not_null()
                            .default(20_000),
                    )
                    .col(
                        ColumnDef::new(Organizations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::OrganizationId).string().not_null())
                    .col(ColumnDef::new(Users::Role).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-users-organization_id")
                            .from(Users::Table, Users::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Stations::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Stations::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Stations::OrganizationId).string().not_null())
                    .col(ColumnDef::new(Stations::Name).string().not_null())
                    .col(ColumnDef::new(Stations::Location).string())
                    .col(
                        ColumnDef::new(Stations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-stations-organization_id")
                            .from(Stations::Table, Stations::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-stations-organization_id")
                    .table(Stations::Table)
                    .col(Stations::OrganizationId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Fuels::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Fuels::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Fuels::OrganizationId).string().not_null())
                    .col(ColumnDef::new(Fuels::Name).string().not_null())
                    .col(
                        ColumnDef::new(Fuels::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-fuels-organization_id")
                            .from(Fuels::Table, Fuels::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FuelPrices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FuelPrices::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FuelPrices::OrganizationId).string().not_null())
                    .col(ColumnDef::new(FuelPrices::FuelId).string().not_null())
                    .col(ColumnDef::new(FuelPrices::StationId).string())
                    .col(ColumnDef::new(FuelPrices::PriceMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(FuelPrices::EffectiveDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FuelPrices::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(FuelPrices::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-fuel_prices-fuel_id")
                            .from(FuelPrices::Table, FuelPrices::FuelId)
                            .to(Fuels::Table, Fuels::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-fuel_prices-station_id")
                            .from(FuelPrices::Table, FuelPrices::StationId)
                            .to(Stations::Table, Stations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-fuel_prices-fuel_id-effective_date")
                    .table(FuelPrices::Table)
                    .col(FuelPrices::FuelId)
                    .col(FuelPrices::EffectiveDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tanks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tanks::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Tanks::StationId).string().not_null())
                    .col(ColumnDef::new(Tanks::FuelId).string().not_null())
                    .col(ColumnDef::new(Tanks::Name).string().not_null())
                    .col(ColumnDef::new(Tanks::CapacityMilli).big_integer().not_null())
                    .col(
                        ColumnDef::new(Tanks::CurrentLevelMilli)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-tanks-station_id")
                            .from(Tanks::Table, Tanks::StationId)
                            .to(Stations::Table, Stations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-tanks-fuel_id")
                            .from(Tanks::Table, Tanks::FuelId)
                            .to(Fuels::Table, Fuels::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Nozzles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Nozzles::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Nozzles::StationId).string().not_null())
                    .col(ColumnDef::new(Nozzles::TankId).string().not_null())
                    .col(ColumnDef::new(Nozzles::PumpNumber).integer().not_null())
                    .col(ColumnDef::new(Nozzles::NozzleNumber).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-nozzles-station_id")
                            .from(Nozzles::Table, Nozzles::StationId)
                            .to(Stations::Table, Stations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-nozzles-tank_id")
                            .from(Nozzles::Table, Nozzles::TankId)
                            .to(Tanks::Table, Tanks::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-nozzles-station_id-pump-nozzle-unique")
                    .table(Nozzles::Table)
                    .col(Nozzles::StationId)
                    .col(Nozzles::PumpNumber)
                    .col(Nozzles::NozzleNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Pumpers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Pumpers::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Pumpers::OrganizationId).string().not_null())
                    .col(ColumnDef::new(Pumpers::StationId).string())
                    .col(ColumnDef::new(Pumpers::Name).string().not_null())
                    .col(ColumnDef::new(Pumpers::EmployeeCode).string())
                    .col(
                        ColumnDef::new(Pumpers::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-pumpers-organization_id")
                            .from(Pumpers::Table, Pumpers::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-pumpers-station_id")
                            .from(Pumpers::Table, Pumpers::StationId)
                            .to(Stations::Table, Stations::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Pumpers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Nozzles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tanks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FuelPrices::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Fuels::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Stations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Organizations::Table).to_owned())
            .await?;
        Ok(())
    }
}
