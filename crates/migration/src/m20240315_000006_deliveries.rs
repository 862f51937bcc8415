//! Tanker deliveries, verified by dipping the tank.

use sea_orm_migration::prelude::*;

use crate::m20240301_000001_tenancy::{Organizations, Stations, Tanks};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Deliveries {
    Table,
    Id,
    OrganizationId,
    StationId,
    TankId,
    Supplier,
    InvoiceNumber,
    InvoiceQuantityMilli,
    BeforeDipMilli,
    AfterDipMilli,
    SoldDuringMilli,
    ReceivedMilli,
    Status,
    DeliveredAt,
    RecordedBy,
    VerifiedBy,
    VerifiedAt,
    Notes,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Deliveries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Deliveries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Deliveries::OrganizationId).string().not_null())
                    .col(ColumnDef::new(Deliveries::StationId).string().not_null())
                    .col(ColumnDef::new(Deliveries::TankId).string().not_null())
                    .col(ColumnDef::new(Deliveries::Supplier).string().not_null())
                    .col(ColumnDef::new(Deliveries::InvoiceNumber).string())
                    .col(
                        ColumnDef::new(Deliveries::InvoiceQuantityMilli)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Deliveries::BeforeDipMilli)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Deliveries::AfterDipMilli).big_integer())
                    .col(
                        ColumnDef::new(Deliveries::SoldDuringMilli)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Deliveries::ReceivedMilli).big_integer())
                    .col(
                        ColumnDef::new(Deliveries::Status)
                            .string()
                            .not_null()
                            .default("PENDING_VERIFICATION"),
                    )
                    .col(
                        ColumnDef::new(Deliveries::DeliveredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Deliveries::RecordedBy).string().not_null())
                    .col(ColumnDef::new(Deliveries::VerifiedBy).string())
                    .col(ColumnDef::new(Deliveries::VerifiedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Deliveries::Notes).text())
                    .col(
                        ColumnDef::new(Deliveries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-deliveries-organization_id")
                            .from(Deliveries::Table, Deliveries::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-deliveries-station_id")
                            .from(Deliveries::Table, Deliveries::StationId)
                            .to(Stations::Table, Stations::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-deliveries-tank_id")
                            .from(Deliveries::Table, Deliveries::TankId)
                            .to(Tanks::Table, Tanks::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-deliveries-tank_id-delivered_at")
                    .table(Deliveries::Table)
                    .col(Deliveries::TankId)
                    .col(Deliveries::DeliveredAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Deliveries::Table).to_owned())
            .await?;
        Ok(())
    }
}
