//! Shifts, nozzle assignments and calibration pours.
//!
//! Closed shifts keep their statistics and declared tender as JSON text.

use sea_orm_migration::prelude::*;

use crate::m20240301_000001_tenancy::{Nozzles, Organizations, Pumpers, Stations};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub(crate) enum Shifts {
    Table,
    Id,
    OrganizationId,
    StationId,
    StartTime,
    EndTime,
    Status,
    OpenedBy,
    ClosedBy,
    Statistics,
    DeclaredAmounts,
    CreatedAt,
}

#[derive(Iden)]
enum ShiftAssignments {
    Table,
    Id,
    ShiftId,
    NozzleId,
    PumperId,
    StartMeterMilli,
    EndMeterMilli,
    Status,
    CreatedAt,
    ClosedAt,
}

#[derive(Iden)]
enum TestPours {
    Table,
    Id,
    ShiftId,
    NozzleId,
    LitresMilli,
    Returned,
    Note,
    RecordedBy,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Shifts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Shifts::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Shifts::OrganizationId).string().not_null())
                    .col(ColumnDef::new(Shifts::StationId).string().not_null())
                    .col(
                        ColumnDef::new(Shifts::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Shifts::EndTime).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Shifts::Status)
                            .string()
                            .not_null()
                            .default("OPEN"),
                    )
                    .col(ColumnDef::new(Shifts::OpenedBy).string().not_null())
                    .col(ColumnDef::new(Shifts::ClosedBy).string())
                    .col(ColumnDef::new(Shifts::Statistics).text())
                    .col(ColumnDef::new(Shifts::DeclaredAmounts).text())
                    .col(
                        ColumnDef::new(Shifts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shifts-organization_id")
                            .from(Shifts::Table, Shifts::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shifts-station_id")
                            .from(Shifts::Table, Shifts::StationId)
                            .to(Stations::Table, Stations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-shifts-station_id-status")
                    .table(Shifts::Table)
                    .col(Shifts::StationId)
                    .col(Shifts::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ShiftAssignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShiftAssignments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ShiftAssignments::ShiftId).string().not_null())
                    .col(ColumnDef::new(ShiftAssignments::NozzleId).string().not_null())
                    .col(ColumnDef::new(ShiftAssignments::PumperId).string().not_null())
                    .col(
                        ColumnDef::new(ShiftAssignments::StartMeterMilli)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ShiftAssignments::EndMeterMilli).big_integer())
                    .col(
                        ColumnDef::new(ShiftAssignments::Status)
                            .string()
                            .not_null()
                            .default("ACTIVE"),
                    )
                    .col(
                        ColumnDef::new(ShiftAssignments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ShiftAssignments::ClosedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shift_assignments-shift_id")
                            .from(ShiftAssignments::Table, ShiftAssignments::ShiftId)
                            .to(Shifts::Table, Shifts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shift_assignments-nozzle_id")
                            .from(ShiftAssignments::Table, ShiftAssignments::NozzleId)
                            .to(Nozzles::Table, Nozzles::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shift_assignments-pumper_id")
                            .from(ShiftAssignments::Table, ShiftAssignments::PumperId)
                            .to(Pumpers::Table, Pumpers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-shift_assignments-nozzle_id-status")
                    .table(ShiftAssignments::Table)
                    .col(ShiftAssignments::NozzleId)
                    .col(ShiftAssignments::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TestPours::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TestPours::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(TestPours::ShiftId).string().not_null())
                    .col(ColumnDef::new(TestPours::NozzleId).string().not_null())
                    .col(ColumnDef::new(TestPours::LitresMilli).big_integer().not_null())
                    .col(
                        ColumnDef::new(TestPours::Returned)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(TestPours::Note).string())
                    .col(ColumnDef::new(TestPours::RecordedBy).string().not_null())
                    .col(
                        ColumnDef::new(TestPours::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-test_pours-shift_id")
                            .from(TestPours::Table, TestPours::ShiftId)
                            .to(Shifts::Table, Shifts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-test_pours-nozzle_id")
                            .from(TestPours::Table, TestPours::NozzleId)
                            .to(Nozzles::Table, Nozzles::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestPours::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ShiftAssignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Shifts::Table).to_owned())
            .await?;
        Ok(())
    }
}
