//! Station safes and their ledger.
//!
//! `sequence` is a per-safe insertion counter; `(timestamp, sequence)` is
//! the chronological order replays walk.

use sea_orm_migration::prelude::*;

use crate::{
    m20240301_000001_tenancy::{Organizations, Stations},
    m20240301_000002_shifts::Shifts,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Safes {
    Table,
    Id,
    OrganizationId,
    StationId,
    OpeningBalanceMinor,
    CurrentBalanceMinor,
    UpdatedAt,
}

#[derive(Iden)]
enum SafeTransactions {
    Table,
    Id,
    SafeId,
    Kind,
    AmountMinor,
    BalanceBeforeMinor,
    BalanceAfterMinor,
    Timestamp,
    Sequence,
    ShiftId,
    Reference,
    Description,
    PerformedBy,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Safes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Safes::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Safes::OrganizationId).string().not_null())
                    .col(
                        ColumnDef::new(Safes::StationId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Safes::OpeningBalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Safes::CurrentBalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Safes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-safes-organization_id")
                            .from(Safes::Table, Safes::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-safes-station_id")
                            .from(Safes::Table, Safes::StationId)
                            .to(Stations::Table, Stations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SafeTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SafeTransactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SafeTransactions::SafeId).string().not_null())
                    .col(ColumnDef::new(SafeTransactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(SafeTransactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SafeTransactions::BalanceBeforeMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SafeTransactions::BalanceAfterMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SafeTransactions::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SafeTransactions::Sequence)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SafeTransactions::ShiftId).string())
                    .col(ColumnDef::new(SafeTransactions::Reference).string())
                    .col(ColumnDef::new(SafeTransactions::Description).string())
                    .col(ColumnDef::new(SafeTransactions::PerformedBy).string().not_null())
                    .col(
                        ColumnDef::new(SafeTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-safe_transactions-safe_id")
                            .from(SafeTransactions::Table, SafeTransactions::SafeId)
                            .to(Safes::Table, Safes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-safe_transactions-shift_id")
                            .from(SafeTransactions::Table, SafeTransactions::ShiftId)
                            .to(Shifts::Table, Shifts::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-safe_transactions-safe_id-timestamp-sequence")
                    .table(SafeTransactions::Table)
                    .col(SafeTransactions::SafeId)
                    .col(SafeTransactions::Timestamp)
                    .col(SafeTransactions::Sequence)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-safe_transactions-safe_id-sequence-unique")
                    .table(SafeTransactions::Table)
                    .col(SafeTransactions::SafeId)
                    .col(SafeTransactions::Sequence)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SafeTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Safes::Table).to_owned())
            .await?;
        Ok(())
    }
}
