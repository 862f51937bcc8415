//! Credit customers with their sales and payments.

use sea_orm_migration::prelude::*;

use crate::m20240301_000001_tenancy::{Fuels, Organizations, Stations};
use crate::m20240301_000002_shifts::Shifts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum CreditCustomers {
    Table,
    Id,
    OrganizationId,
    Name,
    Phone,
    CreditLimitMinor,
    BalanceMinor,
    CreatedAt,
}

#[derive(Iden)]
enum CreditSales {
    Table,
    Id,
    CustomerId,
    StationId,
    ShiftId,
    FuelId,
    AmountMinor,
    LitresMilli,
    Timestamp,
    RecordedBy,
}

#[derive(Iden)]
enum CreditPayments {
    Table,
    Id,
    CustomerId,
    StationId,
    AmountMinor,
    Method,
    Reference,
    Timestamp,
    RecordedBy,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CreditCustomers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CreditCustomers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CreditCustomers::OrganizationId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CreditCustomers::Name).string().not_null())
                    .col(ColumnDef::new(CreditCustomers::Phone).string())
                    .col(
                        ColumnDef::new(CreditCustomers::CreditLimitMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CreditCustomers::BalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CreditCustomers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-credit_customers-organization_id")
                            .from(CreditCustomers::Table, CreditCustomers::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CreditSales::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CreditSales::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CreditSales::CustomerId).string().not_null())
                    .col(ColumnDef::new(CreditSales::StationId).string())
                    .col(ColumnDef::new(CreditSales::ShiftId).string())
                    .col(ColumnDef::new(CreditSales::FuelId).string())
                    .col(ColumnDef::new(CreditSales::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(CreditSales::LitresMilli).big_integer())
                    .col(
                        ColumnDef::new(CreditSales::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CreditSales::RecordedBy).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-credit_sales-customer_id")
                            .from(CreditSales::Table, CreditSales::CustomerId)
                            .to(CreditCustomers::Table, CreditCustomers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-credit_sales-station_id")
                            .from(CreditSales::Table, CreditSales::StationId)
                            .to(Stations::Table, Stations::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-credit_sales-shift_id")
                            .from(CreditSales::Table, CreditSales::ShiftId)
                            .to(Shifts::Table, Shifts::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-credit_sales-fuel_id")
                            .from(CreditSales::Table, CreditSales::FuelId)
                            .to(Fuels::Table, Fuels::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-credit_sales-customer_id-timestamp")
                    .table(CreditSales::Table)
                    .col(CreditSales::CustomerId)
                    .col(CreditSales::Timestamp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CreditPayments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CreditPayments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CreditPayments::CustomerId).string().not_null())
                    .col(ColumnDef::new(CreditPayments::StationId).string())
                    .col(
                        ColumnDef::new(CreditPayments::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CreditPayments::Method).string().not_null())
                    .col(ColumnDef::new(CreditPayments::Reference).string())
                    .col(
                        ColumnDef::new(CreditPayments::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CreditPayments::RecordedBy).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-credit_payments-customer_id")
                            .from(CreditPayments::Table, CreditPayments::CustomerId)
                            .to(CreditCustomers::Table, CreditCustomers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-credit_payments-station_id")
                            .from(CreditPayments::Table, CreditPayments::StationId)
                            .to(Stations::Table, Stations::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-credit_payments-customer_id-timestamp")
                    .table(CreditPayments::Table)
                    .col(CreditPayments::CustomerId)
                    .col(CreditPayments::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CreditPayments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CreditSales::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CreditCustomers::Table).to_owned())
            .await?;
        Ok(())
    }
}
