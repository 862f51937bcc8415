//! Shop products, purchase batches and per-shift counters.

use sea_orm_migration::prelude::*;

use crate::{
    m20240301_000001_tenancy::{Organizations, Pumpers},
    m20240301_000002_shifts::Shifts,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum ShopProducts {
    Table,
    Id,
    OrganizationId,
    Name,
    Unit,
    SellingPriceMinor,
    CreatedAt,
}

#[derive(Iden)]
enum ShopBatches {
    Table,
    Id,
    ProductId,
    PurchaseDate,
    CostPriceMinor,
    OriginalQuantityMilli,
    CurrentQuantityMilli,
    Supplier,
    CreatedAt,
}

#[derive(Iden)]
enum ShopAssignments {
    Table,
    Id,
    ShiftId,
    PumperId,
    Status,
    TotalRevenueMinor,
    OpenedAt,
    ClosedAt,
}

#[derive(Iden)]
enum ShopItems {
    Table,
    Id,
    AssignmentId,
    ProductId,
    OpeningStockMilli,
    AddedStockMilli,
    ClosingStockMilli,
    SoldQuantityMilli,
    RevenueMinor,
}

#[derive(Iden)]
enum ShopSales {
    Table,
    Id,
    ItemId,
    ProductId,
    BatchId,
    QuantityMilli,
    CostPriceMinor,
    SellingPriceMinor,
    CreatedAt,
}

#[derive(Iden)]
enum ShopWastage {
    Table,
    Id,
    ProductId,
    QuantityMilli,
    Reason,
    RecordedBy,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ShopProducts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShopProducts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ShopProducts::OrganizationId).string().not_null())
                    .col(ColumnDef::new(ShopProducts::Name).string().not_null())
                    .col(
                        ColumnDef::new(ShopProducts::Unit)
                            .string()
                            .not_null()
                            .default("unit"),
                    )
                    .col(
                        ColumnDef::new(ShopProducts::SellingPriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShopProducts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shop_products-organization_id")
                            .from(ShopProducts::Table, ShopProducts::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ShopBatches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShopBatches::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ShopBatches::ProductId).string().not_null())
                    .col(
                        ColumnDef::new(ShopBatches::PurchaseDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShopBatches::CostPriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShopBatches::OriginalQuantityMilli)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShopBatches::CurrentQuantityMilli)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ShopBatches::Supplier).string())
                    .col(
                        ColumnDef::new(ShopBatches::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shop_batches-product_id")
                            .from(ShopBatches::Table, ShopBatches::ProductId)
                            .to(ShopProducts::Table, ShopProducts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-shop_batches-product_id-purchase_date")
                    .table(ShopBatches::Table)
                    .col(ShopBatches::ProductId)
                    .col(ShopBatches::PurchaseDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ShopAssignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShopAssignments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ShopAssignments::ShiftId).string().not_null())
                    .col(ColumnDef::new(ShopAssignments::PumperId).string().not_null())
                    .col(
                        ColumnDef::new(ShopAssignments::Status)
                            .string()
                            .not_null()
                            .default("OPEN"),
                    )
                    .col(
                        ColumnDef::new(ShopAssignments::TotalRevenueMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ShopAssignments::OpenedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ShopAssignments::ClosedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shop_assignments-shift_id")
                            .from(ShopAssignments::Table, ShopAssignments::ShiftId)
                            .to(Shifts::Table, Shifts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shop_assignments-pumper_id")
                            .from(ShopAssignments::Table, ShopAssignments::PumperId)
                            .to(Pumpers::Table, Pumpers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ShopItems::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ShopItems::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(ShopItems::AssignmentId).string().not_null())
                    .col(ColumnDef::new(ShopItems::ProductId).string().not_null())
                    .col(
                        ColumnDef::new(ShopItems::OpeningStockMilli)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShopItems::AddedStockMilli)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ShopItems::ClosingStockMilli).big_integer())
                    .col(ColumnDef::new(ShopItems::SoldQuantityMilli).big_integer())
                    .col(ColumnDef::new(ShopItems::RevenueMinor).big_integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shop_items-assignment_id")
                            .from(ShopItems::Table, ShopItems::AssignmentId)
                            .to(ShopAssignments::Table, ShopAssignments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shop_items-product_id")
                            .from(ShopItems::Table, ShopItems::ProductId)
                            .to(ShopProducts::Table, ShopProducts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-shop_items-assignment_id-product_id-unique")
                    .table(ShopItems::Table)
                    .col(ShopItems::AssignmentId)
                    .col(ShopItems::ProductId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ShopSales::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ShopSales::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(ShopSales::ItemId).string().not_null())
                    .col(ColumnDef::new(ShopSales::ProductId).string().not_null())
                    .col(ColumnDef::new(ShopSales::BatchId).string())
                    .col(ColumnDef::new(ShopSales::QuantityMilli).big_integer().not_null())
                    .col(ColumnDef::new(ShopSales::CostPriceMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(ShopSales::SellingPriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShopSales::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shop_sales-item_id")
                            .from(ShopSales::Table, ShopSales::ItemId)
                            .to(ShopItems::Table, ShopItems::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shop_sales-batch_id")
                            .from(ShopSales::Table, ShopSales::BatchId)
                            .to(ShopBatches::Table, ShopBatches::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ShopWastage::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShopWastage::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ShopWastage::ProductId).string().not_null())
                    .col(
                        ColumnDef::new(ShopWastage::QuantityMilli)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ShopWastage::Reason).string())
                    .col(ColumnDef::new(ShopWastage::RecordedBy).string().not_null())
                    .col(
                        ColumnDef::new(ShopWastage::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shop_wastage-product_id")
                            .from(ShopWastage::Table, ShopWastage::ProductId)
                            .to(ShopProducts::Table, ShopProducts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ShopWastage::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ShopSales::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ShopItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ShopAssignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ShopBatches::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ShopProducts::Table).to_owned())
            .await?;
        Ok(())
    }
}
