//! Fuel station back office engine.
//!
//! The engine owns the database entities and every business rule:
//!
//! - shift lifecycle and close variance ([`meter`], [`variance`]),
//! - the station safe ledger ([`ledger`]),
//! - FIFO consumption of shop stock ([`fifo`]),
//! - fuel deliveries checked by dipping ([`delivery`]),
//! - credit accounts, prices and station infrastructure.
//!
//! All operations go through [`Engine`] and are scoped to the caller's
//! organization via a [`Principal`].

pub use commands::{
    AssignPumperCmd, CloseShiftCmd, CreditPaymentCmd, CreditSaleCmd, NewCustomerCmd,
    NewDeliveryCmd, NewNozzleCmd, NewPriceCmd, NewProductCmd, NewPumperCmd, NewTankCmd,
    PurchaseCmd, SafeTransactionCmd, SafeTransactionFilter, TestPourCmd, VerifyDeliveryCmd,
    WastageCmd,
};
pub use credit_customers::CreditCustomer;
pub use credit_payments::{CreditPayment, PaymentMethod};
pub use credit_sales::CreditSale;
pub use deliveries::Delivery;
pub use delivery::DeliveryStatus;
pub use error::EngineError;
pub use fuel_prices::{FALLBACK_PRICE, PriceSource};
pub use ledger::SafeTransactionKind;
pub use money::Money;
pub use ops::{
    BulkCloseOutcome, BulkCloseReport, EffectivePrice, Engine, EngineBuilder, PendingDeposit,
    Principal, RecomputeOutcome, Reconciliation, Role, WastageOutcome,
};
pub use quantity::Quantity;
pub use safe_transactions::SafeTransaction;
pub use safes::Safe;
pub use shift_assignments::{AssignmentStatus, ShiftAssignment};
pub use shifts::{FuelBreakdown, PumperBreakdown, Shift, ShiftStatistics, ShiftStatus};
pub use shop_assignments::ShopAssignment;
pub use shop_items::ShopItem;
pub use variance::{Tender, Tolerance, Variance, VarianceStatus};

pub mod delivery;
pub mod fifo;
pub mod ledger;
pub mod meter;
pub mod variance;

mod commands;
mod credit_customers;
mod credit_payments;
mod credit_sales;
mod deliveries;
mod error;
mod fuel_prices;
mod fuels;
mod money;
mod nozzles;
mod ops;
mod organizations;
mod pumpers;
mod quantity;
mod safe_transactions;
mod safes;
mod shift_assignments;
mod shifts;
mod shop_assignments;
mod shop_batches;
mod shop_items;
mod shop_products;
mod shop_sales;
mod shop_wastage;
mod stations;
mod tanks;
mod test_pours;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
