//! JSON bodies of the HTTP API.
//!
//! Money is carried as integer minor units (`*_minor`), volumes and stock
//! as integer thousandths (`*_milli`). Request timestamps are RFC3339 with
//! an offset; responses are UTC.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Id of a freshly created row.
#[derive(Debug, Serialize, Deserialize)]
pub struct Created {
    pub id: Uuid,
}

/// Query selecting a station, used by the safe routes.
#[derive(Debug, Serialize, Deserialize)]
pub struct StationQuery {
    pub station_id: Uuid,
}

pub mod setup {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StationNew {
        pub name: String,
        pub location: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FuelNew {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TankNew {
        pub station_id: Uuid,
        pub fuel_id: Uuid,
        pub name: String,
        pub capacity_milli: i64,
        pub current_level_milli: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NozzleNew {
        pub station_id: Uuid,
        pub tank_id: Uuid,
        pub pump_number: i32,
        pub nozzle_number: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PumperNew {
        pub name: String,
        pub station_id: Option<Uuid>,
        pub employee_code: Option<String>,
    }

    /// `None` when the nozzle was never closed.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct LastReading {
        pub nozzle_id: Uuid,
        pub end_meter_milli: Option<i64>,
    }
}

pub mod price {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PriceSource {
        Station,
        Latest,
        Fallback,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PriceNew {
        pub fuel_id: Uuid,
        /// Without a station the price applies organization-wide.
        pub station_id: Option<Uuid>,
        pub price_minor: i64,
        pub effective_date: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EffectivePriceQuery {
        pub fuel_id: Uuid,
        pub station_id: Uuid,
        /// Defaults to now.
        pub at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EffectivePrice {
        pub price_minor: i64,
        pub source: PriceSource,
        pub price_id: Option<Uuid>,
    }
}

pub mod settings {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Tolerance {
        pub basis_points: i64,
        pub flat_minor: i64,
    }
}

pub mod shift {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum ShiftStatus {
        Open,
        Closed,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum AssignmentStatus {
        Active,
        Closed,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum VarianceStatus {
        Normal,
        Suspicious,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShiftNew {
        pub station_id: Uuid,
        /// Defaults to now.
        pub start_time: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ShiftListQuery {
        pub station_id: Option<Uuid>,
        pub status: Option<ShiftStatus>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AssignmentNew {
        pub nozzle_id: Uuid,
        pub pumper_id: Uuid,
        /// Defaults to the nozzle's last closed reading.
        pub start_meter_milli: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AssignmentClose {
        pub end_meter_milli: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TestPourNew {
        pub nozzle_id: Uuid,
        pub litres_milli: i64,
        /// Poured back into the tank; defaults to true.
        pub returned: Option<bool>,
        pub note: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct Tender {
        #[serde(default)]
        pub cash_minor: i64,
        #[serde(default)]
        pub card_minor: i64,
        #[serde(default)]
        pub credit_minor: i64,
        #[serde(default)]
        pub cheque_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShiftClose {
        pub declared: Tender,
        /// Defaults to now.
        pub end_time: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BulkClose {
        pub station_id: Option<Uuid>,
        /// Defaults to now.
        pub end_time: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Assignment {
        pub id: Uuid,
        pub nozzle_id: Uuid,
        pub pumper_id: Uuid,
        pub start_meter_milli: i64,
        pub end_meter_milli: Option<i64>,
        pub status: AssignmentStatus,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Variance {
        pub calculated_minor: i64,
        pub declared_minor: i64,
        /// `calculated - declared`: positive means cash is missing.
        pub variance_minor: i64,
        pub tolerance_minor: i64,
        pub status: VarianceStatus,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PumperBreakdown {
        pub pumper_id: Uuid,
        pub pumper_name: String,
        pub assignments: usize,
        pub litres_milli: i64,
        pub sales_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FuelBreakdown {
        pub fuel_id: Uuid,
        pub fuel_name: String,
        pub price_minor: i64,
        pub price_source: crate::price::PriceSource,
        pub litres_milli: i64,
        pub sales_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Statistics {
        pub duration_minutes: i64,
        pub total_litres_milli: i64,
        pub total_sales_minor: i64,
        pub average_price_minor: i64,
        pub total_assignments: usize,
        pub closed_assignments: usize,
        pub discarded_readings: usize,
        pub pumpers: Vec<PumperBreakdown>,
        pub fuels: Vec<FuelBreakdown>,
        pub variance: Option<Variance>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Shift {
        pub id: Uuid,
        pub station_id: Uuid,
        pub start_time: DateTime<Utc>,
        pub end_time: Option<DateTime<Utc>>,
        pub status: ShiftStatus,
        pub opened_by: String,
        pub closed_by: Option<String>,
        pub statistics: Option<Statistics>,
        pub declared: Option<Tender>,
        pub assignments: Vec<Assignment>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShiftList {
        pub shifts: Vec<Shift>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BulkCloseOutcome {
        pub shift_id: Uuid,
        pub statistics: Option<Statistics>,
        pub error: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BulkCloseReport {
        pub closed: usize,
        pub failed: usize,
        pub outcomes: Vec<BulkCloseOutcome>,
    }
}

pub mod safe {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OpeningBalanceNew {
        pub station_id: Uuid,
        pub amount_minor: i64,
        /// Defaults to now.
        pub timestamp: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SafeTransactionNew {
        pub station_id: Uuid,
        /// One of the `SCREAMING_SNAKE_CASE` ledger kinds, e.g. `CASH_FUEL_SALES`.
        pub kind: String,
        pub amount_minor: i64,
        /// Defaults to now. An earlier timestamp back-dates the row.
        pub timestamp: Option<DateTime<FixedOffset>>,
        pub shift_id: Option<Uuid>,
        pub reference: Option<String>,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SafeTransactionListQuery {
        pub station_id: Uuid,
        pub kind: Option<String>,
        pub from: Option<DateTime<FixedOffset>>,
        pub to: Option<DateTime<FixedOffset>>,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SafeTransaction {
        pub id: Uuid,
        pub kind: String,
        pub amount_minor: i64,
        pub balance_before_minor: i64,
        pub balance_after_minor: i64,
        pub timestamp: DateTime<Utc>,
        pub shift_id: Option<Uuid>,
        pub reference: Option<String>,
        pub description: Option<String>,
        pub performed_by: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SafeTransactionList {
        pub transactions: Vec<SafeTransaction>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Safe {
        pub id: Uuid,
        pub station_id: Uuid,
        pub opening_balance_minor: i64,
        pub current_balance_minor: i64,
        pub updated_at: DateTime<Utc>,
        pub recent_transactions: Vec<SafeTransaction>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Reconciliation {
        pub safe_id: Uuid,
        pub station_id: Uuid,
        pub stored_balance_minor: i64,
        pub calculated_balance_minor: i64,
        pub discrepancy_minor: i64,
        pub is_balanced: bool,
        pub last_opening_balance_minor: i64,
        pub total_income_minor: i64,
        pub total_outflow_minor: i64,
        pub income_count: usize,
        pub outflow_count: usize,
        pub transaction_count: usize,
        pub formula: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Recompute {
        pub safe_id: Uuid,
        pub rows_repaired: usize,
        pub previous_balance_minor: i64,
        pub balance_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PendingDeposit {
        pub shift_id: Uuid,
        pub start_time: DateTime<Utc>,
        pub end_time: Option<DateTime<Utc>>,
        pub declared_cash_minor: i64,
        pub deposited_minor: i64,
        pub pending_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PendingDeposits {
        pub shifts: Vec<PendingDeposit>,
    }
}

pub mod shop {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProductNew {
        pub name: String,
        pub unit: Option<String>,
        pub selling_price_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PurchaseNew {
        pub product_id: Uuid,
        pub quantity_milli: i64,
        pub cost_price_minor: i64,
        /// Defaults to now.
        pub purchase_date: Option<DateTime<FixedOffset>>,
        pub supplier: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShopAssignmentNew {
        pub shift_id: Uuid,
        pub pumper_id: Uuid,
        /// Empty or absent tracks every product.
        #[serde(default)]
        pub product_ids: Vec<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StockAdd {
        pub product_id: Uuid,
        pub quantity_milli: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ClosingStock {
        pub product_id: Uuid,
        pub closing_stock_milli: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShopClose {
        pub items: Vec<ClosingStock>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShopItem {
        pub id: Uuid,
        pub product_id: Uuid,
        pub opening_stock_milli: i64,
        pub added_stock_milli: i64,
        pub closing_stock_milli: Option<i64>,
        pub sold_quantity_milli: Option<i64>,
        pub revenue_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShopAssignment {
        pub id: Uuid,
        pub shift_id: Uuid,
        pub pumper_id: Uuid,
        pub status: crate::shift::ShiftStatus,
        pub total_revenue_minor: i64,
        pub opened_at: DateTime<Utc>,
        pub closed_at: Option<DateTime<Utc>>,
        pub items: Vec<ShopItem>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WastageNew {
        pub product_id: Uuid,
        pub quantity_milli: i64,
        pub reason: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Wastage {
        pub id: Uuid,
        pub drawn_milli: i64,
        /// Quantity no batch could cover.
        pub untracked_milli: i64,
    }
}

pub mod credit {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum PaymentMethod {
        Cash,
        Cheque,
        BankTransfer,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CustomerNew {
        pub name: String,
        pub phone: Option<String>,
        /// Zero or absent means no limit.
        pub credit_limit_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CreditSaleNew {
        pub customer_id: Uuid,
        pub amount_minor: i64,
        pub station_id: Option<Uuid>,
        pub shift_id: Option<Uuid>,
        pub fuel_id: Option<Uuid>,
        pub litres_milli: Option<i64>,
        /// Defaults to now.
        pub timestamp: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CreditPaymentNew {
        pub customer_id: Uuid,
        pub amount_minor: i64,
        pub method: PaymentMethod,
        /// With `CASH`, the payment also enters this station's safe.
        pub station_id: Option<Uuid>,
        pub reference: Option<String>,
        /// Defaults to now.
        pub timestamp: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CreditSale {
        pub id: Uuid,
        pub customer_id: Uuid,
        pub station_id: Option<Uuid>,
        pub shift_id: Option<Uuid>,
        pub fuel_id: Option<Uuid>,
        pub amount_minor: i64,
        pub litres_milli: Option<i64>,
        pub timestamp: DateTime<Utc>,
        pub recorded_by: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CreditPayment {
        pub id: Uuid,
        pub customer_id: Uuid,
        pub station_id: Option<Uuid>,
        pub amount_minor: i64,
        pub method: PaymentMethod,
        pub reference: Option<String>,
        pub timestamp: DateTime<Utc>,
        pub recorded_by: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Customer {
        pub id: Uuid,
        pub name: String,
        pub phone: Option<String>,
        pub credit_limit_minor: i64,
        /// Negative when the customer paid in advance.
        pub balance_minor: i64,
        pub created_at: DateTime<Utc>,
        pub recent_sales: Vec<CreditSale>,
        pub recent_payments: Vec<CreditPayment>,
    }
}

pub mod delivery {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum DeliveryStatus {
        PendingVerification,
        Verified,
        Discrepancy,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DeliveryNew {
        pub tank_id: Uuid,
        pub supplier: String,
        pub invoice_number: Option<String>,
        pub invoice_quantity_milli: i64,
        pub before_dip_milli: i64,
        /// Sold between the before dip and the start of unloading.
        pub sold_before_drop_milli: Option<i64>,
        pub notes: Option<String>,
        /// Defaults to now.
        pub delivered_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DeliveryVerify {
        pub after_dip_milli: i64,
        /// Sold from the tank while it was being filled.
        pub sold_during_milli: Option<i64>,
        pub notes: Option<String>,
        /// Defaults to now.
        pub verified_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DeliveryListQuery {
        pub station_id: Option<Uuid>,
        pub tank_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Delivery {
        pub id: Uuid,
        pub station_id: Uuid,
        pub tank_id: Uuid,
        pub supplier: String,
        pub invoice_number: Option<String>,
        pub invoice_quantity_milli: i64,
        pub before_dip_milli: i64,
        pub after_dip_milli: Option<i64>,
        pub sold_during_milli: i64,
        pub received_milli: Option<i64>,
        /// `received - invoice`, set once verified.
        pub invoice_variance_milli: Option<i64>,
        pub status: DeliveryStatus,
        pub delivered_at: DateTime<Utc>,
        pub recorded_by: String,
        pub verified_by: Option<String>,
        pub verified_at: Option<DateTime<Utc>>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DeliveryList {
        pub deliveries: Vec<Delivery>,
    }
}
