//! Command structs for engine operations.
//!
//! These types group parameters for write operations (setup, shifts, safe,
//! shop, credit), keeping call sites readable and avoiding long argument
//! lists. Optional fields are set through `#[must_use]` builder methods.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Money, PaymentMethod, Quantity, ledger::SafeTransactionKind, variance::Tender};

/// Create a tank at a station.
#[derive(Clone, Debug)]
pub struct NewTankCmd {
    pub station_id: Uuid,
    pub fuel_id: Uuid,
    pub name: String,
    pub capacity: Quantity,
    pub current_level: Quantity,
}

impl NewTankCmd {
    #[must_use]
    pub fn new(station_id: Uuid, fuel_id: Uuid, name: impl Into<String>, capacity: Quantity) -> Self {
        Self {
            station_id,
            fuel_id,
            name: name.into(),
            capacity,
            current_level: Quantity::ZERO,
        }
    }

    #[must_use]
    pub fn current_level(mut self, level: Quantity) -> Self {
        self.current_level = level;
        self
    }
}

/// Create a nozzle on a pump, fed by a tank.
#[derive(Clone, Debug)]
pub struct NewNozzleCmd {
    pub station_id: Uuid,
    pub tank_id: Uuid,
    pub pump_number: i32,
    pub nozzle_number: i32,
}

impl NewNozzleCmd {
    #[must_use]
    pub fn new(station_id: Uuid, tank_id: Uuid, pump_number: i32, nozzle_number: i32) -> Self {
        Self {
            station_id,
            tank_id,
            pump_number,
            nozzle_number,
        }
    }
}

/// Create a pumper, optionally bound to a station.
#[derive(Clone, Debug)]
pub struct NewPumperCmd {
    pub name: String,
    pub station_id: Option<Uuid>,
    pub employee_code: Option<String>,
}

impl NewPumperCmd {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            station_id: None,
            employee_code: None,
        }
    }

    #[must_use]
    pub fn station_id(mut self, station_id: Uuid) -> Self {
        self.station_id = Some(station_id);
        self
    }

    #[must_use]
    pub fn employee_code(mut self, code: impl Into<String>) -> Self {
        self.employee_code = Some(code.into());
        self
    }
}

/// Add a price row for a fuel. Without a station the price applies to the
/// whole organization.
#[derive(Clone, Debug)]
pub struct NewPriceCmd {
    pub fuel_id: Uuid,
    pub station_id: Option<Uuid>,
    pub price: Money,
    pub effective_date: DateTime<Utc>,
}

impl NewPriceCmd {
    #[must_use]
    pub fn new(fuel_id: Uuid, price: Money, effective_date: DateTime<Utc>) -> Self {
        Self {
            fuel_id,
            station_id: None,
            price,
            effective_date,
        }
    }

    #[must_use]
    pub fn station_id(mut self, station_id: Uuid) -> Self {
        self.station_id = Some(station_id);
        self
    }
}

/// Assign a pumper to a nozzle in an open shift.
#[derive(Clone, Debug)]
pub struct AssignPumperCmd {
    pub shift_id: Uuid,
    pub nozzle_id: Uuid,
    pub pumper_id: Uuid,
    /// Defaults to the nozzle's last closed reading, or zero.
    pub start_meter: Option<Quantity>,
}

impl AssignPumperCmd {
    #[must_use]
    pub fn new(shift_id: Uuid, nozzle_id: Uuid, pumper_id: Uuid) -> Self {
        Self {
            shift_id,
            nozzle_id,
            pumper_id,
            start_meter: None,
        }
    }

    #[must_use]
    pub fn start_meter(mut self, reading: Quantity) -> Self {
        self.start_meter = Some(reading);
        self
    }
}

/// Record a calibration pour.
#[derive(Clone, Debug)]
pub struct TestPourCmd {
    pub shift_id: Uuid,
    pub nozzle_id: Uuid,
    pub litres: Quantity,
    pub returned: bool,
    pub note: Option<String>,
}

impl TestPourCmd {
    #[must_use]
    pub fn new(shift_id: Uuid, nozzle_id: Uuid, litres: Quantity) -> Self {
        Self {
            shift_id,
            nozzle_id,
            litres,
            returned: true,
            note: None,
        }
    }

    #[must_use]
    pub fn returned(mut self, returned: bool) -> Self {
        self.returned = returned;
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Close a shift with the tender the manager counted.
#[derive(Clone, Debug)]
pub struct CloseShiftCmd {
    pub shift_id: Uuid,
    pub tender: Tender,
    pub end_time: DateTime<Utc>,
}

impl CloseShiftCmd {
    #[must_use]
    pub fn new(shift_id: Uuid, tender: Tender, end_time: DateTime<Utc>) -> Self {
        Self {
            shift_id,
            tender,
            end_time,
        }
    }
}

/// Record a safe ledger row.
#[derive(Clone, Debug)]
pub struct SafeTransactionCmd {
    pub station_id: Uuid,
    pub kind: SafeTransactionKind,
    pub amount: Money,
    pub timestamp: DateTime<Utc>,
    pub shift_id: Option<Uuid>,
    pub reference: Option<String>,
    pub description: Option<String>,
}

impl SafeTransactionCmd {
    #[must_use]
    pub fn new(
        station_id: Uuid,
        kind: SafeTransactionKind,
        amount: Money,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            station_id,
            kind,
            amount,
            timestamp,
            shift_id: None,
            reference: None,
            description: None,
        }
    }

    #[must_use]
    pub fn shift_id(mut self, shift_id: Uuid) -> Self {
        self.shift_id = Some(shift_id);
        self
    }

    #[must_use]
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Filters for listing safe transactions.
#[derive(Clone, Debug, Default)]
pub struct SafeTransactionFilter {
    pub kind: Option<SafeTransactionKind>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<u64>,
}

/// Create a shop product.
#[derive(Clone, Debug)]
pub struct NewProductCmd {
    pub name: String,
    pub unit: String,
    pub selling_price: Money,
}

impl NewProductCmd {
    #[must_use]
    pub fn new(name: impl Into<String>, selling_price: Money) -> Self {
        Self {
            name: name.into(),
            unit: "unit".to_string(),
            selling_price,
        }
    }

    #[must_use]
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }
}

/// Record a purchase batch for a product.
#[derive(Clone, Debug)]
pub struct PurchaseCmd {
    pub product_id: Uuid,
    pub quantity: Quantity,
    pub cost_price: Money,
    pub purchase_date: DateTime<Utc>,
    pub supplier: Option<String>,
}

impl PurchaseCmd {
    #[must_use]
    pub fn new(
        product_id: Uuid,
        quantity: Quantity,
        cost_price: Money,
        purchase_date: DateTime<Utc>,
    ) -> Self {
        Self {
            product_id,
            quantity,
            cost_price,
            purchase_date,
            supplier: None,
        }
    }

    #[must_use]
    pub fn supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = Some(supplier.into());
        self
    }
}

/// Record wasted shop stock.
#[derive(Clone, Debug)]
pub struct WastageCmd {
    pub product_id: Uuid,
    pub quantity: Quantity,
    pub reason: Option<String>,
}

impl WastageCmd {
    #[must_use]
    pub fn new(product_id: Uuid, quantity: Quantity) -> Self {
        Self {
            product_id,
            quantity,
            reason: None,
        }
    }

    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Record a tanker delivery with its dip before unloading.
#[derive(Clone, Debug)]
pub struct NewDeliveryCmd {
    pub tank_id: Uuid,
    pub supplier: String,
    pub invoice_quantity: Quantity,
    pub before_dip: Quantity,
    pub delivered_at: DateTime<Utc>,
    pub invoice_number: Option<String>,
    /// Sold since the before dip but before unloading started.
    pub sold_before_drop: Quantity,
    pub notes: Option<String>,
}

impl NewDeliveryCmd {
    #[must_use]
    pub fn new(
        tank_id: Uuid,
        supplier: impl Into<String>,
        invoice_quantity: Quantity,
        before_dip: Quantity,
        delivered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tank_id,
            supplier: supplier.into(),
            invoice_quantity,
            before_dip,
            delivered_at,
            invoice_number: None,
            sold_before_drop: Quantity::ZERO,
            notes: None,
        }
    }

    #[must_use]
    pub fn invoice_number(mut self, number: impl Into<String>) -> Self {
        self.invoice_number = Some(number.into());
        self
    }

    #[must_use]
    pub fn sold_before_drop(mut self, litres: Quantity) -> Self {
        self.sold_before_drop = litres;
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Dip a delivered tank after unloading.
#[derive(Clone, Debug)]
pub struct VerifyDeliveryCmd {
    pub delivery_id: Uuid,
    pub after_dip: Quantity,
    /// Dispensed from the tank while it was being filled.
    pub sold_during: Quantity,
    pub verified_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl VerifyDeliveryCmd {
    #[must_use]
    pub fn new(delivery_id: Uuid, after_dip: Quantity, verified_at: DateTime<Utc>) -> Self {
        Self {
            delivery_id,
            after_dip,
            sold_during: Quantity::ZERO,
            verified_at,
            notes: None,
        }
    }

    #[must_use]
    pub fn sold_during(mut self, litres: Quantity) -> Self {
        self.sold_during = litres;
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Create a credit customer.
#[derive(Clone, Debug)]
pub struct NewCustomerCmd {
    pub name: String,
    pub phone: Option<String>,
    pub credit_limit: Money,
}

impl NewCustomerCmd {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: None,
            credit_limit: Money::ZERO,
        }
    }

    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    #[must_use]
    pub fn credit_limit(mut self, limit: Money) -> Self {
        self.credit_limit = limit;
        self
    }
}

/// Sell fuel on credit.
#[derive(Clone, Debug)]
pub struct CreditSaleCmd {
    pub customer_id: Uuid,
    pub amount: Money,
    pub timestamp: DateTime<Utc>,
    pub station_id: Option<Uuid>,
    pub shift_id: Option<Uuid>,
    pub fuel_id: Option<Uuid>,
    pub litres: Option<Quantity>,
}

impl CreditSaleCmd {
    #[must_use]
    pub fn new(customer_id: Uuid, amount: Money, timestamp: DateTime<Utc>) -> Self {
        Self {
            customer_id,
            amount,
            timestamp,
            station_id: None,
            shift_id: None,
            fuel_id: None,
            litres: None,
        }
    }

    #[must_use]
    pub fn station_id(mut self, station_id: Uuid) -> Self {
        self.station_id = Some(station_id);
        self
    }

    #[must_use]
    pub fn shift_id(mut self, shift_id: Uuid) -> Self {
        self.shift_id = Some(shift_id);
        self
    }

    #[must_use]
    pub fn fuel(mut self, fuel_id: Uuid, litres: Quantity) -> Self {
        self.fuel_id = Some(fuel_id);
        self.litres = Some(litres);
        self
    }
}

/// Receive a payment against a credit balance.
#[derive(Clone, Debug)]
pub struct CreditPaymentCmd {
    pub customer_id: Uuid,
    pub amount: Money,
    pub method: PaymentMethod,
    pub timestamp: DateTime<Utc>,
    /// With `CASH`, the payment is also recorded in this station's safe.
    pub station_id: Option<Uuid>,
    pub reference: Option<String>,
}

impl CreditPaymentCmd {
    #[must_use]
    pub fn new(
        customer_id: Uuid,
        amount: Money,
        method: PaymentMethod,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            customer_id,
            amount,
            method,
            timestamp,
            station_id: None,
            reference: None,
        }
    }

    #[must_use]
    pub fn station_id(mut self, station_id: Uuid) -> Self {
        self.station_id = Some(station_id);
        self
    }

    #[must_use]
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}
