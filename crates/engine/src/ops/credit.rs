use sea_orm::{
    ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    CreditCustomer, CreditPayment, CreditPaymentCmd, CreditSale, CreditSaleCmd, EngineError,
    Money, NewCustomerCmd, PaymentMethod, ResultEngine, SafeTransactionCmd,
    credit_customers, credit_payments, credit_sales,
    ledger::SafeTransactionKind,
    util::{normalize_optional_text, normalize_required_name},
};

use super::{Engine, Principal, with_tx};

const RECENT_ACTIVITY: u64 = 10;

impl Engine {
    pub async fn new_credit_customer(
        &self,
        principal: &Principal,
        cmd: NewCustomerCmd,
    ) -> ResultEngine<Uuid> {
        principal.require_write()?;
        let name = normalize_required_name(&cmd.name, "customer")?;
        if cmd.credit_limit.is_negative() {
            return Err(EngineError::InvalidAmount(
                "credit limit must be >= 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let id = Uuid::new_v4();
            credit_customers::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                organization_id: ActiveValue::Set(principal.org()),
                name: ActiveValue::Set(name),
                phone: ActiveValue::Set(normalize_optional_text(cmd.phone.as_deref())),
                credit_limit_minor: ActiveValue::Set(cmd.credit_limit.minor()),
                balance_minor: ActiveValue::Set(0),
                created_at: ActiveValue::Set(chrono::Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            Ok(id)
        })
    }

    /// Returns a customer with its most recent sales and payments.
    pub async fn credit_customer(
        &self,
        principal: &Principal,
        customer_id: Uuid,
    ) -> ResultEngine<CreditCustomer> {
        with_tx!(self, |db_tx| {
            let model = self.require_customer(&db_tx, principal, customer_id).await?;
            let sales = credit_sales::Entity::find()
                .filter(credit_sales::Column::CustomerId.eq(model.id.clone()))
                .order_by_desc(credit_sales::Column::Timestamp)
                .limit(RECENT_ACTIVITY)
                .all(&db_tx)
                .await?;
            let payments = credit_payments::Entity::find()
                .filter(credit_payments::Column::CustomerId.eq(model.id.clone()))
                .order_by_desc(credit_payments::Column::Timestamp)
                .limit(RECENT_ACTIVITY)
                .all(&db_tx)
                .await?;

            let mut customer = CreditCustomer::try_from(model)?;
            customer.recent_sales = sales
                .into_iter()
                .map(CreditSale::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            customer.recent_payments = payments
                .into_iter()
                .map(CreditPayment::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            Ok(customer)
        })
    }

    /// Deletes a customer that never bought or paid anything.
    pub async fn delete_credit_customer(
        &self,
        principal: &Principal,
        customer_id: Uuid,
    ) -> ResultEngine<()> {
        principal.require_write()?;
        with_tx!(self, |db_tx| {
            let model = self.require_customer(&db_tx, principal, customer_id).await?;
            let sales = credit_sales::Entity::find()
                .filter(credit_sales::Column::CustomerId.eq(model.id.clone()))
                .count(&db_tx)
                .await?;
            let payments = credit_payments::Entity::find()
                .filter(credit_payments::Column::CustomerId.eq(model.id.clone()))
                .count(&db_tx)
                .await?;
            if sales > 0 || payments > 0 {
                return Err(EngineError::InvalidState(format!(
                    "customer has {sales} sales and {payments} payments"
                )));
            }
            credit_customers::Entity::delete_by_id(model.id)
                .exec(&db_tx)
                .await?;
            tracing::info!(%customer_id, "credit customer deleted");
            Ok(())
        })
    }

    /// Sells on credit. A positive credit limit caps the customer balance.
    pub async fn record_credit_sale(
        &self,
        principal: &Principal,
        cmd: CreditSaleCmd,
    ) -> ResultEngine<CreditSale> {
        principal.require_write()?;
        if !cmd.amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "credit sale amount must be > 0".to_string(),
            ));
        }
        if cmd.litres.is_some_and(|litres| !litres.is_positive()) {
            return Err(EngineError::InvalidAmount(
                "credit sale litres must be > 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let customer = self.require_customer(&db_tx, principal, cmd.customer_id).await?;
            if let Some(station_id) = cmd.station_id {
                self.require_station(&db_tx, principal, station_id).await?;
            }
            if let Some(shift_id) = cmd.shift_id {
                self.require_shift(&db_tx, principal, shift_id).await?;
            }
            if let Some(fuel_id) = cmd.fuel_id {
                self.require_fuel(&db_tx, principal, fuel_id).await?;
            }

            let limit = Money::new(customer.credit_limit_minor);
            let balance = Money::new(customer.balance_minor).try_add(cmd.amount)?;
            if limit.is_positive() && balance > limit {
                return Err(EngineError::CreditLimitExceeded(format!(
                    "balance would be {balance}, limit is {limit}"
                )));
            }

            let model = credit_sales::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                customer_id: ActiveValue::Set(customer.id.clone()),
                station_id: ActiveValue::Set(cmd.station_id.map(|id| id.to_string())),
                shift_id: ActiveValue::Set(cmd.shift_id.map(|id| id.to_string())),
                fuel_id: ActiveValue::Set(cmd.fuel_id.map(|id| id.to_string())),
                amount_minor: ActiveValue::Set(cmd.amount.minor()),
                litres_milli: ActiveValue::Set(cmd.litres.map(|l| l.milli())),
                timestamp: ActiveValue::Set(cmd.timestamp),
                recorded_by: ActiveValue::Set(principal.username.clone()),
            }
            .insert(&db_tx)
            .await?;

            let mut active: credit_customers::ActiveModel = customer.into();
            active.balance_minor = ActiveValue::Set(balance.minor());
            active.update(&db_tx).await?;

            CreditSale::try_from(model)
        })
    }

    /// Receives a payment. A cash payment taken at a station also lands in
    /// that station's safe as `CREDIT_PAYMENT`.
    pub async fn record_credit_payment(
        &self,
        principal: &Principal,
        cmd: CreditPaymentCmd,
    ) -> ResultEngine<CreditPayment> {
        principal.require_write()?;
        if !cmd.amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "payment amount must be > 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let customer = self.require_customer(&db_tx, principal, cmd.customer_id).await?;
            if let Some(station_id) = cmd.station_id {
                self.require_station(&db_tx, principal, station_id).await?;
            }

            let reference = normalize_optional_text(cmd.reference.as_deref());
            let model = credit_payments::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                customer_id: ActiveValue::Set(customer.id.clone()),
                station_id: ActiveValue::Set(cmd.station_id.map(|id| id.to_string())),
                amount_minor: ActiveValue::Set(cmd.amount.minor()),
                method: ActiveValue::Set(cmd.method.as_str().to_string()),
                reference: ActiveValue::Set(reference.clone()),
                timestamp: ActiveValue::Set(cmd.timestamp),
                recorded_by: ActiveValue::Set(principal.username.clone()),
            }
            .insert(&db_tx)
            .await?;

            let balance = Money::new(customer.balance_minor).try_sub(cmd.amount)?;
            if balance.is_negative() {
                tracing::info!(customer_id = %customer.id, %balance, "customer paid more than owed");
            }
            let customer_name = customer.name.clone();
            let mut active: credit_customers::ActiveModel = customer.into();
            active.balance_minor = ActiveValue::Set(balance.minor());
            active.update(&db_tx).await?;

            if let (PaymentMethod::Cash, Some(station_id)) = (cmd.method, cmd.station_id) {
                let mut safe_cmd = SafeTransactionCmd::new(
                    station_id,
                    SafeTransactionKind::CreditPayment,
                    cmd.amount,
                    cmd.timestamp,
                )
                .description(format!("credit payment from {customer_name}"));
                if let Some(reference) = reference {
                    safe_cmd = safe_cmd.reference(reference);
                }
                self.record_safe_transaction_in_tx(&db_tx, principal, safe_cmd)
                    .await?;
            }

            CreditPayment::try_from(model)
        })
    }
}
