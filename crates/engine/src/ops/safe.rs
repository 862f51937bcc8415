use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine, Safe, SafeTransaction, SafeTransactionCmd,
    SafeTransactionFilter, ShiftStatus,
    ledger::{SafeTransactionKind, replay},
    safe_transactions, safes, shifts,
    util::{normalize_optional_text, parse_id},
    variance::Tender,
};

use super::{Engine, Principal, with_tx};

const RECENT_TRANSACTIONS: u64 = 10;

/// Stored balance compared with a full replay of the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub safe_id: Uuid,
    pub station_id: Uuid,
    pub stored_balance: Money,
    pub calculated_balance: Money,
    /// `calculated - stored`.
    pub discrepancy: Money,
    pub is_balanced: bool,
    pub last_opening_balance: Money,
    pub total_income: Money,
    pub total_outflow: Money,
    pub income_count: usize,
    pub outflow_count: usize,
    pub transaction_count: usize,
    pub formula: String,
}

/// What a full recompute changed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecomputeOutcome {
    pub safe_id: Uuid,
    pub rows_repaired: usize,
    pub previous_balance: Money,
    pub balance: Money,
}

/// A closed shift whose declared cash has not all reached the safe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDeposit {
    pub shift_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub declared_cash: Money,
    pub deposited: Money,
    pub pending: Money,
}

impl Engine {
    /// Returns the safe of a station with its most recent transactions,
    /// creating an empty safe on first access.
    pub async fn safe(&self, principal: &Principal, station_id: Uuid) -> ResultEngine<Safe> {
        with_tx!(self, |db_tx| {
            let model = self.safe_for_station(&db_tx, principal, station_id).await?;
            let recent = safe_transactions::Entity::find()
                .filter(safe_transactions::Column::SafeId.eq(model.id.clone()))
                .order_by_desc(safe_transactions::Column::Timestamp)
                .order_by_desc(safe_transactions::Column::Sequence)
                .limit(RECENT_TRANSACTIONS)
                .all(&db_tx)
                .await?;
            let mut safe = Safe::try_from(model)?;
            safe.recent_transactions = recent
                .into_iter()
                .map(SafeTransaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            Ok(safe)
        })
    }

    /// Records the counted float of the safe as an `OPENING_BALANCE` row.
    ///
    /// On a safe without transactions the amount also becomes the replay
    /// starting point.
    pub async fn set_opening_balance(
        &self,
        principal: &Principal,
        station_id: Uuid,
        amount: Money,
        timestamp: DateTime<Utc>,
    ) -> ResultEngine<SafeTransaction> {
        principal.require_write()?;
        with_tx!(self, |db_tx| {
            let model = self.safe_for_station(&db_tx, principal, station_id).await?;
            let empty = safe_transactions::Entity::find()
                .filter(safe_transactions::Column::SafeId.eq(model.id.clone()))
                .one(&db_tx)
                .await?
                .is_none();
            let model = if empty {
                let mut active: safes::ActiveModel = model.into();
                active.opening_balance_minor = ActiveValue::Set(amount.minor());
                active.current_balance_minor = ActiveValue::Set(amount.minor());
                active.update(&db_tx).await?
            } else {
                model
            };

            let mut tx = SafeTransaction::new(
                parse_id(&model.id)?,
                SafeTransactionKind::OpeningBalance,
                amount,
                timestamp,
                principal.username.clone(),
            )?;
            tx.description = Some("daily opening balance".to_string());
            self.insert_ledger_row(&db_tx, model, tx).await
        })
    }

    /// Records a safe transaction, keeping every balance snapshot consistent.
    pub async fn record_safe_transaction(
        &self,
        principal: &Principal,
        cmd: SafeTransactionCmd,
    ) -> ResultEngine<SafeTransaction> {
        principal.require_write()?;
        with_tx!(self, |db_tx| {
            self.record_safe_transaction_in_tx(&db_tx, principal, cmd)
                .await
        })
    }

    pub(super) async fn record_safe_transaction_in_tx(
        &self,
        db: &DatabaseTransaction,
        principal: &Principal,
        cmd: SafeTransactionCmd,
    ) -> ResultEngine<SafeTransaction> {
        let model = self.safe_for_station(db, principal, cmd.station_id).await?;
        if let Some(shift_id) = cmd.shift_id {
            let shift = self.require_shift(db, principal, shift_id).await?;
            if shift.station_id != cmd.station_id.to_string() {
                return Err(EngineError::InvalidState(
                    "shift belongs to another station".to_string(),
                ));
            }
        }

        let mut tx = SafeTransaction::new(
            parse_id(&model.id)?,
            cmd.kind,
            cmd.amount,
            cmd.timestamp,
            principal.username.clone(),
        )?;
        tx.shift_id = cmd.shift_id;
        tx.reference = normalize_optional_text(cmd.reference.as_deref());
        tx.description = normalize_optional_text(cmd.description.as_deref());
        self.insert_ledger_row(db, model, tx).await
    }

    /// Lists safe transactions, newest first.
    pub async fn safe_transactions(
        &self,
        principal: &Principal,
        station_id: Uuid,
        filter: SafeTransactionFilter,
    ) -> ResultEngine<Vec<SafeTransaction>> {
        with_tx!(self, |db_tx| {
            let Some(model) = self.find_safe(&db_tx, principal, station_id).await? else {
                self.require_station(&db_tx, principal, station_id).await?;
                return Ok(Vec::new());
            };
            let mut query = safe_transactions::Entity::find()
                .filter(safe_transactions::Column::SafeId.eq(model.id));
            if let Some(kind) = filter.kind {
                query = query.filter(safe_transactions::Column::Kind.eq(kind.as_str()));
            }
            if let Some(from) = filter.from {
                query = query.filter(safe_transactions::Column::Timestamp.gte(from));
            }
            if let Some(to) = filter.to {
                query = query.filter(safe_transactions::Column::Timestamp.lte(to));
            }
            query = query
                .order_by_desc(safe_transactions::Column::Timestamp)
                .order_by_desc(safe_transactions::Column::Sequence);
            if let Some(limit) = filter.limit {
                query = query.limit(limit);
            }
            query
                .all(&db_tx)
                .await?
                .into_iter()
                .map(SafeTransaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Replays the whole ledger and compares the result with the stored
    /// running balance. Nothing is written.
    pub async fn reconcile_safe(
        &self,
        principal: &Principal,
        station_id: Uuid,
    ) -> ResultEngine<Reconciliation> {
        with_tx!(self, |db_tx| {
            let model = self
                .find_safe(&db_tx, principal, station_id)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("safe not exists".to_string()))?;
            let rows = self.ledger_rows(&db_tx, &model.id).await?;
            let result = replay(
                Money::new(model.opening_balance_minor),
                rows.iter().map(row_entry).collect::<ResultEngine<Vec<_>>>()?,
            )?;

            let stored = Money::new(model.current_balance_minor);
            let discrepancy = result.balance.try_sub(stored)?;
            if !discrepancy.is_zero() {
                tracing::warn!(safe_id = %model.id, %stored, calculated = %result.balance, "safe balance discrepancy");
            }
            Ok(Reconciliation {
                safe_id: parse_id(&model.id)?,
                station_id,
                stored_balance: stored,
                calculated_balance: result.balance,
                discrepancy,
                is_balanced: discrepancy.is_zero(),
                last_opening_balance: result.last_opening_balance,
                total_income: result.total_income,
                total_outflow: result.total_outflow,
                income_count: result.income_count,
                outflow_count: result.outflow_count,
                transaction_count: rows.len(),
                formula: result.formula(),
            })
        })
    }

    /// Rewrites every balance snapshot and the running balance from a full
    /// replay of the ledger.
    pub async fn recompute_safe(
        &self,
        principal: &Principal,
        station_id: Uuid,
    ) -> ResultEngine<RecomputeOutcome> {
        principal.require_write()?;
        with_tx!(self, |db_tx| {
            let model = self
                .find_safe(&db_tx, principal, station_id)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("safe not exists".to_string()))?;
            let safe_id = parse_id(&model.id)?;
            let previous_balance = Money::new(model.current_balance_minor);
            let opening = Money::new(model.opening_balance_minor);
            let rows = self.ledger_rows(&db_tx, &model.id).await?;
            let (balance, rows_repaired) = self.rechain(&db_tx, &model, opening, rows).await?;
            tracing::info!(%safe_id, rows_repaired, %previous_balance, %balance, "safe recomputed");
            Ok(RecomputeOutcome {
                safe_id,
                rows_repaired,
                previous_balance,
                balance,
            })
        })
    }

    /// Closed shifts of a station whose declared cash exceeds the
    /// `CASH_FUEL_SALES` already deposited against them.
    pub async fn pending_deposits(
        &self,
        principal: &Principal,
        station_id: Uuid,
    ) -> ResultEngine<Vec<PendingDeposit>> {
        with_tx!(self, |db_tx| {
            self.require_station(&db_tx, principal, station_id).await?;
            let closed = shifts::Entity::find()
                .filter(shifts::Column::OrganizationId.eq(principal.org()))
                .filter(shifts::Column::StationId.eq(station_id.to_string()))
                .filter(shifts::Column::Status.eq(ShiftStatus::Closed.as_str()))
                .order_by_desc(shifts::Column::EndTime)
                .all(&db_tx)
                .await?;

            let mut deposited: HashMap<String, Money> = HashMap::new();
            if let Some(safe) = self.find_safe(&db_tx, principal, station_id).await? {
                for row in safe_transactions::Entity::find()
                    .filter(safe_transactions::Column::SafeId.eq(safe.id))
                    .filter(
                        safe_transactions::Column::Kind
                            .eq(SafeTransactionKind::CashFuelSales.as_str()),
                    )
                    .filter(safe_transactions::Column::ShiftId.is_not_null())
                    .all(&db_tx)
                    .await?
                {
                    if let Some(shift_id) = row.shift_id {
                        let total = deposited.entry(shift_id).or_default();
                        *total = total.try_add(Money::new(row.amount_minor))?;
                    }
                }
            }

            let mut pending = Vec::new();
            for shift in closed {
                let Some(raw) = shift.declared_amounts.as_deref() else {
                    continue;
                };
                let tender: Tender = serde_json::from_str(raw).map_err(|err| {
                    EngineError::InvalidState(format!("corrupt declared amounts: {err}"))
                })?;
                let paid = deposited.get(&shift.id).copied().unwrap_or_default();
                if tender.cash > paid {
                    pending.push(PendingDeposit {
                        shift_id: parse_id(&shift.id)?,
                        start_time: shift.start_time,
                        end_time: shift.end_time,
                        declared_cash: tender.cash,
                        deposited: paid,
                        pending: tender.cash - paid,
                    });
                }
            }
            Ok(pending)
        })
    }

    async fn safe_for_station(
        &self,
        db: &DatabaseTransaction,
        principal: &Principal,
        station_id: Uuid,
    ) -> ResultEngine<safes::Model> {
        if let Some(model) = self.find_safe(db, principal, station_id).await? {
            return Ok(model);
        }
        self.require_station(db, principal, station_id).await?;
        let model = safes::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            organization_id: ActiveValue::Set(principal.org()),
            station_id: ActiveValue::Set(station_id.to_string()),
            opening_balance_minor: ActiveValue::Set(0),
            current_balance_minor: ActiveValue::Set(0),
            updated_at: ActiveValue::Set(Utc::now()),
        }
        .insert(db)
        .await?;
        tracing::info!(safe_id = %model.id, %station_id, "safe created");
        Ok(model)
    }

    /// Inserts a row into the ledger.
    ///
    /// A row at or after the newest timestamp is chained onto the running
    /// balance. A back-dated row is chained onto its predecessor and every
    /// later row is re-snapshotted.
    async fn insert_ledger_row(
        &self,
        db: &DatabaseTransaction,
        safe: safes::Model,
        mut tx: SafeTransaction,
    ) -> ResultEngine<SafeTransaction> {
        let sequence = safe_transactions::Entity::find()
            .filter(safe_transactions::Column::SafeId.eq(safe.id.clone()))
            .order_by_desc(safe_transactions::Column::Sequence)
            .one(db)
            .await?
            .map_or(1, |row| row.sequence + 1);

        let newest = safe_transactions::Entity::find()
            .filter(safe_transactions::Column::SafeId.eq(safe.id.clone()))
            .order_by_desc(safe_transactions::Column::Timestamp)
            .order_by_desc(safe_transactions::Column::Sequence)
            .one(db)
            .await?;
        let back_dated = newest
            .as_ref()
            .is_some_and(|row| tx.timestamp < row.timestamp);

        if !back_dated {
            let before = Money::new(safe.current_balance_minor);
            tx.balance_before_minor = before;
            tx.balance_after_minor = tx.kind.apply(before, tx.amount_minor)?;
            self.insert_row(db, &tx, sequence).await?;
            self.set_running_balance(db, safe, tx.balance_after_minor)
                .await?;
            return Ok(tx);
        }

        let predecessor = safe_transactions::Entity::find()
            .filter(safe_transactions::Column::SafeId.eq(safe.id.clone()))
            .filter(safe_transactions::Column::Timestamp.lte(tx.timestamp))
            .order_by_desc(safe_transactions::Column::Timestamp)
            .order_by_desc(safe_transactions::Column::Sequence)
            .one(db)
            .await?;
        let start = predecessor.map_or(Money::new(safe.opening_balance_minor), |row| {
            Money::new(row.balance_after_minor)
        });
        tracing::info!(
            safe_id = %safe.id,
            timestamp = %tx.timestamp,
            "back-dated safe transaction, replaying later rows"
        );

        self.insert_row(db, &tx, sequence).await?;
        let tail = safe_transactions::Entity::find()
            .filter(safe_transactions::Column::SafeId.eq(safe.id.clone()))
            .filter(
                Condition::any()
                    .add(safe_transactions::Column::Timestamp.gt(tx.timestamp))
                    .add(safe_transactions::Column::Id.eq(tx.id.to_string())),
            )
            .order_by_asc(safe_transactions::Column::Timestamp)
            .order_by_asc(safe_transactions::Column::Sequence)
            .all(db)
            .await?;
        self.rechain(db, &safe, start, tail).await?;

        let stored = safe_transactions::Entity::find_by_id(tx.id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("safe transaction not exists".to_string()))?;
        SafeTransaction::try_from(stored)
    }

    async fn insert_row(
        &self,
        db: &DatabaseTransaction,
        tx: &SafeTransaction,
        sequence: i64,
    ) -> ResultEngine<()> {
        let mut model: safe_transactions::ActiveModel = tx.into();
        model.sequence = ActiveValue::Set(sequence);
        model.created_at = ActiveValue::Set(Utc::now());
        model.insert(db).await?;
        Ok(())
    }

    /// Re-snapshots `rows` (chronological) starting from `start` and stores
    /// the final balance on the safe. Returns the balance and how many rows
    /// changed.
    async fn rechain(
        &self,
        db: &DatabaseTransaction,
        safe: &safes::Model,
        start: Money,
        rows: Vec<safe_transactions::Model>,
    ) -> ResultEngine<(Money, usize)> {
        let entries = rows.iter().map(row_entry).collect::<ResultEngine<Vec<_>>>()?;
        let result = replay(start, entries)?;

        let mut changed = 0;
        for (row, snapshot) in rows.into_iter().zip(result.snapshots) {
            if row.balance_before_minor == snapshot.balance_before.minor()
                && row.balance_after_minor == snapshot.balance_after.minor()
            {
                continue;
            }
            changed += 1;
            let mut active: safe_transactions::ActiveModel = row.into();
            active.balance_before_minor = ActiveValue::Set(snapshot.balance_before.minor());
            active.balance_after_minor = ActiveValue::Set(snapshot.balance_after.minor());
            active.update(db).await?;
        }

        self.set_running_balance(db, safe.clone(), result.balance)
            .await?;
        Ok((result.balance, changed))
    }

    async fn set_running_balance(
        &self,
        db: &DatabaseTransaction,
        safe: safes::Model,
        balance: Money,
    ) -> ResultEngine<()> {
        if balance.is_negative() {
            tracing::warn!(safe_id = %safe.id, %balance, "safe balance is negative");
        }
        let mut active: safes::ActiveModel = safe.into();
        active.current_balance_minor = ActiveValue::Set(balance.minor());
        active.updated_at = ActiveValue::Set(Utc::now());
        active.update(db).await?;
        Ok(())
    }

    async fn ledger_rows(
        &self,
        db: &DatabaseTransaction,
        safe_id: &str,
    ) -> ResultEngine<Vec<safe_transactions::Model>> {
        safe_transactions::Entity::find()
            .filter(safe_transactions::Column::SafeId.eq(safe_id.to_string()))
            .order_by_asc(safe_transactions::Column::Timestamp)
            .order_by_asc(safe_transactions::Column::Sequence)
            .all(db)
            .await
            .map_err(Into::into)
    }
}

fn row_entry(row: &safe_transactions::Model) -> ResultEngine<(SafeTransactionKind, Money)> {
    Ok((
        SafeTransactionKind::try_from(row.kind.as_str())?,
        Money::new(row.amount_minor),
    ))
}
