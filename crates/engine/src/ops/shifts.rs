use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AssignPumperCmd, AssignmentStatus, CloseShiftCmd, EngineError, FuelBreakdown, Money,
    PumperBreakdown, Quantity, ResultEngine, Shift, ShiftAssignment, ShiftStatistics,
    ShiftStatus, TestPourCmd, fuels,
    meter::meter_delta,
    nozzles, pumpers, shift_assignments,
    shifts::{self, encode_json},
    tanks, test_pours,
    util::{normalize_optional_text, parse_id},
    variance::{Tender, assess},
};

use super::{Engine, Principal, prices::EffectivePrice, with_tx};

/// Result of closing one shift during a bulk close.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkCloseOutcome {
    pub shift_id: Uuid,
    pub statistics: Option<ShiftStatistics>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkCloseReport {
    pub closed: usize,
    pub failed: usize,
    pub outcomes: Vec<BulkCloseOutcome>,
}

/// Statistics plus the net litres drawn from each tank.
struct Computed {
    statistics: ShiftStatistics,
    tank_draws: HashMap<String, Quantity>,
}

impl Engine {
    /// Opens a shift at a station.
    pub async fn open_shift(
        &self,
        principal: &Principal,
        station_id: Uuid,
        start_time: DateTime<Utc>,
    ) -> ResultEngine<Shift> {
        principal.require_write()?;
        with_tx!(self, |db_tx| {
            self.require_station(&db_tx, principal, station_id).await?;

            let id = Uuid::new_v4();
            let model = shifts::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                organization_id: ActiveValue::Set(principal.org()),
                station_id: ActiveValue::Set(station_id.to_string()),
                start_time: ActiveValue::Set(start_time),
                end_time: ActiveValue::Set(None),
                status: ActiveValue::Set(ShiftStatus::Open.as_str().to_string()),
                opened_by: ActiveValue::Set(principal.username.clone()),
                closed_by: ActiveValue::Set(None),
                statistics: ActiveValue::Set(None),
                declared_amounts: ActiveValue::Set(None),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(shift_id = %id, %station_id, "shift opened");
            Shift::try_from(model)
        })
    }

    /// Lists shifts, newest first, optionally filtered by station and status.
    pub async fn shifts(
        &self,
        principal: &Principal,
        station_id: Option<Uuid>,
        status: Option<ShiftStatus>,
    ) -> ResultEngine<Vec<Shift>> {
        with_tx!(self, |db_tx| {
            let mut query =
                shifts::Entity::find().filter(shifts::Column::OrganizationId.eq(principal.org()));
            if let Some(station_id) = station_id {
                query = query.filter(shifts::Column::StationId.eq(station_id.to_string()));
            }
            if let Some(status) = status {
                query = query.filter(shifts::Column::Status.eq(status.as_str()));
            }
            let models = query
                .order_by_desc(shifts::Column::StartTime)
                .all(&db_tx)
                .await?;

            let ids: Vec<String> = models.iter().map(|m| m.id.clone()).collect();
            let mut assignments = self.assignments_by_shift(&db_tx, &ids).await?;
            models
                .into_iter()
                .map(|model| {
                    let list = assignments.remove(&model.id).unwrap_or_default();
                    let mut shift = Shift::try_from(model)?;
                    shift.assignments = list;
                    Ok(shift)
                })
                .collect::<ResultEngine<Vec<Shift>>>()
        })
    }

    /// Returns a shift with its assignments.
    pub async fn shift(&self, principal: &Principal, shift_id: Uuid) -> ResultEngine<Shift> {
        with_tx!(self, |db_tx| {
            let model = self.require_shift(&db_tx, principal, shift_id).await?;
            let mut assignments = self
                .assignments_by_shift(&db_tx, std::slice::from_ref(&model.id))
                .await?;
            let list = assignments.remove(&model.id).unwrap_or_default();
            let mut shift = Shift::try_from(model)?;
            shift.assignments = list;
            Ok(shift)
        })
    }

    /// Puts a pumper on a nozzle for an open shift.
    ///
    /// The start reading defaults to where the nozzle was last closed. A
    /// nozzle can only have one active assignment per shift.
    pub async fn assign_pumper(
        &self,
        principal: &Principal,
        cmd: AssignPumperCmd,
    ) -> ResultEngine<ShiftAssignment> {
        principal.require_write()?;
        if cmd.start_meter.is_some_and(Quantity::is_negative) {
            return Err(EngineError::InvalidReading(
                "start reading must be >= 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let shift = self.require_open_shift(&db_tx, principal, cmd.shift_id).await?;
            let nozzle = self.require_nozzle(&db_tx, principal, cmd.nozzle_id).await?;
            if nozzle.station_id != shift.station_id {
                return Err(EngineError::InvalidState(
                    "nozzle belongs to another station".to_string(),
                ));
            }
            let pumper = self.require_pumper(&db_tx, principal, cmd.pumper_id).await?;
            if !pumper.active {
                return Err(EngineError::InvalidState(format!(
                    "pumper {} is not active",
                    pumper.name
                )));
            }

            let busy = shift_assignments::Entity::find()
                .filter(shift_assignments::Column::ShiftId.eq(shift.id.clone()))
                .filter(shift_assignments::Column::NozzleId.eq(nozzle.id.clone()))
                .filter(shift_assignments::Column::Status.eq(AssignmentStatus::Active.as_str()))
                .one(&db_tx)
                .await?
                .is_some();
            if busy {
                return Err(EngineError::ExistingKey(format!(
                    "nozzle {} already assigned in this shift",
                    nozzle.id
                )));
            }

            let start_meter = match cmd.start_meter {
                Some(reading) => reading,
                None => self
                    .last_closed_reading(&db_tx, cmd.nozzle_id)
                    .await?
                    .unwrap_or(Quantity::ZERO),
            };

            let model = shift_assignments::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                shift_id: ActiveValue::Set(shift.id),
                nozzle_id: ActiveValue::Set(nozzle.id),
                pumper_id: ActiveValue::Set(pumper.id),
                start_meter_milli: ActiveValue::Set(start_meter.milli()),
                end_meter_milli: ActiveValue::Set(None),
                status: ActiveValue::Set(AssignmentStatus::Active.as_str().to_string()),
                created_at: ActiveValue::Set(Utc::now()),
                closed_at: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await?;
            ShiftAssignment::try_from(model)
        })
    }

    /// Closes an active assignment with its end meter reading.
    ///
    /// The reading must not go backwards unless the meter rolled over.
    pub async fn close_assignment(
        &self,
        principal: &Principal,
        shift_id: Uuid,
        assignment_id: Uuid,
        end_meter: Quantity,
    ) -> ResultEngine<ShiftAssignment> {
        principal.require_write()?;
        with_tx!(self, |db_tx| {
            let shift = self.require_shift(&db_tx, principal, shift_id).await?;
            let assignment = shift_assignments::Entity::find_by_id(assignment_id.to_string())
                .filter(shift_assignments::Column::ShiftId.eq(shift.id.clone()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("assignment not exists".to_string()))?;
            if assignment.status != AssignmentStatus::Active.as_str() {
                return Err(EngineError::InvalidState(
                    "assignment already closed".to_string(),
                ));
            }

            let delta = meter_delta(
                Quantity::from_milli(assignment.start_meter_milli),
                end_meter,
            )?;
            tracing::debug!(%assignment_id, litres = %delta.litres(), "assignment closed");

            let mut active: shift_assignments::ActiveModel = assignment.into();
            active.end_meter_milli = ActiveValue::Set(Some(end_meter.milli()));
            active.status = ActiveValue::Set(AssignmentStatus::Closed.as_str().to_string());
            active.closed_at = ActiveValue::Set(Some(Utc::now()));
            let model = active.update(&db_tx).await?;
            ShiftAssignment::try_from(model)
        })
    }

    /// Records a calibration pour on a nozzle of an open shift.
    pub async fn record_test_pour(
        &self,
        principal: &Principal,
        cmd: TestPourCmd,
    ) -> ResultEngine<Uuid> {
        principal.require_write()?;
        if !cmd.litres.is_positive() {
            return Err(EngineError::InvalidAmount(
                "test pour litres must be > 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let shift = self.require_open_shift(&db_tx, principal, cmd.shift_id).await?;
            let nozzle = self.require_nozzle(&db_tx, principal, cmd.nozzle_id).await?;
            if nozzle.station_id != shift.station_id {
                return Err(EngineError::InvalidState(
                    "nozzle belongs to another station".to_string(),
                ));
            }

            let id = Uuid::new_v4();
            test_pours::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                shift_id: ActiveValue::Set(shift.id),
                nozzle_id: ActiveValue::Set(nozzle.id),
                litres_milli: ActiveValue::Set(cmd.litres.milli()),
                returned: ActiveValue::Set(cmd.returned),
                note: ActiveValue::Set(normalize_optional_text(cmd.note.as_deref())),
                recorded_by: ActiveValue::Set(principal.username.clone()),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            Ok(id)
        })
    }

    /// Statistics of a shift.
    ///
    /// A closed shift returns what was frozen at close; an open one is
    /// computed live up to now, counting active assignments as zero litres.
    pub async fn shift_statistics(
        &self,
        principal: &Principal,
        shift_id: Uuid,
    ) -> ResultEngine<ShiftStatistics> {
        with_tx!(self, |db_tx| {
            let model = self.require_shift(&db_tx, principal, shift_id).await?;
            let end = model.end_time.unwrap_or_else(Utc::now);
            let shift = Shift::try_from(model.clone())?;
            match shift.statistics {
                Some(statistics) if shift.status == ShiftStatus::Closed => Ok(statistics),
                _ => self
                    .compute_statistics(&db_tx, principal, &model, end)
                    .await
                    .map(|computed| computed.statistics),
            }
        })
    }

    /// Closes a shift against the declared tender.
    ///
    /// Active assignments are closed at their start reading, the variance is
    /// classified with the organization tolerance and the tanks are drawn
    /// down by the net litres sold.
    pub async fn close_shift(&self, principal: &Principal, cmd: CloseShiftCmd) -> ResultEngine<Shift> {
        principal.require_write()?;
        let tender = Tender::new(
            cmd.tender.cash,
            cmd.tender.card,
            cmd.tender.credit,
            cmd.tender.cheque,
        )?;
        with_tx!(self, |db_tx| {
            let model = self.require_shift(&db_tx, principal, cmd.shift_id).await?;
            self.close_shift_in_tx(&db_tx, principal, model, tender, cmd.end_time)
                .await
        })
    }

    /// Closes every open shift of the organization, or of one station, with
    /// zero declared tender.
    ///
    /// Each shift is closed in its own transaction; a failure is reported and
    /// does not stop the others.
    pub async fn bulk_close_shifts(
        &self,
        principal: &Principal,
        station_id: Option<Uuid>,
        end_time: DateTime<Utc>,
    ) -> ResultEngine<BulkCloseReport> {
        principal.require_write()?;
        let open = self
            .shifts(principal, station_id, Some(ShiftStatus::Open))
            .await?;

        let mut report = BulkCloseReport::default();
        for shift in open {
            match self.close_open_shift(principal, shift.id, end_time).await {
                Ok(closed) => {
                    report.closed += 1;
                    report.outcomes.push(BulkCloseOutcome {
                        shift_id: closed.id,
                        statistics: closed.statistics,
                        error: None,
                    });
                }
                Err(err) => {
                    tracing::warn!(shift_id = %shift.id, error = %err, "bulk close failed");
                    report.failed += 1;
                    report.outcomes.push(BulkCloseOutcome {
                        shift_id: shift.id,
                        statistics: None,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        tracing::info!(
            closed = report.closed,
            failed = report.failed,
            "bulk shift close finished"
        );
        Ok(report)
    }

    async fn close_open_shift(
        &self,
        principal: &Principal,
        shift_id: Uuid,
        end_time: DateTime<Utc>,
    ) -> ResultEngine<Shift> {
        with_tx!(self, |db_tx| {
            let model = self.require_shift(&db_tx, principal, shift_id).await?;
            let end = end_time.max(model.start_time);
            self.close_shift_in_tx(&db_tx, principal, model, Tender::default(), end)
                .await
        })
    }

    async fn close_shift_in_tx(
        &self,
        db: &DatabaseTransaction,
        principal: &Principal,
        model: shifts::Model,
        tender: Tender,
        end_time: DateTime<Utc>,
    ) -> ResultEngine<Shift> {
        if model.status != ShiftStatus::Open.as_str() {
            return Err(EngineError::InvalidState(
                "shift already closed".to_string(),
            ));
        }
        if end_time < model.start_time {
            return Err(EngineError::InvalidAmount(
                "end time is before the shift start".to_string(),
            ));
        }

        let active = shift_assignments::Entity::find()
            .filter(shift_assignments::Column::ShiftId.eq(model.id.clone()))
            .filter(shift_assignments::Column::Status.eq(AssignmentStatus::Active.as_str()))
            .all(db)
            .await?;
        for assignment in active {
            tracing::info!(assignment_id = %assignment.id, "closing active assignment at start reading");
            let start = assignment.start_meter_milli;
            let mut active: shift_assignments::ActiveModel = assignment.into();
            active.end_meter_milli = ActiveValue::Set(Some(start));
            active.status = ActiveValue::Set(AssignmentStatus::Closed.as_str().to_string());
            active.closed_at = ActiveValue::Set(Some(end_time));
            active.update(db).await?;
        }

        let Computed {
            mut statistics,
            tank_draws,
        } = self.compute_statistics(db, principal, &model, end_time).await?;
        let tolerance = self.load_tolerance(db, principal).await?;
        let variance = assess(statistics.total_sales_minor, &tender, tolerance)?;
        statistics.variance = Some(variance);

        for (tank_id, litres) in tank_draws {
            let Some(tank) = tanks::Entity::find_by_id(tank_id).one(db).await? else {
                continue;
            };
            let level = Quantity::from_milli(tank.current_level_milli) - litres;
            if level.is_negative() {
                tracing::warn!(tank_id = %tank.id, %level, "tank level below zero, clamping");
            }
            let mut active: tanks::ActiveModel = tank.into();
            active.current_level_milli = ActiveValue::Set(level.floor_zero().milli());
            active.update(db).await?;
        }

        let shift_id = model.id.clone();
        let mut active: shifts::ActiveModel = model.into();
        active.status = ActiveValue::Set(ShiftStatus::Closed.as_str().to_string());
        active.end_time = ActiveValue::Set(Some(end_time));
        active.closed_by = ActiveValue::Set(Some(principal.username.clone()));
        active.statistics = ActiveValue::Set(Some(encode_json(&statistics)?));
        active.declared_amounts = ActiveValue::Set(Some(encode_json(&tender)?));
        let updated = active.update(db).await?;

        tracing::info!(
            %shift_id,
            sales = %variance.calculated,
            declared = %variance.declared,
            variance = %variance.variance,
            status = variance.status.as_str(),
            "shift closed"
        );

        let mut assignments = self
            .assignments_by_shift(db, std::slice::from_ref(&shift_id))
            .await?;
        let mut shift = Shift::try_from(updated)?;
        shift.assignments = assignments.remove(&shift_id).unwrap_or_default();
        Ok(shift)
    }

    async fn compute_statistics(
        &self,
        db: &DatabaseTransaction,
        principal: &Principal,
        shift: &shifts::Model,
        end_time: DateTime<Utc>,
    ) -> ResultEngine<Computed> {
        let station_id = parse_id(&shift.station_id)?;
        let assignments = shift_assignments::Entity::find()
            .filter(shift_assignments::Column::ShiftId.eq(shift.id.clone()))
            .order_by_asc(shift_assignments::Column::CreatedAt)
            .all(db)
            .await?;

        // Returned pours per nozzle, consumed by the nozzle's assignments in order.
        let mut pours: HashMap<String, Quantity> = HashMap::new();
        for pour in test_pours::Entity::find()
            .filter(test_pours::Column::ShiftId.eq(shift.id.clone()))
            .filter(test_pours::Column::Returned.eq(true))
            .all(db)
            .await?
        {
            *pours.entry(pour.nozzle_id).or_default() += Quantity::from_milli(pour.litres_milli);
        }

        let mut prices: HashMap<Uuid, EffectivePrice> = HashMap::new();
        let mut nozzle_cache: HashMap<String, (tanks::Model, Uuid)> = HashMap::new();
        let mut pumper_rows: Vec<PumperBreakdown> = Vec::new();
        let mut fuel_rows: Vec<FuelBreakdown> = Vec::new();
        let mut tank_draws: HashMap<String, Quantity> = HashMap::new();
        let mut total_litres = Quantity::ZERO;
        let mut total_sales = Money::ZERO;
        let mut closed = 0;
        let mut discarded = 0;

        for assignment in &assignments {
            if !nozzle_cache.contains_key(&assignment.nozzle_id) {
                let nozzle = nozzles::Entity::find_by_id(assignment.nozzle_id.clone())
                    .one(db)
                    .await?
                    .ok_or_else(|| EngineError::KeyNotFound("nozzle not exists".to_string()))?;
                let entry = self.nozzle_fuel(db, &nozzle).await?;
                nozzle_cache.insert(assignment.nozzle_id.clone(), entry);
            }
            let Some((tank, fuel_id)) = nozzle_cache.get(&assignment.nozzle_id).cloned() else {
                continue;
            };

            let gross = match assignment.end_meter_milli {
                Some(end) => {
                    closed += 1;
                    match meter_delta(
                        Quantity::from_milli(assignment.start_meter_milli),
                        Quantity::from_milli(end),
                    ) {
                        Ok(delta) => delta.litres(),
                        Err(err) => {
                            tracing::warn!(
                                assignment_id = %assignment.id,
                                error = %err,
                                "discarding meter reading"
                            );
                            discarded += 1;
                            Quantity::ZERO
                        }
                    }
                }
                None => Quantity::ZERO,
            };

            let pour_left = pours.entry(assignment.nozzle_id.clone()).or_default();
            let returned = gross.min(*pour_left);
            *pour_left -= returned;
            let litres = (gross - returned).floor_zero();

            if !prices.contains_key(&fuel_id) {
                let price = self
                    .resolve_price(db, principal, fuel_id, station_id, shift.start_time)
                    .await?;
                prices.insert(fuel_id, price);
            }
            let price = prices
                .get(&fuel_id)
                .copied()
                .ok_or_else(|| EngineError::KeyNotFound("fuel price".to_string()))?;
            let sales = price.price.times(litres);

            total_litres += litres;
            total_sales = total_sales.try_add(sales)?;
            *tank_draws.entry(tank.id.clone()).or_default() += litres;

            let pumper_id = parse_id(&assignment.pumper_id)?;
            match pumper_rows.iter_mut().find(|row| row.pumper_id == pumper_id) {
                Some(row) => {
                    row.assignments += 1;
                    row.litres_milli += litres;
                    row.sales_minor += sales;
                }
                None => {
                    let name = pumpers::Entity::find_by_id(assignment.pumper_id.clone())
                        .one(db)
                        .await?
                        .map(|p| p.name)
                        .unwrap_or_default();
                    pumper_rows.push(PumperBreakdown {
                        pumper_id,
                        pumper_name: name,
                        assignments: 1,
                        litres_milli: litres,
                        sales_minor: sales,
                    });
                }
            }

            match fuel_rows.iter_mut().find(|row| row.fuel_id == fuel_id) {
                Some(row) => {
                    row.litres_milli += litres;
                    row.sales_minor += sales;
                }
                None => {
                    let name = fuels::Entity::find_by_id(fuel_id.to_string())
                        .one(db)
                        .await?
                        .map(|f| f.name)
                        .unwrap_or_default();
                    fuel_rows.push(FuelBreakdown {
                        fuel_id,
                        fuel_name: name,
                        price_minor: price.price,
                        price_source: price.source,
                        litres_milli: litres,
                        sales_minor: sales,
                    });
                }
            }
        }

        let average_price = if total_litres.is_positive() {
            let raw = i128::from(total_sales.minor()) * i128::from(Quantity::SCALE);
            let litres = i128::from(total_litres.milli());
            Money::new(((raw + litres / 2) / litres) as i64)
        } else {
            Money::ZERO
        };

        Ok(Computed {
            statistics: ShiftStatistics {
                duration_minutes: (end_time - shift.start_time).num_minutes().max(0),
                total_litres_milli: total_litres,
                total_sales_minor: total_sales,
                average_price_minor: average_price,
                total_assignments: assignments.len(),
                closed_assignments: closed,
                discarded_readings: discarded,
                pumpers: pumper_rows,
                fuels: fuel_rows,
                variance: None,
            },
            tank_draws,
        })
    }

    async fn require_open_shift(
        &self,
        db: &DatabaseTransaction,
        principal: &Principal,
        shift_id: Uuid,
    ) -> ResultEngine<shifts::Model> {
        let shift = self.require_shift(db, principal, shift_id).await?;
        if shift.status != ShiftStatus::Open.as_str() {
            return Err(EngineError::InvalidState("shift is not open".to_string()));
        }
        Ok(shift)
    }

    async fn assignments_by_shift(
        &self,
        db: &DatabaseTransaction,
        shift_ids: &[String],
    ) -> ResultEngine<HashMap<String, Vec<ShiftAssignment>>> {
        let mut grouped: HashMap<String, Vec<ShiftAssignment>> = HashMap::new();
        if shift_ids.is_empty() {
            return Ok(grouped);
        }
        let models = shift_assignments::Entity::find()
            .filter(shift_assignments::Column::ShiftId.is_in(shift_ids.iter().cloned()))
            .order_by_asc(shift_assignments::Column::CreatedAt)
            .all(db)
            .await?;
        for model in models {
            let key = model.shift_id.clone();
            grouped
                .entry(key)
                .or_default()
                .push(ShiftAssignment::try_from(model)?);
        }
        Ok(grouped)
    }
}
