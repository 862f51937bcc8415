use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Delivery, EngineError, NewDeliveryCmd, Quantity, ResultEngine, VerifyDeliveryCmd, deliveries,
    delivery::{DeliveryStatus, Dips, verify},
    tanks,
    util::{normalize_optional_text, normalize_required_name},
};

use super::{Engine, Principal, with_tx};

impl Engine {
    /// Records a delivery awaiting its after dip. The tank is untouched
    /// until the delivery is verified.
    pub async fn record_delivery(
        &self,
        principal: &Principal,
        cmd: NewDeliveryCmd,
    ) -> ResultEngine<Delivery> {
        principal.require_write()?;
        let supplier = normalize_required_name(&cmd.supplier, "supplier")?;
        if !cmd.invoice_quantity.is_positive() {
            return Err(EngineError::InvalidAmount(
                "invoice quantity must be > 0".to_string(),
            ));
        }
        if cmd.before_dip.is_negative() || cmd.sold_before_drop.is_negative() {
            return Err(EngineError::InvalidReading(
                "dip readings must be >= 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let tank = self.require_tank(&db_tx, principal, cmd.tank_id).await?;
            if cmd.before_dip > Quantity::from_milli(tank.capacity_milli) {
                return Err(EngineError::InvalidReading(format!(
                    "before dip {} exceeds tank capacity",
                    cmd.before_dip
                )));
            }

            let model = deliveries::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                organization_id: ActiveValue::Set(principal.org()),
                station_id: ActiveValue::Set(tank.station_id),
                tank_id: ActiveValue::Set(tank.id),
                supplier: ActiveValue::Set(supplier),
                invoice_number: ActiveValue::Set(normalize_optional_text(
                    cmd.invoice_number.as_deref(),
                )),
                invoice_quantity_milli: ActiveValue::Set(cmd.invoice_quantity.milli()),
                before_dip_milli: ActiveValue::Set(cmd.before_dip.milli()),
                after_dip_milli: ActiveValue::Set(None),
                sold_during_milli: ActiveValue::Set(cmd.sold_before_drop.milli()),
                received_milli: ActiveValue::Set(None),
                status: ActiveValue::Set(DeliveryStatus::PendingVerification.as_str().to_string()),
                delivered_at: ActiveValue::Set(cmd.delivered_at),
                recorded_by: ActiveValue::Set(principal.username.clone()),
                verified_by: ActiveValue::Set(None),
                verified_at: ActiveValue::Set(None),
                notes: ActiveValue::Set(normalize_optional_text(cmd.notes.as_deref())),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(delivery_id = %model.id, tank_id = %cmd.tank_id, invoice = %cmd.invoice_quantity, "delivery recorded");
            Delivery::try_from(model)
        })
    }

    /// Verifies a pending delivery with the after dip.
    ///
    /// The tank level is set to the after dip reading, which is the measured
    /// truth, rather than incremented by the received litres.
    pub async fn verify_delivery(
        &self,
        principal: &Principal,
        cmd: VerifyDeliveryCmd,
    ) -> ResultEngine<Delivery> {
        principal.require_write()?;
        with_tx!(self, |db_tx| {
            let model = self
                .require_delivery(&db_tx, principal, cmd.delivery_id)
                .await?;
            if model.status != DeliveryStatus::PendingVerification.as_str() {
                return Err(EngineError::InvalidState(
                    "delivery already verified".to_string(),
                ));
            }
            let tank = tanks::Entity::find_by_id(model.tank_id.clone())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("tank not exists".to_string()))?;

            let dips = Dips {
                before: Quantity::from_milli(model.before_dip_milli),
                after: cmd.after_dip,
                sold_during: cmd.sold_during,
            };
            let outcome = verify(
                dips,
                Quantity::from_milli(model.invoice_quantity_milli),
                Quantity::from_milli(tank.capacity_milli),
            )?;
            match outcome.status {
                DeliveryStatus::Discrepancy => tracing::warn!(
                    delivery_id = %model.id,
                    received = %outcome.received,
                    variance = %outcome.invoice_variance,
                    "delivery does not match invoice"
                ),
                _ => tracing::info!(
                    delivery_id = %model.id,
                    received = %outcome.received,
                    "delivery verified"
                ),
            }

            let notes = match (model.notes.clone(), normalize_optional_text(cmd.notes.as_deref())) {
                (Some(previous), Some(note)) => Some(format!("{previous}\nVerification: {note}")),
                (None, Some(note)) => Some(format!("Verification: {note}")),
                (previous, None) => previous,
            };
            let sold_during = Quantity::from_milli(model.sold_during_milli) + cmd.sold_during;

            let mut active: deliveries::ActiveModel = model.into();
            active.after_dip_milli = ActiveValue::Set(Some(cmd.after_dip.milli()));
            active.sold_during_milli = ActiveValue::Set(sold_during.milli());
            active.received_milli = ActiveValue::Set(Some(outcome.received.milli()));
            active.status = ActiveValue::Set(outcome.status.as_str().to_string());
            active.verified_by = ActiveValue::Set(Some(principal.username.clone()));
            active.verified_at = ActiveValue::Set(Some(cmd.verified_at));
            active.notes = ActiveValue::Set(notes);
            let updated = active.update(&db_tx).await?;

            let mut tank: tanks::ActiveModel = tank.into();
            tank.current_level_milli = ActiveValue::Set(cmd.after_dip.milli());
            tank.update(&db_tx).await?;

            Delivery::try_from(updated)
        })
    }

    pub async fn delivery(&self, principal: &Principal, delivery_id: Uuid) -> ResultEngine<Delivery> {
        with_tx!(self, |db_tx| {
            let model = self.require_delivery(&db_tx, principal, delivery_id).await?;
            Delivery::try_from(model)
        })
    }

    /// Lists deliveries, newest first, optionally for one station or tank.
    pub async fn deliveries(
        &self,
        principal: &Principal,
        station_id: Option<Uuid>,
        tank_id: Option<Uuid>,
    ) -> ResultEngine<Vec<Delivery>> {
        with_tx!(self, |db_tx| {
            let mut query = deliveries::Entity::find()
                .filter(deliveries::Column::OrganizationId.eq(principal.org()));
            if let Some(station_id) = station_id {
                query = query.filter(deliveries::Column::StationId.eq(station_id.to_string()));
            }
            if let Some(tank_id) = tank_id {
                query = query.filter(deliveries::Column::TankId.eq(tank_id.to_string()));
            }
            query
                .order_by_desc(deliveries::Column::DeliveredAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Delivery::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
