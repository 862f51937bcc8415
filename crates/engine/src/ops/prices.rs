use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, FALLBACK_PRICE, Money, NewPriceCmd, PriceSource, ResultEngine, fuel_prices,
    util::parse_id,
};

use super::{Engine, Principal, with_tx};

/// Price per litre in force for a fuel at a station and time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePrice {
    pub price: Money,
    pub source: PriceSource,
    /// Row the price came from, `None` for the fallback.
    pub price_id: Option<Uuid>,
}

impl Engine {
    pub async fn new_price(&self, principal: &Principal, cmd: NewPriceCmd) -> ResultEngine<Uuid> {
        principal.require_write()?;
        if !cmd.price.is_positive() {
            return Err(EngineError::InvalidAmount(
                "price must be > 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            self.require_fuel(&db_tx, principal, cmd.fuel_id).await?;
            if let Some(station_id) = cmd.station_id {
                self.require_station(&db_tx, principal, station_id).await?;
            }

            let id = Uuid::new_v4();
            fuel_prices::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                organization_id: ActiveValue::Set(principal.org()),
                fuel_id: ActiveValue::Set(cmd.fuel_id.to_string()),
                station_id: ActiveValue::Set(cmd.station_id.map(|id| id.to_string())),
                price_minor: ActiveValue::Set(cmd.price.minor()),
                effective_date: ActiveValue::Set(cmd.effective_date),
                is_active: ActiveValue::Set(true),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(price_id = %id, fuel_id = %cmd.fuel_id, price = %cmd.price, "fuel price added");
            Ok(id)
        })
    }

    /// Resolves the price of `fuel_id` at `station_id` for the instant `at`.
    ///
    /// Rules, first match wins:
    /// 1. newest active row for the station with `effective_date <= at`;
    /// 2. newest row for the fuel, any station and any date;
    /// 3. [`FALLBACK_PRICE`].
    pub async fn effective_price(
        &self,
        principal: &Principal,
        fuel_id: Uuid,
        station_id: Uuid,
        at: DateTime<Utc>,
    ) -> ResultEngine<EffectivePrice> {
        with_tx!(self, |db_tx| {
            self.require_fuel(&db_tx, principal, fuel_id).await?;
            self.require_station(&db_tx, principal, station_id).await?;
            self.resolve_price(&db_tx, principal, fuel_id, station_id, at)
                .await
        })
    }

    pub(super) async fn resolve_price(
        &self,
        db: &DatabaseTransaction,
        principal: &Principal,
        fuel_id: Uuid,
        station_id: Uuid,
        at: DateTime<Utc>,
    ) -> ResultEngine<EffectivePrice> {
        let station_row = fuel_prices::Entity::find()
            .filter(fuel_prices::Column::OrganizationId.eq(principal.org()))
            .filter(fuel_prices::Column::FuelId.eq(fuel_id.to_string()))
            .filter(fuel_prices::Column::StationId.eq(station_id.to_string()))
            .filter(fuel_prices::Column::EffectiveDate.lte(at))
            .filter(fuel_prices::Column::IsActive.eq(true))
            .order_by_desc(fuel_prices::Column::EffectiveDate)
            .order_by_desc(fuel_prices::Column::CreatedAt)
            .one(db)
            .await?;
        if let Some(row) = station_row {
            return Ok(EffectivePrice {
                price: Money::new(row.price_minor),
                source: PriceSource::Station,
                price_id: Some(parse_id(&row.id)?),
            });
        }

        let latest = fuel_prices::Entity::find()
            .filter(fuel_prices::Column::OrganizationId.eq(principal.org()))
            .filter(fuel_prices::Column::FuelId.eq(fuel_id.to_string()))
            .order_by_desc(fuel_prices::Column::EffectiveDate)
            .order_by_desc(fuel_prices::Column::CreatedAt)
            .one(db)
            .await?;
        if let Some(row) = latest {
            return Ok(EffectivePrice {
                price: Money::new(row.price_minor),
                source: PriceSource::Latest,
                price_id: Some(parse_id(&row.id)?),
            });
        }

        tracing::warn!(%fuel_id, %station_id, "no price row, using fallback price");
        Ok(EffectivePrice {
            price: FALLBACK_PRICE,
            source: PriceSource::Fallback,
            price_id: None,
        })
    }
}
