use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    AssignmentStatus, EngineError, NewNozzleCmd, NewPumperCmd, NewTankCmd, Quantity,
    ResultEngine, fuels, nozzles, organizations, pumpers, shift_assignments, stations, tanks,
    users,
    util::{normalize_optional_text, normalize_required_name, parse_id},
    variance::Tolerance,
};

use super::{Engine, Principal, Role, with_tx};

impl Engine {
    /// Creates a tenant with the default variance tolerance.
    pub async fn new_organization(&self, name: &str) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "organization")?;
        let tolerance = Tolerance::default();
        with_tx!(self, |db_tx| {
            let id = Uuid::new_v4();
            organizations::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                name: ActiveValue::Set(name),
                tolerance_bp: ActiveValue::Set(tolerance.basis_points),
                tolerance_flat_minor: ActiveValue::Set(tolerance.flat.minor()),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            Ok(id)
        })
    }

    /// Creates a login for an organization. The password is stored as a bcrypt
    /// hash.
    pub async fn new_user(
        &self,
        username: &str,
        password: &str,
        organization_id: Uuid,
        role: Role,
    ) -> ResultEngine<()> {
        let username = normalize_required_name(username, "user")?;
        if password.is_empty() {
            return Err(EngineError::InvalidAmount(
                "password must not be empty".to_string(),
            ));
        }
        let hash = bcrypt::hash(password, self.password_cost)
            .map_err(|err| EngineError::InvalidState(format!("cannot hash password: {err}")))?;

        with_tx!(self, |db_tx| {
            organizations::Entity::find_by_id(organization_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("organization not exists".to_string()))?;
            if users::Entity::find_by_id(username.clone())
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(username));
            }
            users::ActiveModel {
                username: ActiveValue::Set(username),
                password: ActiveValue::Set(hash),
                organization_id: ActiveValue::Set(organization_id.to_string()),
                role: ActiveValue::Set(role.as_str().to_string()),
            }
            .insert(&db_tx)
            .await?;
            Ok(())
        })
    }

    pub async fn new_station(
        &self,
        principal: &Principal,
        name: &str,
        location: Option<&str>,
    ) -> ResultEngine<Uuid> {
        principal.require_write()?;
        let name = normalize_required_name(name, "station")?;
        with_tx!(self, |db_tx| {
            let exists = stations::Entity::find()
                .filter(stations::Column::OrganizationId.eq(principal.org()))
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let id = Uuid::new_v4();
            stations::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                organization_id: ActiveValue::Set(principal.org()),
                name: ActiveValue::Set(name),
                location: ActiveValue::Set(normalize_optional_text(location)),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(station_id = %id, organization_id = %principal.organization_id, "station created");
            Ok(id)
        })
    }

    pub async fn new_fuel(&self, principal: &Principal, name: &str) -> ResultEngine<Uuid> {
        principal.require_write()?;
        let name = normalize_required_name(name, "fuel")?;
        with_tx!(self, |db_tx| {
            let exists = fuels::Entity::find()
                .filter(fuels::Column::OrganizationId.eq(principal.org()))
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let id = Uuid::new_v4();
            fuels::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                organization_id: ActiveValue::Set(principal.org()),
                name: ActiveValue::Set(name),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            Ok(id)
        })
    }

    pub async fn new_tank(&self, principal: &Principal, cmd: NewTankCmd) -> ResultEngine<Uuid> {
        principal.require_write()?;
        let name = normalize_required_name(&cmd.name, "tank")?;
        if !cmd.capacity.is_positive() {
            return Err(EngineError::InvalidAmount(
                "tank capacity must be > 0".to_string(),
            ));
        }
        if cmd.current_level.is_negative() || cmd.current_level > cmd.capacity {
            return Err(EngineError::InvalidAmount(
                "tank level must be between 0 and capacity".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            self.require_station(&db_tx, principal, cmd.station_id).await?;
            self.require_fuel(&db_tx, principal, cmd.fuel_id).await?;

            let id = Uuid::new_v4();
            tanks::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                station_id: ActiveValue::Set(cmd.station_id.to_string()),
                fuel_id: ActiveValue::Set(cmd.fuel_id.to_string()),
                name: ActiveValue::Set(name),
                capacity_milli: ActiveValue::Set(cmd.capacity.milli()),
                current_level_milli: ActiveValue::Set(cmd.current_level.milli()),
            }
            .insert(&db_tx)
            .await?;
            Ok(id)
        })
    }

    pub async fn new_nozzle(&self, principal: &Principal, cmd: NewNozzleCmd) -> ResultEngine<Uuid> {
        principal.require_write()?;
        if cmd.pump_number <= 0 || cmd.nozzle_number <= 0 {
            return Err(EngineError::InvalidAmount(
                "pump and nozzle numbers must be > 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            self.require_station(&db_tx, principal, cmd.station_id).await?;
            let tank = self.require_tank(&db_tx, principal, cmd.tank_id).await?;
            if tank.station_id != cmd.station_id.to_string() {
                return Err(EngineError::InvalidState(
                    "tank belongs to another station".to_string(),
                ));
            }

            let taken = nozzles::Entity::find()
                .filter(nozzles::Column::StationId.eq(cmd.station_id.to_string()))
                .filter(nozzles::Column::PumpNumber.eq(cmd.pump_number))
                .filter(nozzles::Column::NozzleNumber.eq(cmd.nozzle_number))
                .one(&db_tx)
                .await?
                .is_some();
            if taken {
                return Err(EngineError::ExistingKey(format!(
                    "pump {} nozzle {}",
                    cmd.pump_number, cmd.nozzle_number
                )));
            }

            let id = Uuid::new_v4();
            nozzles::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                station_id: ActiveValue::Set(cmd.station_id.to_string()),
                tank_id: ActiveValue::Set(cmd.tank_id.to_string()),
                pump_number: ActiveValue::Set(cmd.pump_number),
                nozzle_number: ActiveValue::Set(cmd.nozzle_number),
            }
            .insert(&db_tx)
            .await?;
            Ok(id)
        })
    }

    pub async fn new_pumper(&self, principal: &Principal, cmd: NewPumperCmd) -> ResultEngine<Uuid> {
        principal.require_write()?;
        let name = normalize_required_name(&cmd.name, "pumper")?;
        with_tx!(self, |db_tx| {
            if let Some(station_id) = cmd.station_id {
                self.require_station(&db_tx, principal, station_id).await?;
            }

            let id = Uuid::new_v4();
            pumpers::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                organization_id: ActiveValue::Set(principal.org()),
                station_id: ActiveValue::Set(cmd.station_id.map(|id| id.to_string())),
                name: ActiveValue::Set(name),
                employee_code: ActiveValue::Set(normalize_optional_text(
                    cmd.employee_code.as_deref(),
                )),
                active: ActiveValue::Set(true),
            }
            .insert(&db_tx)
            .await?;
            Ok(id)
        })
    }

    /// End reading of the newest closed assignment on a nozzle.
    ///
    /// Assignments are ordered by when they were opened, since `closed_at`
    /// holds the shift end on auto-closed rows. Returns `None` for a nozzle
    /// that was never closed.
    pub async fn nozzle_last_reading(
        &self,
        principal: &Principal,
        nozzle_id: Uuid,
    ) -> ResultEngine<Option<Quantity>> {
        with_tx!(self, |db_tx| {
            self.require_nozzle(&db_tx, principal, nozzle_id).await?;
            self.last_closed_reading(&db_tx, nozzle_id).await
        })
    }

    pub(super) async fn last_closed_reading(
        &self,
        db: &DatabaseTransaction,
        nozzle_id: Uuid,
    ) -> ResultEngine<Option<Quantity>> {
        let last = shift_assignments::Entity::find()
            .filter(shift_assignments::Column::NozzleId.eq(nozzle_id.to_string()))
            .filter(shift_assignments::Column::Status.eq(AssignmentStatus::Closed.as_str()))
            .order_by_desc(shift_assignments::Column::CreatedAt)
            .order_by_desc(shift_assignments::Column::ClosedAt)
            .one(db)
            .await?;
        Ok(last
            .and_then(|model| model.end_meter_milli)
            .map(Quantity::from_milli))
    }

    /// Station and fuel a nozzle dispenses, via its tank.
    pub(super) async fn nozzle_fuel(
        &self,
        db: &DatabaseTransaction,
        nozzle: &nozzles::Model,
    ) -> ResultEngine<(tanks::Model, Uuid)> {
        let tank = tanks::Entity::find_by_id(nozzle.tank_id.clone())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("tank not exists".to_string()))?;
        let fuel_id = parse_id(&tank.fuel_id)?;
        Ok((tank, fuel_id))
    }
}
