use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, credit_customers, deliveries, fuels, nozzles, pumpers, safes,
    shifts, shop_products, stations, tanks, users, util::parse_id,
};

use super::{Engine, with_tx};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Manager,
    Viewer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Manager => "manager",
            Self::Viewer => "viewer",
        }
    }

    pub fn can_write(self) -> bool {
        matches!(self, Self::Owner | Self::Manager)
    }
}

impl TryFrom<&str> for Role {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "owner" => Ok(Self::Owner),
            "manager" => Ok(Self::Manager),
            "viewer" => Ok(Self::Viewer),
            other => Err(EngineError::InvalidAmount(format!("invalid role: {other}"))),
        }
    }
}

/// The authenticated caller: who they are, which organization they act in and
/// what they may do there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub organization_id: Uuid,
    pub role: Role,
}

impl Principal {
    pub(super) fn org(&self) -> String {
        self.organization_id.to_string()
    }

    pub(super) fn require_write(&self) -> ResultEngine<()> {
        if !self.role.can_write() {
            return Err(EngineError::Forbidden(format!(
                "{} cannot modify data",
                self.role.as_str()
            )));
        }
        Ok(())
    }
}

impl TryFrom<users::Model> for Principal {
    type Error = EngineError;

    fn try_from(model: users::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            organization_id: parse_id(&model.organization_id)?,
            role: Role::try_from(model.role.as_str())?,
            username: model.username,
        })
    }
}

/// Generates a `require_*` method that loads a row by id and checks it belongs
/// to the caller's organization. Rows of other organizations are reported as
/// missing.
macro_rules! impl_require_in_org {
    ($require_fn:ident, $entity:path, $model:path, $org_col:expr, $err_msg:literal) => {
        pub(super) async fn $require_fn(
            &self,
            db: &DatabaseTransaction,
            principal: &Principal,
            id: Uuid,
        ) -> ResultEngine<$model> {
            <$entity>::find_by_id(id.to_string())
                .filter($org_col.eq(principal.org()))
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound($err_msg.to_string()))
        }
    };
}

impl Engine {
    /// Checks Basic credentials against the users table.
    ///
    /// Unknown users and wrong passwords are indistinguishable to the caller.
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<Principal> {
        let unauthorized = || EngineError::KeyNotFound("invalid credentials".to_string());
        let user = users::Entity::find_by_id(username.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(unauthorized)?;
        let verified = bcrypt::verify(password, &user.password).unwrap_or(false);
        if !verified {
            return Err(unauthorized());
        }
        Principal::try_from(user)
    }

    /// Loads the principal for a known username without checking a password.
    pub async fn principal(&self, username: &str) -> ResultEngine<Principal> {
        with_tx!(self, |db_tx| {
            let user = users::Entity::find_by_id(username.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;
            Principal::try_from(user)
        })
    }

    impl_require_in_org!(
        require_station,
        stations::Entity,
        stations::Model,
        stations::Column::OrganizationId,
        "station not exists"
    );

    impl_require_in_org!(
        require_fuel,
        fuels::Entity,
        fuels::Model,
        fuels::Column::OrganizationId,
        "fuel not exists"
    );

    impl_require_in_org!(
        require_pumper,
        pumpers::Entity,
        pumpers::Model,
        pumpers::Column::OrganizationId,
        "pumper not exists"
    );

    impl_require_in_org!(
        require_shift,
        shifts::Entity,
        shifts::Model,
        shifts::Column::OrganizationId,
        "shift not exists"
    );

    impl_require_in_org!(
        require_product,
        shop_products::Entity,
        shop_products::Model,
        shop_products::Column::OrganizationId,
        "product not exists"
    );

    impl_require_in_org!(
        require_delivery,
        deliveries::Entity,
        deliveries::Model,
        deliveries::Column::OrganizationId,
        "delivery not exists"
    );

    impl_require_in_org!(
        require_customer,
        credit_customers::Entity,
        credit_customers::Model,
        credit_customers::Column::OrganizationId,
        "credit customer not exists"
    );

    pub(super) async fn require_tank(
        &self,
        db: &DatabaseTransaction,
        principal: &Principal,
        tank_id: Uuid,
    ) -> ResultEngine<tanks::Model> {
        let tank = tanks::Entity::find_by_id(tank_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("tank not exists".to_string()))?;
        self.require_station(db, principal, parse_id(&tank.station_id)?)
            .await
            .map_err(|_| EngineError::KeyNotFound("tank not exists".to_string()))?;
        Ok(tank)
    }

    pub(super) async fn require_nozzle(
        &self,
        db: &DatabaseTransaction,
        principal: &Principal,
        nozzle_id: Uuid,
    ) -> ResultEngine<nozzles::Model> {
        let nozzle = nozzles::Entity::find_by_id(nozzle_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("nozzle not exists".to_string()))?;
        self.require_station(db, principal, parse_id(&nozzle.station_id)?)
            .await
            .map_err(|_| EngineError::KeyNotFound("nozzle not exists".to_string()))?;
        Ok(nozzle)
    }

    /// The safe of a station, if one was ever opened.
    pub(super) async fn find_safe(
        &self,
        db: &DatabaseTransaction,
        principal: &Principal,
        station_id: Uuid,
    ) -> ResultEngine<Option<safes::Model>> {
        safes::Entity::find()
            .filter(safes::Column::StationId.eq(station_id.to_string()))
            .filter(safes::Column::OrganizationId.eq(principal.org()))
            .one(db)
            .await
            .map_err(Into::into)
    }
}
