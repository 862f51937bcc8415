use sea_orm::{ActiveValue, DatabaseTransaction, TransactionTrait, prelude::*};

use crate::{EngineError, Money, ResultEngine, organizations, variance::Tolerance};

use super::{Engine, Principal, with_tx};

impl Engine {
    /// Variance tolerance of the caller's organization.
    pub async fn tolerance(&self, principal: &Principal) -> ResultEngine<Tolerance> {
        with_tx!(self, |db_tx| self.load_tolerance(&db_tx, principal).await)
    }

    /// Replaces the variance tolerance. Only owners may change it.
    pub async fn set_tolerance(
        &self,
        principal: &Principal,
        tolerance: Tolerance,
    ) -> ResultEngine<Tolerance> {
        if principal.role != super::Role::Owner {
            return Err(EngineError::Forbidden(
                "only owners can change the tolerance".to_string(),
            ));
        }
        let tolerance = Tolerance::new(tolerance.basis_points, tolerance.flat)?;
        with_tx!(self, |db_tx| {
            let org = self.require_organization(&db_tx, principal).await?;
            let mut active: organizations::ActiveModel = org.into();
            active.tolerance_bp = ActiveValue::Set(tolerance.basis_points);
            active.tolerance_flat_minor = ActiveValue::Set(tolerance.flat.minor());
            active.update(&db_tx).await?;
            tracing::info!(
                organization_id = %principal.organization_id,
                basis_points = tolerance.basis_points,
                flat = %tolerance.flat,
                "tolerance updated"
            );
            Ok(tolerance)
        })
    }

    pub(super) async fn load_tolerance(
        &self,
        db: &DatabaseTransaction,
        principal: &Principal,
    ) -> ResultEngine<Tolerance> {
        let org = self.require_organization(db, principal).await?;
        Ok(Tolerance {
            basis_points: org.tolerance_bp,
            flat: Money::new(org.tolerance_flat_minor),
        })
    }

    async fn require_organization(
        &self,
        db: &DatabaseTransaction,
        principal: &Principal,
    ) -> ResultEngine<organizations::Model> {
        organizations::Entity::find_by_id(principal.org())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("organization not exists".to_string()))
    }
}
