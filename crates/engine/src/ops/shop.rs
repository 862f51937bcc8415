use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Money, NewProductCmd, PurchaseCmd, Quantity, ResultEngine, ShiftStatus,
    ShopAssignment, ShopItem, WastageCmd,
    fifo::{self, BatchStock, FifoPlan},
    shop_assignments, shop_batches, shop_items, shop_products, shop_sales, shop_wastage,
    util::{normalize_optional_text, normalize_required_name, parse_id},
};

use super::{Engine, Principal, with_tx};

/// What a wastage entry drew from stock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WastageOutcome {
    pub wastage_id: Uuid,
    pub drawn: Quantity,
    /// Part of the wastage no batch could cover.
    pub untracked: Quantity,
}

impl Engine {
    pub async fn new_product(&self, principal: &Principal, cmd: NewProductCmd) -> ResultEngine<Uuid> {
        principal.require_write()?;
        let name = normalize_required_name(&cmd.name, "product")?;
        let unit = normalize_required_name(&cmd.unit, "unit")?;
        if cmd.selling_price.is_negative() {
            return Err(EngineError::InvalidAmount(
                "selling price must be >= 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let exists = shop_products::Entity::find()
                .filter(shop_products::Column::OrganizationId.eq(principal.org()))
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let id = Uuid::new_v4();
            shop_products::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                organization_id: ActiveValue::Set(principal.org()),
                name: ActiveValue::Set(name),
                unit: ActiveValue::Set(unit),
                selling_price_minor: ActiveValue::Set(cmd.selling_price.minor()),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            Ok(id)
        })
    }

    /// Records a purchase batch; its whole quantity is available to FIFO.
    pub async fn record_purchase(&self, principal: &Principal, cmd: PurchaseCmd) -> ResultEngine<Uuid> {
        principal.require_write()?;
        if !cmd.quantity.is_positive() {
            return Err(EngineError::InvalidAmount(
                "purchase quantity must be > 0".to_string(),
            ));
        }
        if cmd.cost_price.is_negative() {
            return Err(EngineError::InvalidAmount(
                "cost price must be >= 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            self.require_product(&db_tx, principal, cmd.product_id).await?;

            let id = Uuid::new_v4();
            shop_batches::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                product_id: ActiveValue::Set(cmd.product_id.to_string()),
                purchase_date: ActiveValue::Set(cmd.purchase_date),
                cost_price_minor: ActiveValue::Set(cmd.cost_price.minor()),
                original_quantity_milli: ActiveValue::Set(cmd.quantity.milli()),
                current_quantity_milli: ActiveValue::Set(cmd.quantity.milli()),
                supplier: ActiveValue::Set(normalize_optional_text(cmd.supplier.as_deref())),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(batch_id = %id, product_id = %cmd.product_id, quantity = %cmd.quantity, "purchase recorded");
            Ok(id)
        })
    }

    /// Opens a shop counter for a pumper in an open shift.
    ///
    /// Each product starts at its total remaining batch stock. Without an
    /// explicit product list every product of the organization is tracked.
    pub async fn open_shop_assignment(
        &self,
        principal: &Principal,
        shift_id: Uuid,
        pumper_id: Uuid,
        product_ids: &[Uuid],
    ) -> ResultEngine<ShopAssignment> {
        principal.require_write()?;
        with_tx!(self, |db_tx| {
            let shift = self.require_shift(&db_tx, principal, shift_id).await?;
            if shift.status != ShiftStatus::Open.as_str() {
                return Err(EngineError::InvalidState("shift is not open".to_string()));
            }
            let pumper = self.require_pumper(&db_tx, principal, pumper_id).await?;

            let duplicate = shop_assignments::Entity::find()
                .filter(shop_assignments::Column::ShiftId.eq(shift.id.clone()))
                .filter(shop_assignments::Column::PumperId.eq(pumper.id.clone()))
                .filter(shop_assignments::Column::Status.eq(ShiftStatus::Open.as_str()))
                .one(&db_tx)
                .await?
                .is_some();
            if duplicate {
                return Err(EngineError::ExistingKey(format!(
                    "open shop assignment for {}",
                    pumper.name
                )));
            }

            let products = if product_ids.is_empty() {
                shop_products::Entity::find()
                    .filter(shop_products::Column::OrganizationId.eq(principal.org()))
                    .order_by_asc(shop_products::Column::Name)
                    .all(&db_tx)
                    .await?
            } else {
                let mut products = Vec::with_capacity(product_ids.len());
                for product_id in product_ids {
                    products.push(self.require_product(&db_tx, principal, *product_id).await?);
                }
                products
            };

            let assignment_id = Uuid::new_v4().to_string();
            let assignment = shop_assignments::ActiveModel {
                id: ActiveValue::Set(assignment_id.clone()),
                shift_id: ActiveValue::Set(shift.id),
                pumper_id: ActiveValue::Set(pumper.id),
                status: ActiveValue::Set(ShiftStatus::Open.as_str().to_string()),
                total_revenue_minor: ActiveValue::Set(0),
                opened_at: ActiveValue::Set(Utc::now()),
                closed_at: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await?;

            let mut items = Vec::with_capacity(products.len());
            for product in products {
                let opening: Quantity = self
                    .batches_in_stock(&db_tx, &product.id)
                    .await?
                    .iter()
                    .map(|batch| Quantity::from_milli(batch.current_quantity_milli))
                    .sum();
                let item = shop_items::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4().to_string()),
                    assignment_id: ActiveValue::Set(assignment_id.clone()),
                    product_id: ActiveValue::Set(product.id),
                    opening_stock_milli: ActiveValue::Set(opening.milli()),
                    added_stock_milli: ActiveValue::Set(0),
                    closing_stock_milli: ActiveValue::Set(None),
                    sold_quantity_milli: ActiveValue::Set(None),
                    revenue_minor: ActiveValue::Set(None),
                }
                .insert(&db_tx)
                .await?;
                items.push(ShopItem::try_from(item)?);
            }

            let mut result = ShopAssignment::try_from(assignment)?;
            result.items = items;
            Ok(result)
        })
    }

    /// Adds stock handed to the counter during the shift.
    pub async fn add_shop_stock(
        &self,
        principal: &Principal,
        assignment_id: Uuid,
        product_id: Uuid,
        quantity: Quantity,
    ) -> ResultEngine<ShopItem> {
        principal.require_write()?;
        if !quantity.is_positive() {
            return Err(EngineError::InvalidAmount(
                "added quantity must be > 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let assignment = self
                .require_shop_assignment(&db_tx, principal, assignment_id)
                .await?;
            if assignment.status != ShiftStatus::Open.as_str() {
                return Err(EngineError::InvalidState(
                    "shop assignment is closed".to_string(),
                ));
            }
            let item = shop_items::Entity::find()
                .filter(shop_items::Column::AssignmentId.eq(assignment.id))
                .filter(shop_items::Column::ProductId.eq(product_id.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("shop item not exists".to_string()))?;

            let added = Quantity::from_milli(item.added_stock_milli) + quantity;
            let mut active: shop_items::ActiveModel = item.into();
            active.added_stock_milli = ActiveValue::Set(added.milli());
            let updated = active.update(&db_tx).await?;
            ShopItem::try_from(updated)
        })
    }

    /// Closes a shop counter with the counted closing stock of every item.
    ///
    /// `sold = opening + added - closing` is drawn from the product's batches
    /// oldest first, writing one sale row per batch touched. Quantity the
    /// batches cannot cover is written as an untracked sale at zero cost.
    pub async fn close_shop_assignment(
        &self,
        principal: &Principal,
        assignment_id: Uuid,
        closing: &[(Uuid, Quantity)],
    ) -> ResultEngine<ShopAssignment> {
        principal.require_write()?;
        let closing: HashMap<String, Quantity> = closing
            .iter()
            .map(|(product_id, qty)| (product_id.to_string(), *qty))
            .collect();
        if closing.values().any(|qty| qty.is_negative()) {
            return Err(EngineError::InvalidAmount(
                "closing stock must be >= 0".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let assignment = self
                .require_shop_assignment(&db_tx, principal, assignment_id)
                .await?;
            if assignment.status != ShiftStatus::Open.as_str() {
                return Err(EngineError::InvalidState(
                    "shop assignment already closed".to_string(),
                ));
            }

            let items = shop_items::Entity::find()
                .filter(shop_items::Column::AssignmentId.eq(assignment.id.clone()))
                .all(&db_tx)
                .await?;
            if let Some(unknown) = closing
                .keys()
                .find(|product_id| !items.iter().any(|item| &item.product_id == *product_id))
            {
                return Err(EngineError::KeyNotFound(format!(
                    "product {unknown} is not part of this assignment"
                )));
            }

            let mut total_revenue = Money::ZERO;
            let mut closed_items = Vec::with_capacity(items.len());
            for item in items {
                let closing_stock = closing.get(&item.product_id).copied().ok_or_else(|| {
                    EngineError::InvalidAmount(format!(
                        "missing closing stock for product {}",
                        item.product_id
                    ))
                })?;
                let available = Quantity::from_milli(item.opening_stock_milli)
                    + Quantity::from_milli(item.added_stock_milli);
                let sold = available - closing_stock;
                if sold.is_negative() {
                    return Err(EngineError::InvalidAmount(format!(
                        "closing stock {closing_stock} exceeds available {available}"
                    )));
                }

                let product = shop_products::Entity::find_by_id(item.product_id.clone())
                    .one(&db_tx)
                    .await?
                    .ok_or_else(|| EngineError::KeyNotFound("product not exists".to_string()))?;
                let selling_price = Money::new(product.selling_price_minor);

                let plan = self.draw_fifo(&db_tx, &product.id, sold).await?;
                let now = Utc::now();
                for draw in &plan.draws {
                    self.insert_sale(
                        &db_tx,
                        &item.id,
                        &product.id,
                        Some(draw.batch_id.clone()),
                        draw.quantity,
                        draw.cost_price,
                        selling_price,
                        now,
                    )
                    .await?;
                }
                if plan.untracked.is_positive() {
                    tracing::warn!(
                        product_id = %product.id,
                        untracked = %plan.untracked,
                        "sold more than batch stock, recording untracked sale"
                    );
                    self.insert_sale(
                        &db_tx,
                        &item.id,
                        &product.id,
                        None,
                        plan.untracked,
                        Money::ZERO,
                        selling_price,
                        now,
                    )
                    .await?;
                }

                let revenue = selling_price.times(sold);
                total_revenue += revenue;

                let mut active: shop_items::ActiveModel = item.into();
                active.closing_stock_milli = ActiveValue::Set(Some(closing_stock.milli()));
                active.sold_quantity_milli = ActiveValue::Set(Some(sold.milli()));
                active.revenue_minor = ActiveValue::Set(Some(revenue.minor()));
                closed_items.push(ShopItem::try_from(active.update(&db_tx).await?)?);
            }

            let mut active: shop_assignments::ActiveModel = assignment.into();
            active.status = ActiveValue::Set(ShiftStatus::Closed.as_str().to_string());
            active.total_revenue_minor = ActiveValue::Set(total_revenue.minor());
            active.closed_at = ActiveValue::Set(Some(Utc::now()));
            let updated = active.update(&db_tx).await?;
            tracing::info!(%assignment_id, revenue = %total_revenue, "shop assignment closed");

            let mut result = ShopAssignment::try_from(updated)?;
            result.items = closed_items;
            Ok(result)
        })
    }

    /// Writes off stock, oldest batches first. A shortfall is only logged.
    pub async fn record_wastage(
        &self,
        principal: &Principal,
        cmd: WastageCmd,
    ) -> ResultEngine<WastageOutcome> {
        principal.require_write()?;
        if !cmd.quantity.is_positive() {
            return Err(EngineError::InvalidAmount(
                "wastage quantity must be > 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let product = self.require_product(&db_tx, principal, cmd.product_id).await?;
            let plan = self.draw_fifo(&db_tx, &product.id, cmd.quantity).await?;
            if plan.untracked.is_positive() {
                tracing::warn!(
                    product_id = %product.id,
                    untracked = %plan.untracked,
                    "wastage exceeds batch stock"
                );
            }

            let id = Uuid::new_v4();
            shop_wastage::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                product_id: ActiveValue::Set(product.id),
                quantity_milli: ActiveValue::Set(cmd.quantity.milli()),
                reason: ActiveValue::Set(normalize_optional_text(cmd.reason.as_deref())),
                recorded_by: ActiveValue::Set(principal.username.clone()),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;

            Ok(WastageOutcome {
                wastage_id: id,
                drawn: cmd.quantity - plan.untracked,
                untracked: plan.untracked,
            })
        })
    }

    async fn require_shop_assignment(
        &self,
        db: &DatabaseTransaction,
        principal: &Principal,
        assignment_id: Uuid,
    ) -> ResultEngine<shop_assignments::Model> {
        let assignment = shop_assignments::Entity::find_by_id(assignment_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("shop assignment not exists".to_string()))?;
        self.require_shift(db, principal, parse_id(&assignment.shift_id)?)
            .await
            .map_err(|_| EngineError::KeyNotFound("shop assignment not exists".to_string()))?;
        Ok(assignment)
    }

    async fn batches_in_stock(
        &self,
        db: &DatabaseTransaction,
        product_id: &str,
    ) -> ResultEngine<Vec<shop_batches::Model>> {
        shop_batches::Entity::find()
            .filter(shop_batches::Column::ProductId.eq(product_id.to_string()))
            .filter(shop_batches::Column::CurrentQuantityMilli.gt(0))
            .order_by_asc(shop_batches::Column::PurchaseDate)
            .order_by_asc(shop_batches::Column::CreatedAt)
            .all(db)
            .await
            .map_err(Into::into)
    }

    /// Plans a FIFO draw for a product and decrements the batches it touches.
    async fn draw_fifo(
        &self,
        db: &DatabaseTransaction,
        product_id: &str,
        quantity: Quantity,
    ) -> ResultEngine<FifoPlan<String>> {
        let batches = self.batches_in_stock(db, product_id).await?;
        let stock: Vec<BatchStock<String>> = batches
            .iter()
            .map(|batch| BatchStock {
                batch_id: batch.id.clone(),
                remaining: Quantity::from_milli(batch.current_quantity_milli),
                cost_price: Money::new(batch.cost_price_minor),
            })
            .collect();
        let plan = fifo::plan(&stock, quantity)?;

        for draw in &plan.draws {
            let Some(batch) = batches.iter().find(|b| b.id == draw.batch_id).cloned() else {
                continue;
            };
            let left = Quantity::from_milli(batch.current_quantity_milli) - draw.quantity;
            let mut active: shop_batches::ActiveModel = batch.into();
            active.current_quantity_milli = ActiveValue::Set(left.milli());
            active.update(db).await?;
        }
        Ok(plan)
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_sale(
        &self,
        db: &DatabaseTransaction,
        item_id: &str,
        product_id: &str,
        batch_id: Option<String>,
        quantity: Quantity,
        cost_price: Money,
        selling_price: Money,
        at: chrono::DateTime<Utc>,
    ) -> ResultEngine<()> {
        shop_sales::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            item_id: ActiveValue::Set(item_id.to_string()),
            product_id: ActiveValue::Set(product_id.to_string()),
            batch_id: ActiveValue::Set(batch_id),
            quantity_milli: ActiveValue::Set(quantity.milli()),
            cost_price_minor: ActiveValue::Set(cost_price.minor()),
            selling_price_minor: ActiveValue::Set(selling_price.minor()),
            created_at: ActiveValue::Set(at),
        }
        .insert(db)
        .await?;
        Ok(())
    }
}
