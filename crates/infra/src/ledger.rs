//! Inventory ledger: the only write path for stock.
//!
//! Every adjustment goes through [`InventoryLedger::adjust`] inside the
//! caller's transaction, so non-negativity is enforced uniformly and a failed
//! adjustment rolls back with everything else the transaction did.

use std::sync::Arc;

use tracing::{debug, instrument};

use orderdesk_catalog::Product;
use orderdesk_core::ProductId;
use orderdesk_inventory::{InventoryError, StockShortfall, apply_delta};
use orderdesk_orders::{InventoryEffect, OrderError, OrderItem};
use orderdesk_units::{UnitCode, UnitTable};

use crate::error::ServiceError;
use crate::store::{StoreError, StoreTx};

/// A signed stock change plus the context needed to explain a shortfall.
#[derive(Debug, Clone, Copy)]
pub struct StockMovement<'a> {
    pub product_id: ProductId,
    pub product_name: &'a str,
    pub base_unit: &'a UnitCode,
    /// Signed change in the base unit.
    pub delta_base: f64,
    /// Unit and quantity the caller expressed the change in.
    pub unit: &'a UnitCode,
    pub quantity: f64,
}

impl<'a> StockMovement<'a> {
    /// Movement applying `effect` to one order line, from its placement snapshot.
    pub fn for_item(item: &'a OrderItem, effect: InventoryEffect) -> Self {
        Self {
            product_id: item.product_id,
            product_name: &item.product_name,
            base_unit: &item.base_unit_code,
            delta_base: effect.sign() * item.quantity_base,
            unit: &item.unit_code,
            quantity: item.quantity,
        }
    }

    pub fn for_product(
        product: &'a Product,
        delta_base: f64,
        unit: &'a UnitCode,
        quantity: f64,
    ) -> Self {
        Self {
            product_id: product.id,
            product_name: &product.name,
            base_unit: &product.base_unit,
            delta_base,
            unit,
            quantity,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InventoryLedger {
    units: Arc<UnitTable>,
}

impl InventoryLedger {
    pub fn new(units: Arc<UnitTable>) -> Self {
        Self { units }
    }

    /// Current stock; `None` when the product never had an inventory row.
    pub async fn get(
        &self,
        tx: &mut dyn StoreTx,
        product_id: ProductId,
    ) -> Result<Option<f64>, StoreError> {
        tx.inventory_quantity(product_id).await
    }

    /// Lock the stock row, add `movement.delta_base` and store the rounded
    /// result, which is returned.
    ///
    /// Fails with `InsufficientStock` when the result would be negative;
    /// nothing is written in that case.
    #[instrument(skip_all, fields(product_id = %movement.product_id, delta = movement.delta_base))]
    pub async fn adjust(
        &self,
        tx: &mut dyn StoreTx,
        movement: StockMovement<'_>,
    ) -> Result<f64, ServiceError> {
        if !movement.delta_base.is_finite() {
            return Err(OrderError::validation(format!(
                "stock change must be a finite number, got {}",
                movement.delta_base
            ))
            .into());
        }

        let prior = tx.lock_inventory(movement.product_id).await?;
        match apply_delta(Some(prior), movement.delta_base) {
            Ok(quantity) => {
                tx.set_inventory(movement.product_id, quantity).await?;
                debug!(prior, quantity, "inventory adjusted");
                Ok(quantity)
            }
            Err(InventoryError::NegativeStock { available, .. }) => {
                Err(OrderError::InsufficientStock(self.shortfall(&movement, available)?).into())
            }
            Err(other) => Err(OrderError::validation(other.to_string()).into()),
        }
    }

    fn shortfall(
        &self,
        movement: &StockMovement<'_>,
        available: f64,
    ) -> Result<StockShortfall, OrderError> {
        let unit = self
            .units
            .get(movement.unit)
            .map_err(|e| OrderError::from_unit(movement.product_id, e))?;
        let base_unit = self
            .units
            .get(movement.base_unit)
            .map_err(|e| OrderError::from_unit(movement.product_id, e))?;

        Ok(StockShortfall::new(
            movement.product_id,
            movement.product_name,
            movement.quantity,
            unit,
            available.max(0.0),
            base_unit,
        ))
    }
}
