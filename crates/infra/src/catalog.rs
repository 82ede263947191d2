//! Supplier-side catalog operations that touch stock.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument};

use orderdesk_catalog::{NewProduct, Product, ProductUpdate};
use orderdesk_core::{ProductId, UserId};
use orderdesk_inventory::available_or_zero;
use orderdesk_orders::OrderError;
use orderdesk_parties::Party;
use orderdesk_units::{UnitCode, UnitTable};

use crate::error::ServiceError;
use crate::ledger::{InventoryLedger, StockMovement};
use crate::store::{Store, StoreTx};

/// Stock of one product, in its base unit and in a requested unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockInfo {
    pub product_id: ProductId,
    pub product_name: String,
    pub base_unit: UnitCode,
    pub base_quantity: f64,
    pub unit: UnitCode,
    pub quantity: f64,
}

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
    units: Arc<UnitTable>,
    ledger: InventoryLedger,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>, units: Arc<UnitTable>) -> Self {
        Self {
            store,
            ledger: InventoryLedger::new(units.clone()),
            units,
        }
    }

    pub fn units(&self) -> &UnitTable {
        &self.units
    }

    /// Create a product owned by `supplier_id`, with its opening stock row
    /// when `initial_stock` is given.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        supplier_id: UserId,
        input: NewProduct,
    ) -> Result<Product, ServiceError> {
        input.validate(&self.units)?;

        let mut tx = self.store.begin().await?;
        tx.find_party(supplier_id)
            .await?
            .filter(Party::is_active_supplier)
            .ok_or(OrderError::InvalidSupplier)?;

        let initial_stock = input.initial_stock;
        let product = input.into_product(supplier_id, Utc::now());
        tx.insert_product(&product).await?;

        if let Some(stock) = initial_stock {
            let movement = StockMovement::for_product(&product, stock, &product.base_unit, stock);
            self.ledger.adjust(tx.as_mut(), movement).await?;
        }
        tx.commit().await?;

        info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// Edit or deactivate a product. Only the owning supplier may change it.
    ///
    /// Deactivated products stay readable but can no longer be ordered; stock
    /// and existing orders are untouched.
    #[instrument(skip(self, update))]
    pub async fn update_product(
        &self,
        supplier_id: UserId,
        product_id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, ServiceError> {
        let mut tx = self.store.begin().await?;
        let mut product = owned_product(tx.as_mut(), product_id, supplier_id).await?;

        update.apply(&mut product, Utc::now())?;
        tx.update_product(&product).await?;
        tx.commit().await?;

        info!(%product_id, is_active = product.is_active, "product updated");
        Ok(product)
    }

    /// Apply a signed stock change expressed in any unit of the product's
    /// dimension. Only the owning supplier may adjust.
    #[instrument(skip(self))]
    pub async fn adjust_stock(
        &self,
        supplier_id: UserId,
        product_id: ProductId,
        delta: f64,
        unit_code: UnitCode,
    ) -> Result<StockInfo, ServiceError> {
        let mut tx = self.store.begin().await?;
        let product = owned_product(tx.as_mut(), product_id, supplier_id).await?;

        let unit = self
            .units
            .compatible_unit(&unit_code, &product.base_unit)
            .map_err(|e| OrderError::from_unit(product.id, e))?;
        let delta_base = self
            .units
            .to_base(delta, &unit.code)
            .map_err(|e| OrderError::from_unit(product.id, e))?;

        let quantity = self
            .ledger
            .adjust(
                tx.as_mut(),
                StockMovement::for_product(&product, delta_base, &unit.code, delta.abs()),
            )
            .await?;
        tx.commit().await?;

        info!(%product_id, delta_base, quantity, "stock adjusted");
        self.describe(&product, quantity, &unit.code)
    }

    /// Available stock of a product, optionally also in `unit`.
    #[instrument(skip(self))]
    pub async fn stock_info(
        &self,
        product_id: ProductId,
        unit: Option<UnitCode>,
    ) -> Result<StockInfo, ServiceError> {
        let mut tx = self.store.begin().await?;
        let product = tx
            .find_product(product_id)
            .await?
            .ok_or(OrderError::NotFound)?;
        let base_quantity = available_or_zero(self.ledger.get(tx.as_mut(), product_id).await?);

        let unit = unit.unwrap_or_else(|| product.base_unit.clone());
        self.describe(&product, base_quantity, &unit)
    }

    fn describe(
        &self,
        product: &Product,
        base_quantity: f64,
        unit: &UnitCode,
    ) -> Result<StockInfo, ServiceError> {
        let unit = self
            .units
            .compatible_unit(unit, &product.base_unit)
            .map_err(|e| OrderError::from_unit(product.id, e))?;
        let quantity = self
            .units
            .from_base(base_quantity, &unit.code)
            .map_err(|e| OrderError::from_unit(product.id, e))?;

        Ok(StockInfo {
            product_id: product.id,
            product_name: product.name.clone(),
            base_unit: product.base_unit.clone(),
            base_quantity,
            unit: unit.code.clone(),
            quantity,
        })
    }
}

async fn owned_product(
    tx: &mut dyn StoreTx,
    product_id: ProductId,
    supplier_id: UserId,
) -> Result<Product, ServiceError> {
    Ok(tx
        .find_product(product_id)
        .await?
        .filter(|p| p.supplier_id == supplier_id)
        .ok_or(OrderError::NotFound)?)
}
