use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use orderdesk_core::UserId;
use orderdesk_orders::{OrderError, OrderView, PlaceOrder, ResolvedLine, StatusChange, plan_order};
use orderdesk_parties::Party;
use orderdesk_units::UnitTable;

use crate::error::ServiceError;
use crate::ledger::InventoryLedger;
use crate::store::Store;

/// Places buyer orders against current stock.
///
/// Stock is only checked here; it is deducted when the supplier approves.
#[derive(Clone)]
pub struct OrderPlacementEngine {
    store: Arc<dyn Store>,
    units: Arc<UnitTable>,
    ledger: InventoryLedger,
    default_currency: String,
}

impl OrderPlacementEngine {
    pub fn new(
        store: Arc<dyn Store>,
        units: Arc<UnitTable>,
        default_currency: impl Into<String>,
    ) -> Self {
        Self {
            store,
            ledger: InventoryLedger::new(units.clone()),
            units,
            default_currency: default_currency.into(),
        }
    }

    /// Validate and persist a new `PENDING` order in one transaction.
    ///
    /// Product and unit problems fail on the first offending line; stock
    /// shortfalls are collected over all lines into `MultipleStockErrors`.
    #[instrument(
        skip(self, request),
        fields(supplier_id = %request.supplier_id, items = request.items.len())
    )]
    pub async fn place_order(
        &self,
        buyer_id: UserId,
        request: PlaceOrder,
    ) -> Result<OrderView, ServiceError> {
        request.validate()?;
        let currency = request.currency_or(&self.default_currency)?;

        let mut tx = self.store.begin().await?;

        let supplier = tx
            .find_party(request.supplier_id)
            .await?
            .filter(Party::is_active_supplier)
            .ok_or(OrderError::InvalidSupplier)?;
        let buyer = tx
            .find_party(buyer_id)
            .await?
            .ok_or_else(|| OrderError::validation("buyer account not found"))?;

        let mut lines = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let product = tx.find_product(item.product_id).await?;
            let line = ResolvedLine::resolve(&self.units, supplier.id, item, product)?;
            let available = self.ledger.get(tx.as_mut(), line.product.id).await?;
            lines.push(line.with_available(available));
        }

        let order = plan_order(&self.units, buyer.id, supplier.id, currency, lines, Utc::now())?;
        let placed = StatusChange::placed(order.id, buyer.id, order.created_at);

        tx.insert_order(&order).await?;
        tx.append_status_change(&placed).await?;
        tx.commit().await?;

        info!(
            order_id = %order.id,
            total = %order.total_amount,
            currency = %order.currency,
            "order placed"
        );
        Ok(OrderView::assemble(order, &buyer, &supplier, vec![placed]))
    }
}
