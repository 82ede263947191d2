use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use orderdesk_core::{OrderId, Role, UserId};
use orderdesk_orders::{InventoryEffect, Order, OrderError, OrderStatus, OrderView};
use orderdesk_units::UnitTable;

use crate::error::ServiceError;
use crate::ledger::{InventoryLedger, StockMovement};
use crate::queries::{assemble_view, recent};
use crate::store::{Store, StoreTx};

/// History rows returned with a status update.
const RECENT_HISTORY: usize = 5;

/// Drives order status transitions and their inventory side effects.
#[derive(Clone)]
pub struct OrderLifecycleEngine {
    store: Arc<dyn Store>,
    ledger: InventoryLedger,
}

impl OrderLifecycleEngine {
    pub fn new(store: Arc<dyn Store>, units: Arc<UnitTable>) -> Self {
        Self {
            store,
            ledger: InventoryLedger::new(units),
        }
    }

    /// Supplier-driven transition.
    ///
    /// Orders of other suppliers are reported as `NotFound`. If any item's
    /// stock adjustment fails, nothing is written and the order keeps its
    /// prior status.
    #[instrument(skip(self, reason), fields(to = %new_status))]
    pub async fn update_order_status(
        &self,
        order_id: OrderId,
        supplier_id: UserId,
        new_status: OrderStatus,
        reason: Option<String>,
    ) -> Result<OrderView, ServiceError> {
        let mut tx = self.store.begin().await?;

        let mut order = tx
            .lock_order(order_id)
            .await?
            .filter(|o| o.is_visible_to(Role::Supplier, supplier_id))
            .ok_or(OrderError::NotFound)?;
        let from = order.status;

        let (effect, change) = order.transition(
            Role::Supplier,
            supplier_id,
            new_status,
            reason.unwrap_or_default(),
            Utc::now(),
        )?;

        self.apply_effect(tx.as_mut(), &order, effect).await?;
        tx.update_order_status(order.id, order.status, order.updated_at).await?;
        tx.append_status_change(&change).await?;

        let history = recent(tx.status_history(order.id).await?, RECENT_HISTORY);
        let view = assemble_view(tx.as_mut(), order, history).await?;
        tx.commit().await?;

        info!(%order_id, %from, to = %new_status, ?effect, "order status updated");
        Ok(view)
    }

    /// Buyer cancellation, only while the order is still `PENDING`.
    #[instrument(skip(self, reason))]
    pub async fn cancel_order(
        &self,
        order_id: OrderId,
        buyer_id: UserId,
        reason: Option<String>,
    ) -> Result<OrderView, ServiceError> {
        let mut tx = self.store.begin().await?;

        let mut order = tx
            .lock_order(order_id)
            .await?
            .filter(|o| o.is_visible_to(Role::Buyer, buyer_id))
            .ok_or(OrderError::NotFound)?;

        let change = order.cancel_by_buyer(buyer_id, reason, Utc::now())?;
        tx.update_order_status(order.id, order.status, order.updated_at).await?;
        tx.append_status_change(&change).await?;

        let history = recent(tx.status_history(order.id).await?, RECENT_HISTORY);
        let view = assemble_view(tx.as_mut(), order, history).await?;
        tx.commit().await?;

        info!(%order_id, "order cancelled by buyer");
        Ok(view)
    }

    async fn apply_effect(
        &self,
        tx: &mut dyn StoreTx,
        order: &Order,
        effect: InventoryEffect,
    ) -> Result<(), ServiceError> {
        if effect == InventoryEffect::None {
            return Ok(());
        }

        // Fixed lock order across transactions touching the same products.
        let mut items: Vec<_> = order.items.iter().collect();
        items.sort_by_key(|item| item.product_id);

        for item in items {
            self.ledger.adjust(tx, StockMovement::for_item(item, effect)).await?;
        }
        Ok(())
    }
}
