//! Read side: order detail for its buyer or supplier.

use std::sync::Arc;

use tracing::instrument;

use orderdesk_core::{OrderId, Role, UserId};
use orderdesk_orders::{Order, OrderError, OrderView, StatusChange};

use crate::error::ServiceError;
use crate::store::{Store, StoreError, StoreTx};

#[derive(Clone)]
pub struct OrderQueries {
    store: Arc<dyn Store>,
}

impl OrderQueries {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Order with its full history, if `buyer_id` placed it.
    #[instrument(skip(self))]
    pub async fn for_buyer(
        &self,
        order_id: OrderId,
        buyer_id: UserId,
    ) -> Result<OrderView, ServiceError> {
        self.fetch(order_id, Role::Buyer, buyer_id).await
    }

    /// Order with its full history, if it was placed with `supplier_id`.
    #[instrument(skip(self))]
    pub async fn for_supplier(
        &self,
        order_id: OrderId,
        supplier_id: UserId,
    ) -> Result<OrderView, ServiceError> {
        self.fetch(order_id, Role::Supplier, supplier_id).await
    }

    async fn fetch(
        &self,
        order_id: OrderId,
        role: Role,
        user_id: UserId,
    ) -> Result<OrderView, ServiceError> {
        // Read-only: dropped without commit.
        let mut tx = self.store.begin().await?;
        let order = tx
            .find_order(order_id)
            .await?
            .filter(|o| o.is_visible_to(role, user_id))
            .ok_or(OrderError::NotFound)?;
        let history = tx.status_history(order.id).await?;
        assemble_view(tx.as_mut(), order, history).await
    }
}

/// Attach party summaries to `order`.
pub(crate) async fn assemble_view(
    tx: &mut dyn StoreTx,
    order: Order,
    history: Vec<StatusChange>,
) -> Result<OrderView, ServiceError> {
    let buyer = tx
        .find_party(order.buyer_id)
        .await?
        .ok_or_else(|| StoreError::Integrity(format!("order {} has no buyer row", order.id)))?;
    let supplier = tx
        .find_party(order.supplier_id)
        .await?
        .ok_or_else(|| StoreError::Integrity(format!("order {} has no supplier row", order.id)))?;

    Ok(OrderView::assemble(order, &buyer, &supplier, history))
}

/// The last `n` entries of an ascending history, still ascending.
pub(crate) fn recent(mut history: Vec<StatusChange>, n: usize) -> Vec<StatusChange> {
    let skip = history.len().saturating_sub(n);
    history.drain(..skip);
    history
}
