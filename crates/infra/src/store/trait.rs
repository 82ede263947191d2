use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use orderdesk_catalog::Product;
use orderdesk_core::{OrderId, ProductId, UserId};
use orderdesk_orders::{Order, OrderStatus, StatusChange};
use orderdesk_parties::Party;
use orderdesk_units::Unit;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    /// Write collided with a concurrent writer or a uniqueness constraint.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("failed to decode row: {0}")]
    Decode(String),

    /// Stored data references something that does not exist.
    #[error("integrity violation: {0}")]
    Integrity(String),
}

/// Shared persistence handle.
///
/// Constructed once by the composition root and injected into every engine.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a transaction. Every engine operation runs inside exactly one.
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError>;

    /// The registered unit table rows.
    async fn load_units(&self) -> Result<Vec<Unit>, StoreError>;
}

/// One ACID transaction.
///
/// Dropping a transaction without calling [`StoreTx::commit`] rolls back every
/// write made through it.
#[async_trait]
pub trait StoreTx: Send {
    async fn find_party(&mut self, id: UserId) -> Result<Option<Party>, StoreError>;

    /// Create or replace an account snapshot.
    async fn upsert_party(&mut self, party: &Party) -> Result<(), StoreError>;

    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError>;

    /// Overwrite the mutable fields of an existing product.
    async fn update_product(&mut self, product: &Product) -> Result<(), StoreError>;

    /// Current stock in the product's base unit; `None` when no row exists.
    async fn inventory_quantity(
        &mut self,
        product_id: ProductId,
    ) -> Result<Option<f64>, StoreError>;

    /// Lock the product's stock row until the transaction ends and return its
    /// quantity, creating the row at zero if absent.
    async fn lock_inventory(&mut self, product_id: ProductId) -> Result<f64, StoreError>;

    /// Store `quantity` as given. Only valid on a row taken with
    /// [`StoreTx::lock_inventory`]; callers go through the inventory ledger.
    async fn set_inventory(
        &mut self,
        product_id: ProductId,
        quantity: f64,
    ) -> Result<(), StoreError>;

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Like [`StoreTx::find_order`], holding a row lock on the header until
    /// the transaction ends.
    async fn lock_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Insert header and items.
    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError>;

    async fn update_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn append_status_change(&mut self, change: &StatusChange) -> Result<(), StoreError>;

    /// Full history of an order, oldest first.
    async fn status_history(
        &mut self,
        order_id: OrderId,
    ) -> Result<Vec<StatusChange>, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> Store for Arc<S>
where
    S: Store + ?Sized,
{
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        (**self).begin().await
    }

    async fn load_units(&self) -> Result<Vec<Unit>, StoreError> {
        (**self).load_units().await
    }
}
