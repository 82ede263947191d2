use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use orderdesk_catalog::Product;
use orderdesk_core::{OrderId, ProductId, UserId};
use orderdesk_orders::{Order, OrderStatus, StatusChange};
use orderdesk_parties::Party;
use orderdesk_units::{Unit, standard_units};

use super::r#trait::{Store, StoreError, StoreTx};

#[derive(Debug, Clone, Default)]
struct StoreState {
    parties: HashMap<UserId, Party>,
    units: Vec<Unit>,
    products: HashMap<ProductId, Product>,
    inventory: HashMap<ProductId, f64>,
    orders: HashMap<OrderId, Order>,
    history: Vec<StatusChange>,
}

/// In-memory store.
///
/// Intended for tests/dev. Transactions are fully serialized: `begin` waits
/// for the previous transaction to finish, works on a copy of the state and
/// publishes it on commit.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    /// Empty store seeded with the standard units.
    pub fn new() -> Self {
        Self::with_units(standard_units())
    }

    pub fn with_units(units: Vec<Unit>) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState {
                units,
                ..StoreState::default()
            })),
        }
    }

    pub async fn insert_party(&self, party: Party) {
        self.state.lock().await.parties.insert(party.id, party);
    }

    /// Committed stock of a product.
    pub async fn inventory_of(&self, product_id: ProductId) -> Option<f64> {
        self.state.lock().await.inventory.get(&product_id).copied()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

struct InMemoryTx {
    guard: OwnedMutexGuard<StoreState>,
    working: StoreState,
}

impl InMemoryTx {
    fn require_product(&self, product_id: ProductId) -> Result<(), StoreError> {
        if self.working.products.contains_key(&product_id) {
            Ok(())
        } else {
            Err(StoreError::Integrity(format!("inventory for unknown product {product_id}")))
        }
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryTx { guard, working }))
    }

    async fn load_units(&self) -> Result<Vec<Unit>, StoreError> {
        Ok(self.state.lock().await.units.clone())
    }
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn find_party(&mut self, id: UserId) -> Result<Option<Party>, StoreError> {
        Ok(self.working.parties.get(&id).cloned())
    }

    async fn upsert_party(&mut self, party: &Party) -> Result<(), StoreError> {
        self.working.parties.insert(party.id, party.clone());
        Ok(())
    }

    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.working.products.get(&id).cloned())
    }

    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError> {
        if !self.working.parties.contains_key(&product.supplier_id) {
            return Err(StoreError::Integrity(format!(
                "product {} references unknown supplier {}",
                product.id, product.supplier_id
            )));
        }
        if self.working.products.contains_key(&product.id) {
            return Err(StoreError::Conflict(format!(
                "product {} already exists",
                product.id
            )));
        }
        self.working.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product(&mut self, product: &Product) -> Result<(), StoreError> {
        let stored = self
            .working
            .products
            .get_mut(&product.id)
            .ok_or_else(|| {
                StoreError::Integrity(format!("product {} does not exist", product.id))
            })?;
        *stored = product.clone();
        Ok(())
    }

    async fn inventory_quantity(
        &mut self,
        product_id: ProductId,
    ) -> Result<Option<f64>, StoreError> {
        Ok(self.working.inventory.get(&product_id).copied())
    }

    async fn lock_inventory(&mut self, product_id: ProductId) -> Result<f64, StoreError> {
        self.require_product(product_id)?;
        // The whole store is already held exclusively.
        Ok(*self.working.inventory.entry(product_id).or_insert(0.0))
    }

    async fn set_inventory(
        &mut self,
        product_id: ProductId,
        quantity: f64,
    ) -> Result<(), StoreError> {
        self.require_product(product_id)?;
        self.working.inventory.insert(product_id, quantity);
        Ok(())
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.working.orders.get(&id).cloned())
    }

    async fn lock_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        // The whole store is already held exclusively.
        self.find_order(id).await
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        if self.working.orders.contains_key(&order.id) {
            return Err(StoreError::Conflict(format!("order {} already exists", order.id)));
        }
        self.working.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn update_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let order = self
            .working
            .orders
            .get_mut(&id)
            .ok_or_else(|| StoreError::Integrity(format!("order {id} does not exist")))?;
        order.status = status;
        order.updated_at = updated_at;
        Ok(())
    }

    async fn append_status_change(&mut self, change: &StatusChange) -> Result<(), StoreError> {
        if !self.working.orders.contains_key(&change.order_id) {
            return Err(StoreError::Integrity(format!(
                "history row for unknown order {}",
                change.order_id
            )));
        }
        self.working.history.push(change.clone());
        Ok(())
    }

    async fn status_history(
        &mut self,
        order_id: OrderId,
    ) -> Result<Vec<StatusChange>, StoreError> {
        Ok(self
            .working
            .history
            .iter()
            .filter(|c| c.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
