use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderdesk_core::{OrderId, OrderItemId, ProductId, Role, StatusChangeId, UserId};
use orderdesk_units::UnitCode;

use crate::error::OrderError;
use crate::status::{InventoryEffect, OrderStatus, plan_transition};

/// Default reason recorded for the initial history row.
pub const PLACED_REASON: &str = "Order placed by buyer";

/// Default reason recorded when a buyer cancels without giving one.
pub const BUYER_CANCEL_REASON: &str = "Cancelled by buyer";

/// Order line, snapshotted at placement and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    /// Unit the buyer ordered in.
    pub unit_code: UnitCode,
    /// Quantity in `unit_code`.
    pub quantity: f64,
    /// Price of one `unit_code`.
    pub unit_price: Decimal,
    pub total_price: Decimal,
    /// `quantity` converted to the product's base unit.
    pub quantity_base: f64,
    pub base_unit_code: UnitCode,
    pub base_unit_price: Decimal,
}

/// One row of the append-only status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub id: StatusChangeId,
    pub order_id: OrderId,
    /// Actor who caused the change.
    pub user_id: UserId,
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl StatusChange {
    pub fn placed(order_id: OrderId, buyer_id: UserId, at: DateTime<Utc>) -> Self {
        Self {
            id: StatusChangeId::new(),
            order_id,
            user_id: buyer_id,
            from_status: None,
            to_status: OrderStatus::Pending,
            reason: PLACED_REASON.to_string(),
            created_at: at,
        }
    }
}

/// Order aggregate: header plus line items.
///
/// `total_amount` and the items are fixed at creation; only `status` (and
/// `updated_at`) change, and only through [`Order::transition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: UserId,
    pub supplier_id: UserId,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn items_total(&self) -> Decimal {
        self.items.iter().map(|i| i.total_price).sum()
    }

    /// Whether `user_id` may see or act on this order in `role`.
    pub fn is_visible_to(&self, role: Role, user_id: UserId) -> bool {
        match role {
            Role::Buyer => self.buyer_id == user_id,
            Role::Supplier => self.supplier_id == user_id,
            Role::Admin => false,
        }
    }

    /// Move to `to` on behalf of `actor`, returning the inventory side effect
    /// the caller must apply and the history row to append.
    ///
    /// On error the order is left untouched.
    pub fn transition(
        &mut self,
        role: Role,
        actor: UserId,
        to: OrderStatus,
        reason: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<(InventoryEffect, StatusChange), OrderError> {
        let from = self.status;
        let effect = plan_transition(role, from, to)?;

        self.status = to;
        self.updated_at = at;

        let change = StatusChange {
            id: StatusChangeId::new(),
            order_id: self.id,
            user_id: actor,
            from_status: Some(from),
            to_status: to,
            reason: reason.into(),
            created_at: at,
        };
        Ok((effect, change))
    }

    /// Buyer cancellation: only a `Pending` order, never with an inventory effect.
    pub fn cancel_by_buyer(
        &mut self,
        buyer: UserId,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<StatusChange, OrderError> {
        if self.status != OrderStatus::Pending {
            return Err(OrderError::InvalidState { current: self.status });
        }
        let reason = reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| BUYER_CANCEL_REASON.to_string());
        let (_, change) = self.transition(Role::Buyer, buyer, OrderStatus::Cancelled, reason, at)?;
        Ok(change)
    }
}
