use core::str::FromStr;
use serde::{Deserialize, Serialize};

use orderdesk_core::Role;

use crate::error::OrderError;

/// Order status lifecycle.
///
/// `Pending` is set at placement; `Fulfilled` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Approved,
    Fulfilled,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Approved => "APPROVED",
            OrderStatus::Fulfilled => "FULFILLED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Statuses `role` may move an order to from `self`.
    pub fn allowed_targets(&self, role: Role) -> Vec<OrderStatus> {
        [OrderStatus::Approved, OrderStatus::Fulfilled, OrderStatus::Cancelled]
            .into_iter()
            .filter(|to| inventory_effect(role, *self, *to).is_some())
            .collect()
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(OrderStatus::Pending),
            "APPROVED" => Ok(OrderStatus::Approved),
            "FULFILLED" => Ok(OrderStatus::Fulfilled),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(OrderError::validation(format!("unknown order status: {other}"))),
        }
    }
}

/// Inventory side effect attached to a legal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryEffect {
    None,
    /// Decrement each item's base quantity (stock is committed).
    Deduct,
    /// Increment each item's base quantity (compensates an earlier deduction).
    Restore,
}

impl InventoryEffect {
    /// Sign applied to an item's base quantity.
    pub fn sign(&self) -> f64 {
        match self {
            InventoryEffect::None => 0.0,
            InventoryEffect::Deduct => -1.0,
            InventoryEffect::Restore => 1.0,
        }
    }
}

fn inventory_effect(role: Role, from: OrderStatus, to: OrderStatus) -> Option<InventoryEffect> {
    use OrderStatus::*;

    match (role, from, to) {
        (Role::Buyer, Pending, Cancelled) => Some(InventoryEffect::None),
        (Role::Supplier, Pending, Approved) => Some(InventoryEffect::Deduct),
        (Role::Supplier, Approved, Fulfilled) => Some(InventoryEffect::None),
        (Role::Supplier, Approved, Cancelled) => Some(InventoryEffect::Restore),
        (Role::Supplier, Pending, Cancelled) => Some(InventoryEffect::None),
        _ => None,
    }
}

/// Look up the transition table; anything not listed is `InvalidTransition`.
pub fn plan_transition(
    role: Role,
    from: OrderStatus,
    to: OrderStatus,
) -> Result<InventoryEffect, OrderError> {
    inventory_effect(role, from, to).ok_or_else(|| OrderError::InvalidTransition {
        from,
        to,
        allowed: from.allowed_targets(role),
    })
}
