use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderdesk_core::{OrderId, UserId};
use orderdesk_parties::{Party, PartySummary};

use crate::order::{Order, OrderItem, StatusChange};
use crate::status::OrderStatus;

/// Order as returned to callers: header, items, both parties and history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: OrderId,
    pub buyer_id: UserId,
    pub supplier_id: UserId,
    pub total_amount: Decimal,
    pub currency: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    pub supplier: PartySummary,
    pub buyer: PartySummary,
    /// Oldest first.
    pub status_history: Vec<StatusChange>,
}

impl OrderView {
    pub fn assemble(
        order: Order,
        buyer: &Party,
        supplier: &Party,
        status_history: Vec<StatusChange>,
    ) -> Self {
        Self {
            id: order.id,
            buyer_id: order.buyer_id,
            supplier_id: order.supplier_id,
            total_amount: order.total_amount,
            currency: order.currency,
            status: order.status,
            created_at: order.created_at,
            updated_at: order.updated_at,
            items: order.items,
            supplier: supplier.summary(),
            buyer: buyer.summary(),
            status_history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderdesk_core::Role;

    #[test]
    fn serializes_camel_case_with_embedded_parties() {
        let buyer = Party::new("Bea Buyer", "bea@example.com", Role::Buyer);
        let supplier = Party::new("Sam Supplier", "sam@example.com", Role::Supplier);
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(),
            buyer_id: buyer.id,
            supplier_id: supplier.id,
            status: OrderStatus::Pending,
            total_amount: Decimal::new(1250, 2),
            currency: "USD".to_string(),
            created_at: now,
            updated_at: now,
            items: vec![],
        };
        let history = vec![StatusChange::placed(order.id, buyer.id, now)];

        let view = OrderView::assemble(order, &buyer, &supplier, history);
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["totalAmount"], "12.50");
        assert_eq!(json["supplier"]["fullName"], "Sam Supplier");
        assert_eq!(json["buyer"]["email"], "bea@example.com");
        assert_eq!(json["statusHistory"][0]["reason"], "Order placed by buyer");
        assert!(json["statusHistory"][0]["fromStatus"].is_null());
    }
}
