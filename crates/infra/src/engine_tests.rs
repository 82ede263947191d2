//! Engine tests over the in-memory store.
//!
//! Tests: Placement → Lifecycle → Ledger → Queries
//!
//! Verifies:
//! - Stock is checked at placement and only deducted on approval
//! - Cancelling an approved order restores stock exactly
//! - Rejected operations leave status, stock and history untouched
//! - Concurrent approvals cannot both consume the same stock

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use orderdesk_catalog::{NewProduct, Product, ProductUpdate};
use orderdesk_core::{OrderId, ProductId, Role, UserId};
use orderdesk_orders::{OrderError, OrderLineRequest, OrderStatus, OrderView, PlaceOrder};
use orderdesk_parties::Party;
use orderdesk_units::{UnitCode, UnitTable};

use crate::catalog::CatalogService;
use crate::error::ServiceError;
use crate::lifecycle::OrderLifecycleEngine;
use crate::placement::OrderPlacementEngine;
use crate::queries::{OrderQueries, recent};
use crate::store::{InMemoryStore, Store};

struct Harness {
    store: Arc<InMemoryStore>,
    placement: OrderPlacementEngine,
    lifecycle: OrderLifecycleEngine,
    queries: OrderQueries,
    catalog: CatalogService,
    buyer: Party,
    supplier: Party,
}

async fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let units = Arc::new(UnitTable::new(store.load_units().await.unwrap()).unwrap());

    let buyer = Party::new("Bea Buyer", "bea@example.com", Role::Buyer);
    let supplier = Party::new("Sam Supplier", "sam@example.com", Role::Supplier);
    store.insert_party(buyer.clone()).await;
    store.insert_party(supplier.clone()).await;

    let shared: Arc<dyn Store> = store.clone();
    Harness {
        placement: OrderPlacementEngine::new(shared.clone(), units.clone(), "USD"),
        lifecycle: OrderLifecycleEngine::new(shared.clone(), units.clone()),
        queries: OrderQueries::new(shared.clone()),
        catalog: CatalogService::new(shared, units),
        store,
        buyer,
        supplier,
    }
}

fn line(product: &Product, quantity: f64, unit: &str) -> OrderLineRequest {
    OrderLineRequest {
        product_id: product.id,
        quantity,
        unit_code: UnitCode::new(unit),
    }
}

impl Harness {
    async fn product(&self, name: &str, base_unit: &str, price: Decimal, stock: f64) -> Product {
        self.catalog
            .create_product(
                self.supplier.id,
                NewProduct {
                    name: name.to_string(),
                    description: None,
                    price,
                    base_unit: UnitCode::new(base_unit),
                    category: None,
                    image_url: None,
                    initial_stock: Some(stock),
                },
            )
            .await
            .unwrap()
    }

    async fn place(&self, items: Vec<OrderLineRequest>) -> Result<OrderView, ServiceError> {
        self.placement
            .place_order(
                self.buyer.id,
                PlaceOrder {
                    supplier_id: self.supplier.id,
                    currency: None,
                    items,
                },
            )
            .await
    }

    async fn set_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<OrderView, ServiceError> {
        self.lifecycle
            .update_order_status(order_id, self.supplier.id, status, None)
            .await
    }

    async fn stock(&self, product: &Product) -> Option<f64> {
        self.store.inventory_of(product.id).await
    }

    async fn detail(&self, order_id: OrderId) -> OrderView {
        self.queries.for_buyer(order_id, self.buyer.id).await.unwrap()
    }
}

fn flour_price() -> Decimal {
    Decimal::new(20, 0)
}

#[tokio::test]
async fn grams_order_against_kilogram_stock_deducts_only_on_approval() {
    let h = harness().await;
    let flour = h.product("Flour", "kg", flour_price(), 10.0).await;

    let placed = h.place(vec![line(&flour, 5000.0, "g")]).await.unwrap();
    assert_eq!(placed.status, OrderStatus::Pending);
    assert_eq!(placed.items[0].quantity_base, 5.0);
    assert_eq!(placed.total_amount, Decimal::new(100, 0));
    assert_eq!(placed.currency, "USD");
    assert_eq!(placed.status_history.len(), 1);
    assert_eq!(placed.status_history[0].reason, "Order placed by buyer");
    assert_eq!(h.stock(&flour).await, Some(10.0));

    let approved = h.set_status(placed.id, OrderStatus::Approved).await.unwrap();
    assert_eq!(approved.status, OrderStatus::Approved);
    assert_eq!(h.stock(&flour).await, Some(5.0));

    let cancelled = h.set_status(placed.id, OrderStatus::Cancelled).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(h.stock(&flour).await, Some(10.0));

    let detail = h.detail(placed.id).await;
    let trail: Vec<_> = detail
        .status_history
        .iter()
        .map(|c| (c.from_status, c.to_status))
        .collect();
    assert_eq!(
        trail,
        vec![
            (None, OrderStatus::Pending),
            (Some(OrderStatus::Pending), OrderStatus::Approved),
            (Some(OrderStatus::Approved), OrderStatus::Cancelled),
        ]
    );
    assert_eq!(detail.status_history[1].user_id, h.supplier.id);
}

#[tokio::test]
async fn oversized_order_reports_shortfall_in_both_units() {
    let h = harness().await;
    let flour = h.product("Flour", "kg", flour_price(), 10.0).await;

    let err = h.place(vec![line(&flour, 12000.0, "g")]).await.unwrap_err();
    match err {
        ServiceError::Order(OrderError::MultipleStockErrors(list)) => {
            assert_eq!(list.len(), 1);
            let s = &list[0];
            assert_eq!(s.product_id, flour.id);
            assert_eq!(s.product_name, "Flour");
            assert_eq!(s.requested_quantity, 12000.0);
            assert_eq!(s.requested_unit.as_str(), "g");
            assert_eq!(s.available_quantity, 10000.0);
            assert_eq!(s.base_available_quantity, 10.0);
            assert_eq!(s.base_unit.as_str(), "kg");
            assert_eq!(s.message, "Insufficient stock. Available: 10000 g (10 kg)");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(h.stock(&flour).await, Some(10.0));
}

#[tokio::test]
async fn buyer_cannot_cancel_approved_order() {
    let h = harness().await;
    let flour = h.product("Flour", "kg", flour_price(), 10.0).await;
    let order = h.place(vec![line(&flour, 5.0, "kg")]).await.unwrap();
    h.set_status(order.id, OrderStatus::Approved).await.unwrap();

    let err = h
        .lifecycle
        .cancel_order(order.id, h.buyer.id, Some("changed my mind".into()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Order(OrderError::InvalidState { current: OrderStatus::Approved })
    ));
    assert_eq!(err.to_string(), "cannot cancel order with status: APPROVED");
    assert_eq!(h.stock(&flour).await, Some(5.0));
    assert_eq!(h.detail(order.id).await.status, OrderStatus::Approved);
}

#[tokio::test]
async fn stock_errors_are_aggregated_across_items() {
    let h = harness().await;
    let flour = h.product("Flour", "kg", flour_price(), 1.0).await;
    let milk = h.product("Milk", "l", Decimal::new(3, 0), 10.0).await;
    let eggs = h.product("Eggs", "pcs", Decimal::new(1, 1), 6.0).await;

    let err = h
        .place(vec![
            line(&flour, 2.0, "kg"),
            line(&milk, 500.0, "ml"),
            line(&eggs, 1.0, "dozen"),
        ])
        .await
        .unwrap_err();

    match err {
        ServiceError::Order(OrderError::MultipleStockErrors(list)) => {
            let ids: Vec<ProductId> = list.iter().map(|s| s.product_id).collect();
            assert_eq!(ids, vec![flour.id, eggs.id]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(h.stock(&milk).await, Some(10.0));
}

#[tokio::test]
async fn illegal_transitions_change_nothing() {
    let h = harness().await;
    let flour = h.product("Flour", "kg", flour_price(), 10.0).await;
    let order = h.place(vec![line(&flour, 2.0, "kg")]).await.unwrap();

    let err = h.set_status(order.id, OrderStatus::Fulfilled).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Order(OrderError::InvalidTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Fulfilled,
            ..
        })
    ));
    let detail = h.detail(order.id).await;
    assert_eq!(detail.status, OrderStatus::Pending);
    assert_eq!(detail.status_history.len(), 1);
    assert_eq!(h.stock(&flour).await, Some(10.0));

    h.set_status(order.id, OrderStatus::Approved).await.unwrap();
    h.set_status(order.id, OrderStatus::Fulfilled).await.unwrap();
    assert_eq!(h.stock(&flour).await, Some(8.0));

    for target in [OrderStatus::Pending, OrderStatus::Approved, OrderStatus::Cancelled] {
        let err = h.set_status(order.id, target).await.unwrap_err();
        assert!(matches!(err, ServiceError::Order(OrderError::InvalidTransition { .. })));
    }
    let detail = h.detail(order.id).await;
    assert_eq!(detail.status, OrderStatus::Fulfilled);
    assert_eq!(detail.status_history.len(), 3);
    assert_eq!(h.stock(&flour).await, Some(8.0));
}

#[tokio::test]
async fn supplier_cancel_of_pending_order_has_no_stock_effect() {
    let h = harness().await;
    let flour = h.product("Flour", "kg", flour_price(), 10.0).await;
    let order = h.place(vec![line(&flour, 2.0, "kg")]).await.unwrap();

    let view = h
        .lifecycle
        .update_order_status(
            order.id,
            h.supplier.id,
            OrderStatus::Cancelled,
            Some("out of season".into()),
        )
        .await
        .unwrap();
    assert_eq!(view.status, OrderStatus::Cancelled);
    assert_eq!(view.status_history.last().unwrap().reason, "out of season");
    assert_eq!(h.stock(&flour).await, Some(10.0));
}

#[tokio::test]
async fn buyer_cancel_of_pending_order_uses_default_reason() {
    let h = harness().await;
    let flour = h.product("Flour", "kg", flour_price(), 10.0).await;
    let order = h.place(vec![line(&flour, 2.0, "kg")]).await.unwrap();

    let view = h.lifecycle.cancel_order(order.id, h.buyer.id, None).await.unwrap();
    assert_eq!(view.status, OrderStatus::Cancelled);
    let last = view.status_history.last().unwrap();
    assert_eq!(last.reason, "Cancelled by buyer");
    assert_eq!(last.user_id, h.buyer.id);
    assert_eq!(h.stock(&flour).await, Some(10.0));
}

#[tokio::test]
async fn other_parties_orders_are_not_found() {
    let h = harness().await;
    let flour = h.product("Flour", "kg", flour_price(), 10.0).await;
    let order = h.place(vec![line(&flour, 2.0, "kg")]).await.unwrap();

    let stranger = UserId::new();
    let err = h
        .lifecycle
        .update_order_status(order.id, stranger, OrderStatus::Approved, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Order(OrderError::NotFound)));

    let err = h.lifecycle.cancel_order(order.id, stranger, None).await.unwrap_err();
    assert!(matches!(err, ServiceError::Order(OrderError::NotFound)));

    // The supplier is not the buyer, even for its own order.
    let err = h.queries.for_buyer(order.id, h.supplier.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Order(OrderError::NotFound)));

    let err = h.set_status(OrderId::new(), OrderStatus::Approved).await.unwrap_err();
    assert!(matches!(err, ServiceError::Order(OrderError::NotFound)));

    assert_eq!(h.stock(&flour).await, Some(10.0));
    assert!(h.queries.for_supplier(order.id, h.supplier.id).await.is_ok());
}

#[tokio::test]
async fn supplier_must_exist_be_active_and_be_a_supplier() {
    let h = harness().await;
    let flour = h.product("Flour", "kg", flour_price(), 10.0).await;

    let mut inactive = Party::new("Old Supplier", "old@example.com", Role::Supplier);
    inactive.is_active = false;
    h.store.insert_party(inactive.clone()).await;

    for supplier_id in [UserId::new(), h.buyer.id, inactive.id] {
        let err = h
            .placement
            .place_order(
                h.buyer.id,
                PlaceOrder {
                    supplier_id,
                    currency: None,
                    items: vec![line(&flour, 1.0, "kg")],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Order(OrderError::InvalidSupplier)));
    }
}

#[tokio::test]
async fn inactive_or_foreign_products_fail_the_whole_order() {
    let h = harness().await;
    let flour = h.product("Flour", "kg", flour_price(), 10.0).await;

    let retired = h.product("Rye", "kg", flour_price(), 10.0).await;
    let deactivate = ProductUpdate {
        is_active: Some(false),
        ..ProductUpdate::default()
    };
    let updated = h
        .catalog
        .update_product(h.supplier.id, retired.id, deactivate)
        .await
        .unwrap();
    assert!(!updated.is_active);

    let err = h
        .place(vec![line(&flour, 1.0, "kg"), line(&retired, 1.0, "kg")])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Order(OrderError::ProductUnavailable(id)) if id == retired.id
    ));
    assert_eq!(h.stock(&flour).await, Some(10.0));

    let missing = OrderLineRequest {
        product_id: ProductId::new(),
        quantity: 1.0,
        unit_code: UnitCode::new("kg"),
    };
    let err = h.place(vec![missing]).await.unwrap_err();
    assert!(matches!(err, ServiceError::Order(OrderError::ProductUnavailable(_))));
}

#[tokio::test]
async fn unknown_and_cross_dimension_units_are_rejected() {
    let h = harness().await;
    let flour = h.product("Flour", "kg", flour_price(), 10.0).await;

    let err = h.place(vec![line(&flour, 1.0, "oz")]).await.unwrap_err();
    assert!(matches!(err, ServiceError::Order(OrderError::UnknownUnit(_))));

    let err = h.place(vec![line(&flour, 100.0, "ml")]).await.unwrap_err();
    assert!(matches!(err, ServiceError::Order(OrderError::UnitMismatch { .. })));
}

#[tokio::test]
async fn approval_fails_atomically_when_stock_was_consumed() {
    let h = harness().await;
    let flour = h.product("Flour", "kg", flour_price(), 10.0).await;
    let sugar = h.product("Sugar", "kg", Decimal::new(2, 0), 10.0).await;

    let first = h.place(vec![line(&flour, 6.0, "kg")]).await.unwrap();
    let second = h
        .place(vec![line(&sugar, 1.0, "kg"), line(&flour, 6.0, "kg")])
        .await
        .unwrap();
    assert_eq!(h.stock(&flour).await, Some(10.0));

    h.set_status(first.id, OrderStatus::Approved).await.unwrap();
    assert_eq!(h.stock(&flour).await, Some(4.0));

    let err = h.set_status(second.id, OrderStatus::Approved).await.unwrap_err();
    match err {
        ServiceError::Order(OrderError::InsufficientStock(s)) => {
            assert_eq!(s.product_id, flour.id);
            assert_eq!(s.base_available_quantity, 4.0);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Nothing from the failed approval survives the rollback.
    assert_eq!(h.stock(&sugar).await, Some(10.0));
    assert_eq!(h.stock(&flour).await, Some(4.0));
    let detail = h.detail(second.id).await;
    assert_eq!(detail.status, OrderStatus::Pending);
    assert_eq!(detail.status_history.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_approvals_cannot_oversell() {
    let h = Arc::new(harness().await);
    let flour = h.product("Flour", "kg", flour_price(), 10.0).await;

    let a = h.place(vec![line(&flour, 6.0, "kg")]).await.unwrap();
    let b = h.place(vec![line(&flour, 6.0, "kg")]).await.unwrap();

    let (ha, hb) = (h.clone(), h.clone());
    let ra = tokio::spawn(async move { ha.set_status(a.id, OrderStatus::Approved).await });
    let rb = tokio::spawn(async move { hb.set_status(b.id, OrderStatus::Approved).await });
    let results = [ra.await.unwrap(), rb.await.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(ServiceError::Order(OrderError::InsufficientStock(_)))
    )));
    assert_eq!(h.stock(&flour).await, Some(4.0));
}

#[tokio::test]
async fn deactivation_keeps_pending_orders_and_stock() {
    let h = harness().await;
    let flour = h.product("Flour", "kg", flour_price(), 10.0).await;
    let order = h.place(vec![line(&flour, 4.0, "kg")]).await.unwrap();

    let update = ProductUpdate {
        is_active: Some(false),
        ..ProductUpdate::default()
    };
    h.catalog
        .update_product(h.supplier.id, flour.id, update.clone())
        .await
        .unwrap();

    let view = h.set_status(order.id, OrderStatus::Approved).await.unwrap();
    assert_eq!(view.status, OrderStatus::Approved);
    assert_eq!(h.stock(&flour).await, Some(6.0));

    let reactivate = ProductUpdate {
        is_active: Some(true),
        ..ProductUpdate::default()
    };
    h.catalog
        .update_product(h.supplier.id, flour.id, reactivate)
        .await
        .unwrap();
    assert!(h.place(vec![line(&flour, 1.0, "kg")]).await.is_ok());

    let err = h
        .catalog
        .update_product(UserId::new(), flour.id, update)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Order(OrderError::NotFound)));
}

#[tokio::test]
async fn quantities_below_stored_precision_are_rejected() {
    let h = harness().await;
    let flour = h.product("Flour", "kg", flour_price(), 10.0).await;

    let err = h.place(vec![line(&flour, 0.0001, "mg")]).await.unwrap_err();
    assert!(matches!(err, ServiceError::Order(OrderError::Validation(_))));
    assert_eq!(h.stock(&flour).await, Some(10.0));
}

#[tokio::test]
async fn repeated_lines_for_one_product_share_stock() {
    let h = harness().await;
    let flour = h.product("Flour", "kg", flour_price(), 10.0).await;

    let err = h
        .place(vec![line(&flour, 6.0, "kg"), line(&flour, 5000.0, "g")])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Order(OrderError::MultipleStockErrors(ref l)) if l.len() == 1
    ));

    let ok = h
        .place(vec![line(&flour, 6.0, "kg"), line(&flour, 4000.0, "g")])
        .await
        .unwrap();
    h.set_status(ok.id, OrderStatus::Approved).await.unwrap();
    assert_eq!(h.stock(&flour).await, Some(0.0));
}

#[tokio::test]
async fn order_totals_use_converted_unit_prices() {
    let h = harness().await;
    let flour = h.product("Flour", "kg", flour_price(), 10.0).await;
    let eggs = h.product("Eggs", "pcs", Decimal::new(25, 2), 48.0).await;

    let order = h
        .placement
        .place_order(
            h.buyer.id,
            PlaceOrder {
                supplier_id: h.supplier.id,
                currency: Some("eur".to_string()),
                items: vec![line(&flour, 250.0, "g"), line(&eggs, 2.0, "dozen")],
            },
        )
        .await
        .unwrap();

    assert_eq!(order.currency, "EUR");
    assert_eq!(order.items[0].unit_price, Decimal::new(2, 2));
    assert_eq!(order.items[0].total_price, Decimal::new(5, 0));
    assert_eq!(order.items[1].unit_price, Decimal::new(3, 0));
    assert_eq!(order.items[1].total_price, Decimal::new(6, 0));
    assert_eq!(order.items[1].quantity_base, 24.0);
    assert_eq!(order.total_amount, Decimal::new(11, 0));
    assert_eq!(order.supplier.full_name, "Sam Supplier");
    assert_eq!(order.buyer.email, "bea@example.com");
}

#[tokio::test]
async fn restock_and_correction_go_through_the_ledger() {
    let h = harness().await;
    let flour = h.product("Flour", "kg", flour_price(), 10.0).await;

    let info = h
        .catalog
        .adjust_stock(h.supplier.id, flour.id, 500.0, UnitCode::new("g"))
        .await
        .unwrap();
    assert_eq!(info.base_quantity, 10.5);
    assert_eq!(info.unit.as_str(), "g");
    assert!((info.quantity - 10500.0).abs() < 1e-6);

    let err = h
        .catalog
        .adjust_stock(h.supplier.id, flour.id, -11.0, UnitCode::new("kg"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Order(OrderError::InsufficientStock(_))));
    assert_eq!(h.stock(&flour).await, Some(10.5));

    let err = h
        .catalog
        .adjust_stock(UserId::new(), flour.id, 1.0, UnitCode::new("kg"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Order(OrderError::NotFound)));
}

#[tokio::test]
async fn stock_info_converts_to_requested_unit() {
    let h = harness().await;
    let flour = h.product("Flour", "kg", flour_price(), 2.5).await;

    let info = h.catalog.stock_info(flour.id, Some(UnitCode::new("g"))).await.unwrap();
    assert_eq!(info.base_quantity, 2.5);
    assert!((info.quantity - 2500.0).abs() < 1e-9);
    assert_eq!(info.unit.as_str(), "g");

    let info = h.catalog.stock_info(flour.id, None).await.unwrap();
    assert_eq!(info.unit.as_str(), "kg");

    let err = h.catalog.stock_info(flour.id, Some(UnitCode::new("l"))).await.unwrap_err();
    assert!(matches!(err, ServiceError::Order(OrderError::UnitMismatch { .. })));
}

#[tokio::test]
async fn products_without_stock_row_count_as_empty() {
    let h = harness().await;
    let product = h
        .catalog
        .create_product(
            h.supplier.id,
            NewProduct {
                name: "Rope".to_string(),
                description: None,
                price: Decimal::ONE,
                base_unit: UnitCode::new("m"),
                category: None,
                image_url: None,
                initial_stock: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(h.stock(&product).await, None);

    let info = h.catalog.stock_info(product.id, Some(UnitCode::new("cm"))).await.unwrap();
    assert_eq!(info.base_quantity, 0.0);

    let err = h.place(vec![line(&product, 1.0, "cm")]).await.unwrap_err();
    match err {
        ServiceError::Order(OrderError::MultipleStockErrors(list)) => {
            assert_eq!(list[0].base_available_quantity, 0.0);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn product_creation_requires_active_supplier_and_base_unit() {
    let h = harness().await;
    let input = NewProduct {
        name: "Flour".to_string(),
        description: None,
        price: flour_price(),
        base_unit: UnitCode::new("g"),
        category: None,
        image_url: None,
        initial_stock: None,
    };

    let err = h.catalog.create_product(h.supplier.id, input.clone()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Catalog(_)));

    let mut kg = input;
    kg.base_unit = UnitCode::new("kg");
    let err = h.catalog.create_product(h.buyer.id, kg).await.unwrap_err();
    assert!(matches!(err, ServiceError::Order(OrderError::InvalidSupplier)));
}

#[test]
fn recent_keeps_newest_entries_in_order() {
    let order_id = OrderId::new();
    let history: Vec<_> = (0..7)
        .map(|_| orderdesk_orders::StatusChange::placed(order_id, UserId::new(), Utc::now()))
        .collect();
    let tail = recent(history.clone(), 5);
    assert_eq!(tail, history[2..].to_vec());
    assert_eq!(recent(history[..2].to_vec(), 5).len(), 2);
}
