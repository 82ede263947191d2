//! Placement planning: validate a multi-item request against a stock snapshot
//! and build the order with fully resolved prices and quantities.
//!
//! Product/unit problems fail fast; stock shortfalls are collected across all
//! lines and reported together.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderdesk_catalog::Product;
use orderdesk_core::{OrderId, OrderItemId, ProductId, UserId};
use orderdesk_inventory::{StockShortfall, available_or_zero, normalize_quantity};
use orderdesk_units::{Unit, UnitCode, UnitTable};

use crate::error::OrderError;
use crate::order::{Order, OrderItem};
use crate::pricing::line_total;
use crate::status::OrderStatus;

/// One requested line: `quantity` of `product_id` measured in `unit_code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: f64,
    pub unit_code: UnitCode,
}

/// Inbound order-placement request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub supplier_id: UserId,
    #[serde(default)]
    pub currency: Option<String>,
    pub items: Vec<OrderLineRequest>,
}

impl PlaceOrder {
    /// Shape checks that need no lookups.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::validation("order must contain at least one item"));
        }
        for (idx, item) in self.items.iter().enumerate() {
            if !item.quantity.is_finite() || item.quantity <= 0.0 {
                return Err(OrderError::validation(format!(
                    "item {idx}: quantity must be a positive number"
                )));
            }
            if item.unit_code.as_str().trim().is_empty() {
                return Err(OrderError::validation(format!("item {idx}: unit code is required")));
            }
        }
        Ok(())
    }

    /// Requested currency as an upper-case ISO-4217 code, or `default`.
    pub fn currency_or(&self, default: &str) -> Result<String, OrderError> {
        let raw = self.currency.as_deref().unwrap_or(default).trim();
        if raw.len() != 3 || !raw.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(OrderError::validation(format!(
                "currency must be a three-letter code, got {raw:?}"
            )));
        }
        Ok(raw.to_ascii_uppercase())
    }
}

/// A requested line after product and unit lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLine {
    pub product: Product,
    pub unit: Unit,
    pub base_unit: Unit,
    pub quantity: f64,
    pub quantity_base: f64,
    /// Stock on hand in the base unit when the line was resolved.
    pub available_base: f64,
}

impl ResolvedLine {
    /// Resolve `request` against the looked-up `product`.
    ///
    /// Fails with `ProductUnavailable` when the product is missing, inactive,
    /// or belongs to another supplier.
    pub fn resolve(
        units: &UnitTable,
        supplier_id: UserId,
        request: &OrderLineRequest,
        product: Option<Product>,
    ) -> Result<Self, OrderError> {
        let product = product
            .filter(|p| p.is_orderable_from(supplier_id))
            .ok_or(OrderError::ProductUnavailable(request.product_id))?;

        let unit = units
            .compatible_unit(&request.unit_code, &product.base_unit)
            .map_err(|e| OrderError::from_unit(product.id, e))?
            .clone();
        let base_unit = units
            .get(&product.base_unit)
            .map_err(|e| OrderError::from_unit(product.id, e))?
            .clone();
        let quantity_base = units
            .to_base(request.quantity, &unit.code)
            .map(normalize_quantity)
            .map_err(|e| OrderError::from_unit(product.id, e))?;
        if quantity_base <= 0.0 {
            return Err(OrderError::validation(format!(
                "quantity {} {} of product {} is below the smallest stock amount",
                request.quantity, unit.code, product.id
            )));
        }

        Ok(Self {
            product,
            unit,
            base_unit,
            quantity: request.quantity,
            quantity_base,
            available_base: 0.0,
        })
    }

    pub fn with_available(mut self, available: Option<f64>) -> Self {
        self.available_base = available_or_zero(available);
        self
    }
}

/// Check every line against stock, then price the order.
///
/// Lines for the same product draw from one pool: each is checked against
/// what earlier lines of this order have not already claimed.
pub fn plan_order(
    units: &UnitTable,
    buyer_id: UserId,
    supplier_id: UserId,
    currency: String,
    lines: Vec<ResolvedLine>,
    at: DateTime<Utc>,
) -> Result<Order, OrderError> {
    let mut claimed: HashMap<ProductId, f64> = HashMap::new();
    let mut shortfalls = Vec::new();

    for line in &lines {
        let already = claimed.entry(line.product.id).or_insert(0.0);
        let remaining = (line.available_base - *already).max(0.0);
        if remaining < line.quantity_base {
            shortfalls.push(StockShortfall::new(
                line.product.id,
                line.product.name.clone(),
                line.quantity,
                &line.unit,
                remaining,
                &line.base_unit,
            ));
        } else {
            *already += line.quantity_base;
        }
    }

    if !shortfalls.is_empty() {
        return Err(OrderError::MultipleStockErrors(shortfalls));
    }

    let order_id = OrderId::new();
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let unit_price = units
            .price_in_unit(line.product.price, &line.unit.code)
            .map_err(|e| OrderError::from_unit(line.product.id, e))?;
        let total_price = line_total(unit_price, line.quantity)?;

        items.push(OrderItem {
            id: OrderItemId::new(),
            order_id,
            product_id: line.product.id,
            product_name: line.product.name,
            unit_code: line.unit.code,
            quantity: line.quantity,
            unit_price,
            total_price,
            quantity_base: line.quantity_base,
            base_unit_code: line.base_unit.code,
            base_unit_price: line.product.price,
        });
    }

    let total_amount: Decimal = items.iter().map(|i| i.total_price).sum();

    Ok(Order {
        id: order_id,
        buyer_id,
        supplier_id,
        status: OrderStatus::Pending,
        total_amount,
        currency,
        created_at: at,
        updated_at: at,
        items,
    })
}
