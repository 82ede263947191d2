use thiserror::Error;

use orderdesk_core::ProductId;
use orderdesk_inventory::StockShortfall;
use orderdesk_units::{UnitCode, UnitError};

use crate::status::OrderStatus;

/// Business rejections raised by order placement and the order lifecycle.
///
/// None of these are process-level failures: each is a normal outcome the
/// caller can match on and render.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OrderError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid supplier or supplier not active")]
    InvalidSupplier,

    #[error("product {0} not found or not available from this supplier")]
    ProductUnavailable(ProductId),

    #[error("invalid unit code: {0}")]
    UnknownUnit(UnitCode),

    #[error("unit {unit} cannot be used for product {product_id} stocked in {base_unit}")]
    UnitMismatch {
        product_id: ProductId,
        unit: UnitCode,
        base_unit: UnitCode,
    },

    #[error("{}", .0.message)]
    InsufficientStock(StockShortfall),

    #[error("insufficient stock for {} product(s)", .0.len())]
    MultipleStockErrors(Vec<StockShortfall>),

    #[error("not found")]
    NotFound,

    #[error(
        "cannot change order status from {from} to {to}; compatible statuses: {}",
        describe(.allowed)
    )]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
        allowed: Vec<OrderStatus>,
    },

    #[error("cannot cancel order with status: {current}")]
    InvalidState { current: OrderStatus },
}

impl OrderError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Stable machine-readable code for this rejection.
    pub fn code(&self) -> &'static str {
        match self {
            OrderError::Validation(_) => "VALIDATION_ERROR",
            OrderError::InvalidSupplier => "INVALID_SUPPLIER",
            OrderError::ProductUnavailable(_) => "PRODUCT_UNAVAILABLE",
            OrderError::UnknownUnit(_) => "UNKNOWN_UNIT",
            OrderError::UnitMismatch { .. } => "UNIT_MISMATCH",
            OrderError::InsufficientStock(_) => "INSUFFICIENT_STOCK",
            OrderError::MultipleStockErrors(_) => "MULTIPLE_STOCK_ERRORS",
            OrderError::NotFound => "NOT_FOUND",
            OrderError::InvalidTransition { .. } => "INVALID_TRANSITION",
            OrderError::InvalidState { .. } => "INVALID_STATE",
        }
    }

    /// Map a unit-table failure raised while handling `product_id`.
    pub fn from_unit(product_id: ProductId, err: UnitError) -> Self {
        match err {
            UnitError::UnknownUnit(code) => OrderError::UnknownUnit(code),
            UnitError::DimensionMismatch { code, base, .. } => OrderError::UnitMismatch {
                product_id,
                unit: code,
                base_unit: base,
            },
            UnitError::InvalidTable(msg) => OrderError::Validation(msg),
        }
    }
}

fn describe(statuses: &[OrderStatus]) -> String {
    if statuses.is_empty() {
        return "none".to_string();
    }
    statuses
        .iter()
        .map(OrderStatus::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
