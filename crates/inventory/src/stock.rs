use serde::{Deserialize, Serialize};
use thiserror::Error;

use orderdesk_core::ProductId;
use orderdesk_units::{Unit, UnitCode};

/// Decimal places kept on base-unit quantities.
const QUANTITY_SCALE: f64 = 1e9;

/// Everything a client needs to explain a stock shortfall without a follow-up lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockShortfall {
    pub product_id: ProductId,
    pub product_name: String,
    pub requested_quantity: f64,
    pub requested_unit: UnitCode,
    /// Available stock expressed in `requested_unit`.
    pub available_quantity: f64,
    pub available_unit: UnitCode,
    pub base_available_quantity: f64,
    pub base_unit: UnitCode,
    pub message: String,
}

impl StockShortfall {
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        requested_quantity: f64,
        requested_unit: &Unit,
        base_available: f64,
        base_unit: &Unit,
    ) -> Self {
        let available_in_requested = base_available / requested_unit.factor_to_base;
        let message = if requested_unit.code == base_unit.code {
            format!(
                "Insufficient stock. Available: {} {}",
                base_available, base_unit.code
            )
        } else {
            format!(
                "Insufficient stock. Available: {} {} ({} {})",
                available_in_requested, requested_unit.code, base_available, base_unit.code
            )
        };

        Self {
            product_id,
            product_name: product_name.into(),
            requested_quantity,
            requested_unit: requested_unit.code.clone(),
            available_quantity: available_in_requested,
            available_unit: requested_unit.code.clone(),
            base_available_quantity: base_available,
            base_unit: base_unit.code.clone(),
            message,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InventoryError {
    #[error("{}", .0.message)]
    InsufficientStock(StockShortfall),

    #[error("stock would go negative: available {available}, delta {delta}")]
    NegativeStock { available: f64, delta: f64 },

    #[error("quantity must be a finite number, got {0}")]
    NonFinite(f64),
}

/// Missing inventory rows count as zero stock.
pub fn available_or_zero(quantity: Option<f64>) -> f64 {
    quantity.unwrap_or(0.0)
}

/// Round a base-unit quantity to the stored precision.
///
/// Never returns `-0.0`.
pub fn normalize_quantity(quantity: f64) -> f64 {
    let rounded = (quantity * QUANTITY_SCALE).round() / QUANTITY_SCALE;
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Apply a signed delta to the current stock, enforcing non-negativity.
///
/// An absent row starts at zero.
pub fn apply_delta(current: Option<f64>, delta: f64) -> Result<f64, InventoryError> {
    if !delta.is_finite() {
        return Err(InventoryError::NonFinite(delta));
    }
    let available = available_or_zero(current);
    let next = normalize_quantity(available + delta);
    if next < 0.0 {
        return Err(InventoryError::NegativeStock { available, delta });
    }
    Ok(next)
}
