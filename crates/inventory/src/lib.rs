//! Inventory domain module.
//!
//! Pure stock rules (no IO): quantities are stored in the product's base unit
//! and may never go negative. Storage and transactions live in `orderdesk-infra`.

pub mod stock;

pub use stock::{InventoryError, StockShortfall, apply_delta, available_or_zero, normalize_quantity};
