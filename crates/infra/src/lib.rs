//! Infrastructure layer: persistence and the transactional engines.
//!
//! Engines compose the pure rules from the domain crates with a [`store::Store`]
//! handle injected at construction. Each operation runs in one transaction:
//! it either commits completely or leaves no trace.

pub mod catalog;
pub mod directory;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod placement;
pub mod queries;
pub mod store;

#[cfg(test)]
mod engine_tests;

pub use catalog::{CatalogService, StockInfo};
pub use directory::PartyDirectory;
pub use error::ServiceError;
pub use ledger::{InventoryLedger, StockMovement};
pub use lifecycle::OrderLifecycleEngine;
pub use placement::OrderPlacementEngine;
pub use queries::OrderQueries;
pub use store::{InMemoryStore, PostgresStore, Store, StoreError, StoreTx};
