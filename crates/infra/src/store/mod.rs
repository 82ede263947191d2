//! Persistence boundary.
//!
//! Engines talk to storage only through [`Store`] and [`StoreTx`]; both
//! implementations honour the same transaction semantics.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use r#trait::{Store, StoreError, StoreTx};
