//! Product catalog domain module.
//!
//! Products are owned by exactly one supplier and priced per one base unit.

pub mod product;

pub use product::{CatalogError, NewProduct, Product, ProductUpdate};
