//! `orderdesk-core`: shared domain primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod role;

pub use error::DomainError;
pub use id::{OrderId, OrderItemId, ProductId, StatusChangeId, UserId};
pub use role::Role;
