//! Orders domain module.
//!
//! Pure ordering rules: the order aggregate, its status state machine,
//! placement planning against a stock snapshot, and pricing. No IO; the
//! engines in `orderdesk-infra` run these rules inside storage transactions.

pub mod error;
pub mod order;
pub mod placement;
pub mod pricing;
pub mod status;
pub mod view;

pub use error::OrderError;
pub use order::{Order, OrderItem, StatusChange};
pub use placement::{OrderLineRequest, PlaceOrder, ResolvedLine, plan_order};
pub use status::{InventoryEffect, OrderStatus, plan_transition};
pub use view::OrderView;
