//! Parties domain module (buyers and suppliers).
//!
//! Accounts are registered and maintained elsewhere; this crate only carries
//! the snapshot the ordering rules need.

pub mod party;

pub use party::{ContactInfo, Party, PartySummary};
