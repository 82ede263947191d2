//! Unit conversion domain module.
//!
//! Every measurable dimension has one base unit (factor 1.0). Other units of
//! the same dimension satisfy `quantity_in_unit * factor_to_base = quantity_in_base`.

pub mod table;
pub mod unit;

pub use table::{standard_units, UnitError, UnitTable};
pub use unit::{Dimension, Unit, UnitCode};
