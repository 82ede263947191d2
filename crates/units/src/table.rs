use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::unit::{Dimension, Unit, UnitCode};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnitError {
    #[error("invalid unit code: {0}")]
    UnknownUnit(UnitCode),

    #[error("unit {code} ({dimension}) cannot be used with base unit {base} ({base_dimension})")]
    DimensionMismatch {
        code: UnitCode,
        dimension: Dimension,
        base: UnitCode,
        base_dimension: Dimension,
    },

    #[error("invalid unit table: {0}")]
    InvalidTable(String),
}

/// Immutable registry of units keyed by code.
///
/// Built once (seed data or storage) and shared read-only; conversions never
/// touch storage.
#[derive(Debug, Clone)]
pub struct UnitTable {
    units: HashMap<UnitCode, Unit>,
}

impl UnitTable {
    /// Build a table, checking the per-dimension base unit invariant.
    pub fn new(units: impl IntoIterator<Item = Unit>) -> Result<Self, UnitError> {
        let mut map = HashMap::new();
        let mut bases: HashMap<Dimension, UnitCode> = HashMap::new();

        for unit in units {
            if !(unit.factor_to_base.is_finite() && unit.factor_to_base > 0.0) {
                return Err(UnitError::InvalidTable(format!(
                    "unit {} has non-positive factor {}",
                    unit.code, unit.factor_to_base
                )));
            }
            if unit.is_base_unit {
                if unit.factor_to_base != 1.0 {
                    return Err(UnitError::InvalidTable(format!(
                        "base unit {} must have factor 1.0",
                        unit.code
                    )));
                }
                if let Some(existing) = bases.insert(unit.dimension, unit.code.clone()) {
                    return Err(UnitError::InvalidTable(format!(
                        "dimension {} has two base units: {} and {}",
                        unit.dimension, existing, unit.code
                    )));
                }
            }
            if map.contains_key(&unit.code) {
                return Err(UnitError::InvalidTable(format!("duplicate unit code {}", unit.code)));
            }
            map.insert(unit.code.clone(), unit);
        }

        if let Some(orphan) = map.values().find(|u| !bases.contains_key(&u.dimension)) {
            return Err(UnitError::InvalidTable(format!(
                "dimension {} of unit {} has no base unit",
                orphan.dimension, orphan.code
            )));
        }

        Ok(Self { units: map })
    }

    /// The standard seed: metric mass/volume/length plus pieces and dozens.
    pub fn standard() -> Self {
        Self {
            units: standard_units()
                .into_iter()
                .map(|u| (u.code.clone(), u))
                .collect(),
        }
    }

    pub fn get(&self, code: &UnitCode) -> Result<&Unit, UnitError> {
        self.units
            .get(code)
            .ok_or_else(|| UnitError::UnknownUnit(code.clone()))
    }

    /// All units, sorted by dimension then factor.
    pub fn units(&self) -> Vec<&Unit> {
        let mut all: Vec<&Unit> = self.units.values().collect();
        all.sort_by(|a, b| {
            a.dimension
                .as_str()
                .cmp(b.dimension.as_str())
                .then(a.factor_to_base.total_cmp(&b.factor_to_base))
        });
        all
    }

    /// `quantity * factor_to_base`.
    pub fn to_base(&self, quantity: f64, code: &UnitCode) -> Result<f64, UnitError> {
        Ok(quantity * self.get(code)?.factor_to_base)
    }

    /// `quantity_base / factor_to_base`.
    pub fn from_base(&self, quantity_base: f64, code: &UnitCode) -> Result<f64, UnitError> {
        Ok(quantity_base / self.get(code)?.factor_to_base)
    }

    /// Price of one `code` unit given the price of one base unit.
    ///
    /// One requested unit is `factor_to_base` base units, so the price scales
    /// the same way as the quantity.
    pub fn price_in_unit(
        &self,
        base_price: Decimal,
        code: &UnitCode,
    ) -> Result<Decimal, UnitError> {
        let unit = self.get(code)?;
        Ok((base_price * factor_as_decimal(unit)?).normalize())
    }

    /// Resolve `code` and check it measures the same dimension as `base`.
    pub fn compatible_unit(&self, code: &UnitCode, base: &UnitCode) -> Result<&Unit, UnitError> {
        let unit = self.get(code)?;
        let base_unit = self.get(base)?;
        if !unit.is_compatible_with(base_unit) {
            return Err(UnitError::DimensionMismatch {
                code: unit.code.clone(),
                dimension: unit.dimension,
                base: base_unit.code.clone(),
                base_dimension: base_unit.dimension,
            });
        }
        Ok(unit)
    }
}

impl Default for UnitTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Exact decimal rendering of a factor (`0.001` stays `0.001`, not its binary expansion).
fn factor_as_decimal(unit: &Unit) -> Result<Decimal, UnitError> {
    Decimal::from_str(&unit.factor_to_base.to_string()).map_err(|e| {
        UnitError::InvalidTable(format!(
            "factor {} of unit {} is not representable: {e}",
            unit.factor_to_base, unit.code
        ))
    })
}

pub fn standard_units() -> Vec<Unit> {
    vec![
        Unit::new("kg", "Kilogram", Dimension::Mass, 1.0, true),
        Unit::new("g", "Gram", Dimension::Mass, 0.001, false),
        Unit::new("mg", "Milligram", Dimension::Mass, 0.000001, false),
        Unit::new("l", "Liter", Dimension::Volume, 1.0, true),
        Unit::new("ml", "Milliliter", Dimension::Volume, 0.001, false),
        Unit::new("pcs", "Pieces", Dimension::Count, 1.0, true),
        Unit::new("dozen", "Dozen", Dimension::Count, 12.0, false),
        Unit::new("m", "Meter", Dimension::Length, 1.0, true),
        Unit::new("cm", "Centimeter", Dimension::Length, 0.01, false),
    ]
}
