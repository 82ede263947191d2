use serde::{Deserialize, Serialize};

/// Measurable dimension a unit belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Mass,
    Volume,
    Count,
    Length,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Mass => "mass",
            Dimension::Volume => "volume",
            Dimension::Count => "count",
            Dimension::Length => "length",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mass" => Some(Dimension::Mass),
            "volume" => Some(Dimension::Volume),
            "count" => Some(Dimension::Count),
            "length" => Some(Dimension::Length),
            _ => None,
        }
    }
}

impl core::fmt::Display for Dimension {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit code such as `kg`, `g` or `dozen`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitCode(String);

impl UnitCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for UnitCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitCode {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A registered measurement unit.
///
/// Units are immutable once referenced by a product or an order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub code: UnitCode,
    pub name: String,
    pub dimension: Dimension,
    pub factor_to_base: f64,
    pub is_base_unit: bool,
}

impl Unit {
    pub fn new(
        code: &str,
        name: &str,
        dimension: Dimension,
        factor_to_base: f64,
        is_base_unit: bool,
    ) -> Self {
        Self {
            code: UnitCode::new(code),
            name: name.to_string(),
            dimension,
            factor_to_base,
            is_base_unit,
        }
    }

    pub fn is_compatible_with(&self, other: &Unit) -> bool {
        self.dimension == other.dimension
    }
}
