use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use orderdesk_core::{ProductId, UserId};
use orderdesk_units::{UnitCode, UnitError, UnitTable};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CatalogError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Unit(#[from] UnitError),
}

/// A supplier-owned product.
///
/// `price` is always per one `base_unit`, whatever unit buyers order in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub supplier_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub base_unit: UnitCode,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether a buyer may order this product from `supplier_id`.
    pub fn is_orderable_from(&self, supplier_id: UserId) -> bool {
        self.is_active && self.supplier_id == supplier_id
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    pub base_unit: UnitCode,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Opening stock in `base_unit`; creates the inventory row when present.
    #[serde(default)]
    pub initial_stock: Option<f64>,
}

impl NewProduct {
    pub fn validate(&self, units: &UnitTable) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::Validation("name cannot be empty".to_string()));
        }
        if self.price <= Decimal::ZERO {
            return Err(CatalogError::Validation("price must be positive".to_string()));
        }

        let unit = units.get(&self.base_unit)?;
        if !unit.is_base_unit {
            return Err(CatalogError::Validation(format!(
                "{} is not a base unit; products are priced and stocked in base units",
                unit.code
            )));
        }

        if let Some(stock) = self.initial_stock {
            if !stock.is_finite() || stock < 0.0 {
                return Err(CatalogError::Validation(
                    "initial_stock must be a non-negative number".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn into_product(self, supplier_id: UserId, now: DateTime<Utc>) -> Product {
        Product {
            id: ProductId::new(),
            supplier_id,
            name: self.name.trim().to_string(),
            description: self.description,
            price: self.price,
            base_unit: self.base_unit,
            category: self.category,
            image_url: self.image_url,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial change to an existing product. Absent fields keep their value.
///
/// The base unit is fixed once stock exists in it, so it cannot be changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Validate and apply onto `product`, stamping `updated_at`.
    pub fn apply(self, product: &mut Product, now: DateTime<Utc>) -> Result<(), CatalogError> {
        if self.is_empty() {
            return Err(CatalogError::Validation("no product fields to update".to_string()));
        }
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(CatalogError::Validation("name cannot be empty".to_string()));
            }
        }
        if let Some(price) = self.price {
            if price <= Decimal::ZERO {
                return Err(CatalogError::Validation("price must be positive".to_string()));
            }
        }

        if let Some(name) = self.name {
            product.name = name.trim().to_string();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if self.description.is_some() {
            product.description = self.description;
        }
        if self.category.is_some() {
            product.category = self.category;
        }
        if self.image_url.is_some() {
            product.image_url = self.image_url;
        }
        if let Some(active) = self.is_active {
            product.is_active = active;
        }
        product.updated_at = now;
        Ok(())
    }
}
