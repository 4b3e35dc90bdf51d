use crate::domain::id::ProductId;
use crate::error::{FulfillmentError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A catalog product as the fulfillment core sees it.
///
/// The catalog owns products; the core only reads them and copies their
/// price into cart entries and order snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(rename = "price")]
    pub unit_price: Decimal,
    pub available: bool,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, unit_price: Decimal) -> Result<Self> {
        let product = Self {
            id,
            name: name.into(),
            unit_price,
            available: true,
        };
        product.validate()?;
        Ok(product)
    }

    /// Marks the product as not currently orderable.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Checks the invariants the catalog must hold for a product to be usable.
    pub fn validate(&self) -> Result<()> {
        if self.unit_price.is_sign_negative() {
            return Err(FulfillmentError::ValidationError(format!(
                "Product {} has a negative price",
                self.id
            )));
        }
        if self.name.trim().is_empty() {
            return Err(FulfillmentError::ValidationError(format!(
                "Product {} has no name",
                self.id
            )));
        }
        Ok(())
    }
}
