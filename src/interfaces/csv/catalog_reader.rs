use crate::domain::id::ProductId;
use crate::domain::product::Product;
use crate::error::{FulfillmentError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct CatalogRecord {
    id: ProductId,
    name: String,
    price: Decimal,
    available: Option<bool>,
}

impl TryFrom<CatalogRecord> for Product {
    type Error = FulfillmentError;

    fn try_from(record: CatalogRecord) -> Result<Self> {
        let product = Self {
            id: record.id,
            name: record.name,
            unit_price: record.price,
            available: record.available.unwrap_or(true),
        };
        product.validate()?;
        Ok(product)
    }
}

/// Reads catalog products from CSV with columns `id, name, price, available`.
///
/// `available` may be left empty, in which case the product is orderable.
pub struct CatalogReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CatalogReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: super::reader_builder().from_reader(source),
        }
    }

    /// Lazily yields one validated product per row.
    pub fn products(self) -> impl Iterator<Item = Result<Product>> {
        self.reader
            .into_deserialize::<CatalogRecord>()
            .map(|record| record.map_err(FulfillmentError::from).and_then(Product::try_from))
    }
}
