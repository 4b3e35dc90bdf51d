use crate::domain::cart::Quantity;
use crate::domain::id::ProductId;
use crate::error::{FulfillmentError, Result};
use serde::Deserialize;
use std::io::Read;

/// One requested cart line: a product and how many of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

#[derive(Debug, Deserialize)]
struct CartRecord {
    product: ProductId,
    quantity: String,
}

/// Reads cart lines from CSV with columns `product, quantity`.
///
/// Quantities are read as text and go through [`Quantity::parse`], so zero,
/// negative and non-numeric cells are reported as validation errors.
pub struct CartReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CartReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: super::reader_builder().from_reader(source),
        }
    }

    pub fn lines(self) -> impl Iterator<Item = Result<CartLine>> {
        self.reader.into_deserialize::<CartRecord>().map(|record| {
            let record = record.map_err(FulfillmentError::from)?;
            Ok(CartLine {
                product_id: record.product,
                quantity: Quantity::parse(&record.quantity)?,
            })
        })
    }
}
