use crate::domain::id::ProductId;
use crate::domain::product::Product;
use crate::error::{FulfillmentError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroU32;

/// A strictly positive item count.
///
/// Zero, negative and non-numeric input is rejected at construction, so a
/// stored entry can never hold a quantity below one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(NonZeroU32);

impl Quantity {
    pub const ONE: Self = Self(NonZeroU32::MIN);

    pub fn new(value: u32) -> Result<Self> {
        NonZeroU32::new(value).map(Self).ok_or_else(|| {
            FulfillmentError::ValidationError("Quantity must be at least 1".to_string())
        })
    }

    /// Parses user input such as a form field or CSV cell.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let value: i64 = trimmed.parse().map_err(|_| {
            FulfillmentError::ValidationError(format!("Quantity '{trimmed}' is not a number"))
        })?;
        if value < 0 {
            return Err(FulfillmentError::ValidationError(format!(
                "Quantity {value} is negative"
            )));
        }
        let value = u32::try_from(value).map_err(|_| {
            FulfillmentError::ValidationError(format!("Quantity {value} is too large"))
        })?;
        Self::new(value)
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self> {
        self.0
            .checked_add(rhs.get())
            .map(Self)
            .ok_or_else(|| FulfillmentError::ValidationError("Quantity overflow".to_string()))
    }
}

impl TryFrom<u32> for Quantity {
    type Error = FulfillmentError;

    fn try_from(value: u32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.get()
    }
}

/// One product line in a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
    pub product: Product,
    pub quantity: Quantity,
}

impl CartEntry {
    pub fn line_total(&self) -> Decimal {
        self.product.unit_price * Decimal::from(self.quantity.get())
    }
}

/// The products a customer has selected before checkout.
///
/// Entries are keyed by product id, so each product appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartEntry>", into = "Vec<CartEntry>")]
pub struct Cart {
    entries: BTreeMap<ProductId, CartEntry>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` of `product`, merging into an existing entry by summing.
    pub fn add(&mut self, product: Product, quantity: Quantity) -> Result<()> {
        if !product.available {
            return Err(FulfillmentError::ValidationError(format!(
                "{} is not available",
                product.name
            )));
        }
        match self.entries.get_mut(&product.id) {
            Some(entry) => entry.quantity = entry.quantity.checked_add(quantity)?,
            None => {
                self.entries
                    .insert(product.id, CartEntry { product, quantity });
            }
        }
        Ok(())
    }

    /// Replaces the stored quantity. Zero removes the entry.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> Result<()> {
        let Ok(quantity) = Quantity::new(quantity) else {
            self.entries.remove(product_id);
            return Ok(());
        };
        match self.entries.get_mut(product_id) {
            Some(entry) => {
                entry.quantity = quantity;
                Ok(())
            }
            None => Err(FulfillmentError::NotFound(format!(
                "Product {product_id} is not in the cart"
            ))),
        }
    }

    /// Removes the entry for `product_id`; absent products are ignored.
    pub fn remove(&mut self, product_id: &ProductId) -> Option<CartEntry> {
        self.entries.remove(product_id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn total_amount(&self) -> Decimal {
        self.entries.values().map(CartEntry::line_total).sum()
    }

    pub fn total_item_count(&self) -> u64 {
        self.entries
            .values()
            .map(|entry| u64::from(entry.quantity.get()))
            .sum()
    }

    pub fn get(&self, product_id: &ProductId) -> Option<&CartEntry> {
        self.entries.get(product_id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CartEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rebuilds a cart from its serialized entries. Repeated products are merged,
/// and a merge that overflows fails instead of dropping quantity.
impl TryFrom<Vec<CartEntry>> for Cart {
    type Error = FulfillmentError;

    fn try_from(entries: Vec<CartEntry>) -> Result<Self> {
        let mut cart = Self::new();
        for entry in entries {
            match cart.entries.get_mut(&entry.product.id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.checked_add(entry.quantity)?;
                }
                None => {
                    cart.entries.insert(entry.product.id, entry);
                }
            }
        }
        Ok(cart)
    }
}

impl From<Cart> for Vec<CartEntry> {
    fn from(cart: Cart) -> Self {
        cart.entries.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn cake(price: Decimal) -> Product {
        Product::new(ProductId::generate(), "Chocolate Truffle", price).unwrap()
    }

    fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[test]
    fn test_add_merges_quantities() {
        let mut cart = Cart::new();
        let cake_a = cake(dec!(500));

        cart.add(cake_a.clone(), qty(2)).unwrap();
        cart.add(cake_a.clone(), qty(1)).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(&cake_a.id).unwrap().quantity, qty(3));
        assert_eq!(cart.total_amount(), dec!(1500));
    }

    #[test]
    fn test_set_quantity_zero_removes_entry() {
        let mut cart = Cart::new();
        let cake_a = cake(dec!(500));
        let cake_b = cake(dec!(300));
        cart.add(cake_a.clone(), qty(2)).unwrap();
        cart.add(cake_b.clone(), qty(1)).unwrap();
        assert_eq!(cart.total_item_count(), 3);

        cart.set_quantity(&cake_a.id, 0).unwrap();

        assert!(cart.get(&cake_a.id).is_none());
        assert_eq!(cart.total_item_count(), 1);
        assert_eq!(cart.total_amount(), dec!(300));
    }

    #[test]
    fn test_set_quantity_replaces_without_merging() {
        let mut cart = Cart::new();
        let cake_a = cake(dec!(250.50));
        cart.add(cake_a.clone(), qty(4)).unwrap();

        cart.set_quantity(&cake_a.id, 2).unwrap();

        assert_eq!(cart.get(&cake_a.id).unwrap().quantity, qty(2));
        assert_eq!(cart.total_amount(), dec!(501.00));
    }

    #[test]
    fn test_set_quantity_on_missing_product() {
        let mut cart = Cart::new();
        let result = cart.set_quantity(&ProductId::generate(), 3);
        assert!(matches!(result, Err(FulfillmentError::NotFound(_))));
        assert!(cart.set_quantity(&ProductId::generate(), 0).is_ok());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = Cart::new();
        cart.add(cake(dec!(100)), qty(1)).unwrap();
        assert!(cart.remove(&ProductId::generate()).is_none());
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_unavailable_product_rejected() {
        let mut cart = Cart::new();
        let result = cart.add(cake(dec!(100)).unavailable(), qty(1));
        assert!(matches!(result, Err(FulfillmentError::ValidationError(_))));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_quantity_parse_rejects_bad_input() {
        assert_eq!(Quantity::parse(" 3 ").unwrap(), qty(3));
        for input in ["0", "-2", "abc", "1.5", ""] {
            assert!(
                matches!(Quantity::parse(input), Err(FulfillmentError::ValidationError(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_totals_track_every_mutation() {
        let mut cart = Cart::new();
        let a = cake(dec!(120));
        let b = cake(dec!(80.25));

        cart.add(a.clone(), qty(1)).unwrap();
        cart.add(b.clone(), qty(3)).unwrap();
        assert_eq!(cart.total_amount(), dec!(360.75));

        cart.add(a.clone(), qty(2)).unwrap();
        assert_eq!(cart.total_amount(), dec!(600.75));

        cart.remove(&b.id);
        assert_eq!(cart.total_amount(), dec!(360));

        cart.clear();
        assert_eq!(cart.total_amount(), Decimal::ZERO);
        assert_eq!(cart.total_item_count(), 0);
    }

    fn serialized_entry(quantity: u32) -> String {
        format!(
            r#"{{"product":{{"id":"7f2c1c9e-8f7a-4b8e-9a47-0d1f5c7e2b11","name":"Plum Cake","price":"400","available":true}},"quantity":{quantity}}}"#
        )
    }

    #[test]
    fn test_serialized_cart_rejects_zero_quantity() {
        let json = format!("[{}]", serialized_entry(0));
        assert!(serde_json::from_str::<Cart>(&json).is_err());
    }

    #[test]
    fn test_serialized_duplicates_merge() {
        let json = format!("[{},{}]", serialized_entry(2), serialized_entry(3));
        let cart: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total_item_count(), 5);
    }

    #[test]
    fn test_serialized_duplicates_overflow_is_an_error() {
        let json = format!(
            "[{},{}]",
            serialized_entry(u32::MAX),
            serialized_entry(1)
        );
        let err = serde_json::from_str::<Cart>(&json).unwrap_err();
        assert!(err.to_string().contains("Quantity overflow"));
    }
}
