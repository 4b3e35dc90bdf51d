use crate::domain::cart::{Cart, Quantity};
use crate::domain::id::{ProductId, SessionKey};
use crate::domain::ports::CartStoreRef;
use crate::domain::product::Product;
use crate::error::Result;
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

/// The cart of one browsing session, mirrored to a keyed store.
///
/// The in-memory cart is authoritative. Every mutation is written through
/// to the mirror; a failed mirror write is logged and otherwise ignored, and
/// writes from another session under the same key simply overwrite it.
pub struct CartLedger {
    session: SessionKey,
    cart: Cart,
    mirror: CartStoreRef,
}

impl CartLedger {
    /// Restores the session's cart from the mirror, or starts empty.
    #[instrument(skip_all, fields(session = %session))]
    pub async fn open(session: SessionKey, mirror: CartStoreRef) -> Self {
        let cart = match mirror.load_cart(&session).await {
            Ok(Some(cart)) => cart,
            Ok(None) => Cart::new(),
            Err(e) => {
                warn!(error = %e, "Failed to restore saved cart, starting empty");
                Cart::new()
            }
        };
        Self {
            session,
            cart,
            mirror,
        }
    }

    pub async fn add(&mut self, product: Product, quantity: Quantity) -> Result<()> {
        self.cart.add(product, quantity)?;
        self.sync().await;
        Ok(())
    }

    pub async fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> Result<()> {
        self.cart.set_quantity(product_id, quantity)?;
        self.sync().await;
        Ok(())
    }

    pub async fn remove(&mut self, product_id: &ProductId) {
        if self.cart.remove(product_id).is_some() {
            self.sync().await;
        }
    }

    pub async fn clear(&mut self) {
        self.cart.clear();
        self.sync().await;
    }

    pub fn total_amount(&self) -> Decimal {
        self.cart.total_amount()
    }

    pub fn total_item_count(&self) -> u64 {
        self.cart.total_item_count()
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn session(&self) -> &SessionKey {
        &self.session
    }

    async fn sync(&self) {
        match self.mirror.save_cart(&self.session, &self.cart).await {
            Ok(()) => debug!(
                session = %self.session,
                items = self.cart.total_item_count(),
                "Cart mirrored"
            ),
            Err(e) => warn!(session = %self.session, error = %e, "Failed to mirror cart"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::CartStore;
    use crate::error::FulfillmentError;
    use crate::infrastructure::in_memory::InMemoryCartStore;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    struct BrokenMirror;

    #[async_trait]
    impl CartStore for BrokenMirror {
        async fn load_cart(&self, _session: &SessionKey) -> Result<Option<Cart>> {
            Err(FulfillmentError::store("mirror unreadable"))
        }

        async fn save_cart(&self, _session: &SessionKey, _cart: &Cart) -> Result<()> {
            Err(FulfillmentError::store("mirror read-only"))
        }
    }

    fn cake(name: &str, price: Decimal) -> Product {
        Product::new(ProductId::generate(), name, price).unwrap()
    }

    #[tokio::test]
    async fn test_mutations_are_mirrored() {
        let mirror = Arc::new(InMemoryCartStore::new());
        let session = SessionKey::new("session-a");
        let cake_a = cake("Cake A", dec!(500));

        let mut ledger = CartLedger::open(session.clone(), mirror.clone()).await;
        ledger.add(cake_a.clone(), Quantity::new(2).unwrap()).await.unwrap();
        ledger.add(cake_a.clone(), Quantity::ONE).await.unwrap();

        let reopened = CartLedger::open(session, mirror).await;
        assert_eq!(reopened.total_item_count(), 3);
        assert_eq!(reopened.total_amount(), dec!(1500));
    }

    #[tokio::test]
    async fn test_set_quantity_zero_removes() {
        let mirror = Arc::new(InMemoryCartStore::new());
        let mut ledger = CartLedger::open(SessionKey::new("s"), mirror).await;
        let cake_a = cake("Cake A", dec!(500));
        let cake_b = cake("Cake B", dec!(200));
        ledger.add(cake_a.clone(), Quantity::new(3).unwrap()).await.unwrap();
        ledger.add(cake_b, Quantity::ONE).await.unwrap();

        ledger.set_quantity(&cake_a.id, 0).await.unwrap();

        assert!(ledger.cart().get(&cake_a.id).is_none());
        assert_eq!(ledger.total_item_count(), 1);
    }

    #[tokio::test]
    async fn test_broken_mirror_does_not_fail_cart() {
        let mut ledger = CartLedger::open(SessionKey::new("s"), Arc::new(BrokenMirror)).await;
        assert!(ledger.cart().is_empty());

        ledger
            .add(cake("Cake A", dec!(120)), Quantity::ONE)
            .await
            .unwrap();
        assert_eq!(ledger.total_amount(), dec!(120));

        ledger.clear().await;
        assert!(ledger.cart().is_empty());
    }

    #[tokio::test]
    async fn test_other_session_overwrites_mirror() {
        let mirror = Arc::new(InMemoryCartStore::new());
        let session = SessionKey::new("shared");

        let mut first = CartLedger::open(session.clone(), mirror.clone()).await;
        let mut second = CartLedger::open(session.clone(), mirror.clone()).await;
        first.add(cake("Cake A", dec!(100)), Quantity::ONE).await.unwrap();
        second.add(cake("Cake B", dec!(300)), Quantity::ONE).await.unwrap();

        let reopened = CartLedger::open(session, mirror).await;
        assert_eq!(reopened.total_amount(), dec!(300));
    }
}
