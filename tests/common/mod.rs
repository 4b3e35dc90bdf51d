#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use orderflow::application::cart_ledger::CartLedger;
use orderflow::application::{FulfillmentCore, Gateway};
use orderflow::domain::cart::Quantity;
use orderflow::domain::delivery::DeliveryRequest;
use orderflow::domain::id::{AdminId, CustomerId, ProductId, SessionKey};
use orderflow::domain::identity::AdminIdentity;
use orderflow::domain::order::Order;
use orderflow::domain::product::Product;
use orderflow::infrastructure::clock::FixedClock;
use orderflow::infrastructure::in_memory::{
    InMemoryAuditLog, InMemoryCartStore, InMemoryCatalog, InMemoryLoyaltyStore, InMemoryOrderStore,
};
use rust_decimal::Decimal;
use std::sync::Arc;

pub fn launch_day() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
}

pub fn in_memory_gateway() -> Gateway {
    Gateway {
        orders: Arc::new(InMemoryOrderStore::new()),
        loyalty: Arc::new(InMemoryLoyaltyStore::new()),
        catalog: Arc::new(InMemoryCatalog::new()),
        carts: Arc::new(InMemoryCartStore::new()),
        audit: Arc::new(InMemoryAuditLog::new()),
    }
}

pub struct TestBakery {
    pub core: FulfillmentCore,
    pub gateway: Gateway,
    pub clock: Arc<FixedClock>,
}

impl TestBakery {
    pub fn new() -> Self {
        Self::with_gateway(in_memory_gateway())
    }

    pub fn with_gateway(gateway: Gateway) -> Self {
        let clock = Arc::new(FixedClock::new(launch_day()));
        Self {
            core: FulfillmentCore::new(gateway.clone(), clock.clone()),
            gateway,
            clock,
        }
    }

    pub async fn stock(&self, name: &str, price: Decimal) -> Product {
        let product = Product::new(ProductId::generate(), name, price).unwrap();
        self.gateway.catalog.upsert_product(product.clone()).await.unwrap();
        product
    }

    pub async fn cart_with(&self, session: &str, items: &[(&Product, u32)]) -> CartLedger {
        let mut cart = self.core.open_cart(SessionKey::new(session)).await;
        for (product, quantity) in items {
            cart.add((*product).clone(), Quantity::new(*quantity).unwrap())
                .await
                .unwrap();
        }
        cart
    }

    /// Places a one-line order for `amount` on behalf of `customer`.
    pub async fn place(&self, customer: CustomerId, amount: Decimal) -> Order {
        let cake = self.stock("House Special", amount).await;
        let mut cart = self.cart_with(&customer.to_string(), &[(&cake, 1)]).await;
        self.core
            .lifecycle()
            .place_order(customer, &mut cart, &delivery("2025-06-02"))
            .await
            .unwrap()
            .order
    }
}

pub fn delivery(date: &str) -> DeliveryRequest {
    DeliveryRequest {
        address: "221 Baker Street".to_string(),
        pincode: "400050".to_string(),
        date: date.to_string(),
        time_slot: "2:00 PM - 4:00 PM".to_string(),
        message: None,
    }
}

pub fn admin() -> AdminIdentity {
    AdminIdentity::new(AdminId::generate(), "ops")
}
