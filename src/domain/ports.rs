//! Outbound ports of the fulfillment core.
//!
//! Together `OrderStore`, `LoyaltyStore`, `ProductCatalog`, `CartStore` and
//! `AuditLog` make up the persistence gateway. None of them enforce business
//! rules beyond what the domain types already guarantee, and the core never
//! retries a failed call.

use super::audit::AdminLogEntry;
use super::cart::Cart;
use super::id::{CustomerId, OrderId, ProductId, SessionKey};
use super::identity::AdminIdentity;
use super::loyalty::LoyaltyPoints;
use super::order::{Order, StatusUpdate};
use super::product::Product;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use secrecy::SecretString;
use std::sync::Arc;

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a freshly placed order.
    async fn create_order(&self, order: Order) -> Result<Order>;
    /// Applies `update` if the stored version still matches; returns the updated order.
    async fn update_order_status(&self, order_id: OrderId, update: StatusUpdate) -> Result<Order>;
    /// Fails with `NotFound` when the order does not exist.
    async fn get_order(&self, order_id: OrderId) -> Result<Order>;
    async fn list_orders_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>>;
    async fn list_all_orders(&self) -> Result<Vec<Order>>;
}

#[async_trait]
pub trait LoyaltyStore: Send + Sync {
    /// Adds `delta` to the balance and returns the new balance.
    async fn update_loyalty_balance(
        &self,
        customer_id: CustomerId,
        delta: LoyaltyPoints,
    ) -> Result<LoyaltyPoints>;
    /// Customers without a ledger entry have a zero balance.
    async fn get_balance(&self, customer_id: CustomerId) -> Result<LoyaltyPoints>;
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Orderable products sorted by name.
    async fn list_available_products(&self) -> Result<Vec<Product>>;
    async fn get_product(&self, product_id: ProductId) -> Result<Product>;
    async fn upsert_product(&self, product: Product) -> Result<()>;
}

/// Per-session cart mirror. Last write wins.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn load_cart(&self, session: &SessionKey) -> Result<Option<Cart>>;
    async fn save_cart(&self, session: &SessionKey, cart: &Cart) -> Result<()>;
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, entry: AdminLogEntry) -> Result<()>;
    async fn entries_for_order(&self, order_id: OrderId) -> Result<Vec<AdminLogEntry>>;
}

/// Checks administrator credentials and mints the identity the core trusts.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &SecretString) -> Result<AdminIdentity>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// The business calendar date, in UTC.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

pub type OrderStoreRef = Arc<dyn OrderStore>;
pub type LoyaltyStoreRef = Arc<dyn LoyaltyStore>;
pub type ProductCatalogRef = Arc<dyn ProductCatalog>;
pub type CartStoreRef = Arc<dyn CartStore>;
pub type AuditLogRef = Arc<dyn AuditLog>;
pub type ClockRef = Arc<dyn Clock>;

/// Builds a fresh order store, e.g. one per test or per tenant.
pub type OrderStoreFactory = Box<dyn Fn() -> OrderStoreRef + Send + Sync>;
