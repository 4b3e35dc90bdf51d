use crate::domain::audit::AdminLogEntry;
use crate::domain::cart::Cart;
use crate::domain::id::{CustomerId, OrderId, ProductId, SessionKey};
use crate::domain::loyalty::LoyaltyPoints;
use crate::domain::order::{Order, StatusUpdate};
use crate::domain::payment::PaymentReference;
use crate::domain::ports::{AuditLog, CartStore, LoyaltyStore, OrderStore, ProductCatalog};
use crate::domain::product::Product;
use crate::error::{FulfillmentError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct OrderTable {
    orders: HashMap<OrderId, Order>,
    payment_refs: HashSet<PaymentReference>,
}

/// A thread-safe in-memory order store.
///
/// Version checks and the payment-reference uniqueness constraint are
/// evaluated under a single write lock, so concurrent updates to one order
/// serialise and the loser sees `Conflict`.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    table: Arc<RwLock<OrderTable>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create_order(&self, order: Order) -> Result<Order> {
        let mut table = self.table.write().await;
        if table.orders.contains_key(&order.id()) {
            return Err(FulfillmentError::ConstraintViolation(format!(
                "Order {} already exists",
                order.id()
            )));
        }
        table.orders.insert(order.id(), order.clone());
        Ok(order)
    }

    async fn update_order_status(&self, order_id: OrderId, update: StatusUpdate) -> Result<Order> {
        let mut guard = self.table.write().await;
        let table = &mut *guard;

        if let Some(reference) = &update.payment_reference
            && table.payment_refs.contains(reference)
        {
            return Err(FulfillmentError::ConstraintViolation(format!(
                "Payment reference {reference} is already in use"
            )));
        }

        let order = table
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| FulfillmentError::NotFound(format!("Order {order_id}")))?;
        order.apply(&update)?;

        if let Some(reference) = update.payment_reference {
            table.payment_refs.insert(reference);
        }
        Ok(order.clone())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        let table = self.table.read().await;
        table
            .orders
            .get(&order_id)
            .cloned()
            .ok_or_else(|| FulfillmentError::NotFound(format!("Order {order_id}")))
    }

    async fn list_orders_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>> {
        let table = self.table.read().await;
        Ok(table
            .orders
            .values()
            .filter(|order| order.customer_id() == customer_id)
            .cloned()
            .collect())
    }

    async fn list_all_orders(&self) -> Result<Vec<Order>> {
        let table = self.table.read().await;
        Ok(table.orders.values().cloned().collect())
    }
}

/// A thread-safe in-memory loyalty ledger.
#[derive(Default, Clone)]
pub struct InMemoryLoyaltyStore {
    balances: Arc<RwLock<HashMap<CustomerId, LoyaltyPoints>>>,
}

impl InMemoryLoyaltyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoyaltyStore for InMemoryLoyaltyStore {
    async fn update_loyalty_balance(
        &self,
        customer_id: CustomerId,
        delta: LoyaltyPoints,
    ) -> Result<LoyaltyPoints> {
        let mut balances = self.balances.write().await;
        let balance = balances.entry(customer_id).or_default();
        *balance += delta;
        Ok(*balance)
    }

    async fn get_balance(&self, customer_id: CustomerId) -> Result<LoyaltyPoints> {
        let balances = self.balances.read().await;
        Ok(balances.get(&customer_id).copied().unwrap_or_default())
    }
}

/// A thread-safe in-memory product catalog.
#[derive(Default, Clone)]
pub struct InMemoryCatalog {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn list_available_products(&self) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        let mut available: Vec<Product> = products
            .values()
            .filter(|product| product.available)
            .cloned()
            .collect();
        available.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(available)
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Product> {
        let products = self.products.read().await;
        products
            .get(&product_id)
            .cloned()
            .ok_or_else(|| FulfillmentError::NotFound(format!("Product {product_id}")))
    }

    async fn upsert_product(&self, product: Product) -> Result<()> {
        product.validate()?;
        let mut products = self.products.write().await;
        products.insert(product.id, product);
        Ok(())
    }
}

/// A thread-safe in-memory cart mirror keyed by session.
#[derive(Default, Clone)]
pub struct InMemoryCartStore {
    carts: Arc<RwLock<HashMap<SessionKey, Cart>>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn load_cart(&self, session: &SessionKey) -> Result<Option<Cart>> {
        let carts = self.carts.read().await;
        Ok(carts.get(session).cloned())
    }

    async fn save_cart(&self, session: &SessionKey, cart: &Cart) -> Result<()> {
        let mut carts = self.carts.write().await;
        carts.insert(session.clone(), cart.clone());
        Ok(())
    }
}

/// An append-only in-memory audit log.
#[derive(Default, Clone)]
pub struct InMemoryAuditLog {
    entries: Arc<RwLock<Vec<AdminLogEntry>>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn record(&self, entry: AdminLogEntry) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.push(entry);
        Ok(())
    }

    async fn entries_for_order(&self, order_id: OrderId) -> Result<Vec<AdminLogEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|entry| entry.order_id == Some(order_id))
            .cloned()
            .collect())
    }
}
