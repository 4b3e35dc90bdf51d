use crate::domain::audit::AdminLogEntry;
use crate::domain::cart::Cart;
use crate::domain::id::{CustomerId, OrderId, ProductId, SessionKey};
use crate::domain::loyalty::LoyaltyPoints;
use crate::domain::order::{Order, StatusUpdate};
use crate::domain::ports::{AuditLog, CartStore, LoyaltyStore, OrderStore, ProductCatalog};
use crate::domain::product::Product;
use crate::error::{FulfillmentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for placed orders, keyed by order id.
pub const CF_ORDERS: &str = "orders";
/// Column Family mapping payment references to the order that claimed them.
pub const CF_PAYMENT_REFS: &str = "payment_refs";
/// Column Family for loyalty balances, keyed by customer id.
pub const CF_LOYALTY: &str = "loyalty";
/// Column Family for catalog products.
pub const CF_PRODUCTS: &str = "products";
/// Column Family for mirrored carts, keyed by session.
pub const CF_CARTS: &str = "carts";
/// Column Family for the admin audit log, keyed by order id + sequence.
pub const CF_AUDIT: &str = "audit";

const COLUMN_FAMILIES: [&str; 6] = [
    CF_ORDERS,
    CF_PAYMENT_REFS,
    CF_LOYALTY,
    CF_PRODUCTS,
    CF_CARTS,
    CF_AUDIT,
];

/// A persistent store implementation using RocksDB.
///
/// One database backs every gateway port, each in its own Column Family.
/// Read-modify-write sequences (status updates, balance increments) hold
/// `write_lock` so the version check and the write happen atomically with
/// respect to other writers in this process.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that every required column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            FulfillmentError::store(format!("Column family '{name}' not found"))
        })
    }

    fn get_json<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(cf, key, bytes)?;
        Ok(())
    }

    fn scan_json<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut values = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            values.push(serde_json::from_slice(&value)?);
        }
        Ok(values)
    }
}

#[async_trait]
impl OrderStore for RocksDBStore {
    async fn create_order(&self, order: Order) -> Result<Order> {
        let _guard = self.write_lock.lock().await;
        let key = order.id().as_uuid().as_bytes().to_vec();
        if self.get_json::<Order>(CF_ORDERS, &key)?.is_some() {
            return Err(FulfillmentError::ConstraintViolation(format!(
                "Order {} already exists",
                order.id()
            )));
        }
        self.put_json(CF_ORDERS, &key, &order)?;
        Ok(order)
    }

    async fn update_order_status(&self, order_id: OrderId, update: StatusUpdate) -> Result<Order> {
        let _guard = self.write_lock.lock().await;
        let key = order_id.as_uuid().as_bytes().to_vec();

        if let Some(reference) = &update.payment_reference
            && self
                .get_json::<OrderId>(CF_PAYMENT_REFS, reference.as_str().as_bytes())?
                .is_some()
        {
            return Err(FulfillmentError::ConstraintViolation(format!(
                "Payment reference {reference} is already in use"
            )));
        }

        let mut order: Order = self
            .get_json(CF_ORDERS, &key)?
            .ok_or_else(|| FulfillmentError::NotFound(format!("Order {order_id}")))?;
        order.apply(&update)?;

        if let Some(reference) = &update.payment_reference {
            self.put_json(CF_PAYMENT_REFS, reference.as_str().as_bytes(), &order_id)?;
        }
        self.put_json(CF_ORDERS, &key, &order)?;
        Ok(order)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.get_json(CF_ORDERS, order_id.as_uuid().as_bytes())?
            .ok_or_else(|| FulfillmentError::NotFound(format!("Order {order_id}")))
    }

    async fn list_orders_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>> {
        let orders: Vec<Order> = self.scan_json(CF_ORDERS)?;
        Ok(orders
            .into_iter()
            .filter(|order| order.customer_id() == customer_id)
            .collect())
    }

    async fn list_all_orders(&self) -> Result<Vec<Order>> {
        self.scan_json(CF_ORDERS)
    }
}

#[async_trait]
impl LoyaltyStore for RocksDBStore {
    async fn update_loyalty_balance(
        &self,
        customer_id: CustomerId,
        delta: LoyaltyPoints,
    ) -> Result<LoyaltyPoints> {
        let _guard = self.write_lock.lock().await;
        let key = customer_id.as_uuid().as_bytes();
        let current: LoyaltyPoints = self.get_json(CF_LOYALTY, key)?.unwrap_or_default();
        let updated = current + delta;
        self.put_json(CF_LOYALTY, key, &updated)?;
        Ok(updated)
    }

    async fn get_balance(&self, customer_id: CustomerId) -> Result<LoyaltyPoints> {
        Ok(self
            .get_json(CF_LOYALTY, customer_id.as_uuid().as_bytes())?
            .unwrap_or_default())
    }
}

#[async_trait]
impl ProductCatalog for RocksDBStore {
    async fn list_available_products(&self) -> Result<Vec<Product>> {
        let mut products: Vec<Product> = self.scan_json(CF_PRODUCTS)?;
        products.retain(|product| product.available);
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Product> {
        self.get_json(CF_PRODUCTS, product_id.as_uuid().as_bytes())?
            .ok_or_else(|| FulfillmentError::NotFound(format!("Product {product_id}")))
    }

    async fn upsert_product(&self, product: Product) -> Result<()> {
        product.validate()?;
        self.put_json(CF_PRODUCTS, product.id.as_uuid().as_bytes(), &product)
    }
}

#[async_trait]
impl CartStore for RocksDBStore {
    async fn load_cart(&self, session: &SessionKey) -> Result<Option<Cart>> {
        self.get_json(CF_CARTS, session.as_str().as_bytes())
    }

    async fn save_cart(&self, session: &SessionKey, cart: &Cart) -> Result<()> {
        self.put_json(CF_CARTS, session.as_str().as_bytes(), cart)
    }
}

#[async_trait]
impl AuditLog for RocksDBStore {
    async fn record(&self, entry: AdminLogEntry) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut key = entry
            .order_id
            .map(|id| id.as_uuid().as_bytes().to_vec())
            .unwrap_or_else(|| vec![0; 16]);
        let timestamp = entry
            .created_at
            .timestamp_nanos_opt()
            .unwrap_or(i64::MAX)
            .to_be_bytes();
        key.extend_from_slice(&timestamp);
        key.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
        self.put_json(CF_AUDIT, &key, &entry)
    }

    async fn entries_for_order(&self, order_id: OrderId) -> Result<Vec<AdminLogEntry>> {
        let cf = self.cf(CF_AUDIT)?;
        let prefix = order_id.as_uuid().as_bytes();
        let mut entries = Vec::new();
        for item in self.db.prefix_iterator_cf(cf, prefix) {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            entries.push(serde_json::from_slice(&value)?);
        }
        Ok(entries)
    }
}
