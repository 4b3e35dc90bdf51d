use crate::domain::id::OrderId;
use crate::domain::order::OrderStatus;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FulfillmentError>;

#[derive(Error, Debug)]
pub enum FulfillmentError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Order {order} cannot move from {current} to {requested}")]
    StateError {
        order: OrderId,
        current: OrderStatus,
        requested: OrderStatus,
    },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Order {order} was modified concurrently (expected version {expected}, found {found})")]
    Conflict {
        order: OrderId,
        expected: u64,
        found: u64,
    },
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Store error: {0}")]
    StoreError(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl FulfillmentError {
    pub fn store<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::StoreError(err.into())
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for FulfillmentError {
    fn from(err: rocksdb::Error) -> Self {
        Self::StoreError(Box::new(err))
    }
}

impl From<serde_json::Error> for FulfillmentError {
    fn from(err: serde_json::Error) -> Self {
        Self::StoreError(Box::new(err))
    }
}
