//! Adapters for the domain ports: in-memory stores, the optional RocksDB
//! store, Argon2 credential checks and clocks.

pub mod clock;
pub mod credentials;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
