//! Domain layer: the types and rules of cart, order, payment and loyalty,
//! with no I/O. Storage and time are reached only through [`ports`].

pub mod audit;
pub mod cart;
pub mod delivery;
pub mod id;
pub mod identity;
pub mod loyalty;
pub mod order;
pub mod payment;
pub mod ports;
pub mod product;
pub mod stats;
