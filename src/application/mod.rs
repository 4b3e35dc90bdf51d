//! Application layer: the services the presentation layer talks to.
//!
//! [`FulfillmentCore`] wires them over one set of gateway adapters so that
//! every service sees the same stores and clock.

pub mod admin;
pub mod cart_ledger;
pub mod lifecycle;
pub mod loyalty;
pub mod payment;

use crate::domain::id::SessionKey;
use crate::domain::ports::{
    AuditLogRef, CartStoreRef, ClockRef, LoyaltyStoreRef, OrderStoreRef, ProductCatalogRef,
};
use crate::domain::product::Product;
use crate::error::Result;
use admin::AdminOrderController;
use cart_ledger::CartLedger;
use lifecycle::OrderLifecycle;
use loyalty::LoyaltyAccrual;
use payment::PaymentVerificationWorkflow;

/// The persistence gateway as a bundle of port implementations.
#[derive(Clone)]
pub struct Gateway {
    pub orders: OrderStoreRef,
    pub loyalty: LoyaltyStoreRef,
    pub catalog: ProductCatalogRef,
    pub carts: CartStoreRef,
    pub audit: AuditLogRef,
}

#[derive(Clone)]
pub struct FulfillmentCore {
    catalog: ProductCatalogRef,
    carts: CartStoreRef,
    loyalty: LoyaltyAccrual,
    lifecycle: OrderLifecycle,
    payments: PaymentVerificationWorkflow,
    admin: AdminOrderController,
}

impl FulfillmentCore {
    pub fn new(gateway: Gateway, clock: ClockRef) -> Self {
        let loyalty = LoyaltyAccrual::new(gateway.loyalty);
        let lifecycle = OrderLifecycle::new(gateway.orders, loyalty.clone(), clock);
        Self {
            catalog: gateway.catalog,
            carts: gateway.carts,
            payments: PaymentVerificationWorkflow::new(lifecycle.clone()),
            admin: AdminOrderController::new(lifecycle.clone(), gateway.audit),
            loyalty,
            lifecycle,
        }
    }

    /// Orderable products, sorted by name.
    pub async fn products(&self) -> Result<Vec<Product>> {
        self.catalog.list_available_products().await
    }

    pub fn catalog(&self) -> &ProductCatalogRef {
        &self.catalog
    }

    pub async fn open_cart(&self, session: SessionKey) -> CartLedger {
        CartLedger::open(session, self.carts.clone()).await
    }

    pub fn lifecycle(&self) -> &OrderLifecycle {
        &self.lifecycle
    }

    pub fn payments(&self) -> &PaymentVerificationWorkflow {
        &self.payments
    }

    pub fn admin(&self) -> &AdminOrderController {
        &self.admin
    }

    pub fn loyalty(&self) -> &LoyaltyAccrual {
        &self.loyalty
    }
}
