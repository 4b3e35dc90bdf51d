use crate::application::cart_ledger::CartLedger;
use crate::application::loyalty::{LoyaltyAccrual, LoyaltyGrant};
use crate::domain::delivery::{DeliveryDetails, DeliveryRequest};
use crate::domain::id::{CustomerId, OrderId};
use crate::domain::identity::Actor;
use crate::domain::loyalty::LoyaltyPoints;
use crate::domain::order::{Order, OrderStatus, StatusUpdate};
use crate::domain::payment::PaymentReference;
use crate::domain::ports::{ClockRef, OrderStoreRef};
use crate::error::{FulfillmentError, Result};
use tracing::{info, instrument, warn};

/// What happened to the loyalty grant of a freshly placed order.
///
/// The order stands either way; a failed grant is reported so the caller
/// can reconcile the ledger.
#[derive(Debug)]
pub enum LoyaltyOutcome {
    Granted(LoyaltyGrant),
    Failed {
        points: LoyaltyPoints,
        error: FulfillmentError,
    },
}

#[derive(Debug)]
pub struct PlacedOrder {
    pub order: Order,
    pub loyalty: LoyaltyOutcome,
}

/// Owns order creation and every status change.
///
/// All transitions funnel through [`OrderLifecycle::apply_transition`], which
/// validates against the single transition table and hands the store the
/// version the change was computed from.
#[derive(Clone)]
pub struct OrderLifecycle {
    orders: OrderStoreRef,
    loyalty: LoyaltyAccrual,
    clock: ClockRef,
}

impl OrderLifecycle {
    pub fn new(orders: OrderStoreRef, loyalty: LoyaltyAccrual, clock: ClockRef) -> Self {
        Self {
            orders,
            loyalty,
            clock,
        }
    }

    /// Turns the session's cart into a `pending_payment` order.
    ///
    /// On success the order is stored, loyalty points are granted once and
    /// the cart is cleared. Any validation failure leaves the cart untouched
    /// and stores nothing.
    #[instrument(skip_all, fields(customer = %customer_id, session = %cart.session()))]
    pub async fn place_order(
        &self,
        customer_id: CustomerId,
        cart: &mut CartLedger,
        request: &DeliveryRequest,
    ) -> Result<PlacedOrder> {
        if cart.cart().is_empty() {
            return Err(FulfillmentError::ValidationError(
                "Cannot place an order from an empty cart".to_string(),
            ));
        }
        let delivery = DeliveryDetails::validate(request, self.clock.today())?;
        let order = Order::place(customer_id, cart.cart(), delivery, self.clock.now())?;
        let order = self.orders.create_order(order).await?;
        info!(order = %order.id(), total = %order.total(), "Order placed");

        let loyalty = match self.loyalty.grant(customer_id, order.total()).await {
            Ok(grant) => LoyaltyOutcome::Granted(grant),
            Err(error) => {
                let points = LoyaltyPoints::for_order_total(order.total());
                warn!(order = %order.id(), %points, %error, "Loyalty grant failed; order kept");
                LoyaltyOutcome::Failed { points, error }
            }
        };

        cart.clear().await;
        Ok(PlacedOrder { order, loyalty })
    }

    /// A customer's own orders, newest first.
    pub async fn orders_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>> {
        let mut orders = self.orders.list_orders_by_customer(customer_id).await?;
        sort_newest_first(&mut orders);
        Ok(orders)
    }

    /// Fetches one order on behalf of its owner. Other customers get `NotFound`.
    pub async fn order_for_customer(
        &self,
        customer_id: CustomerId,
        order_id: OrderId,
    ) -> Result<Order> {
        let order = self.orders.get_order(order_id).await?;
        if order.customer_id() != customer_id {
            return Err(FulfillmentError::NotFound(format!("Order {order_id}")));
        }
        Ok(order)
    }

    pub(crate) async fn load(&self, order_id: OrderId) -> Result<Order> {
        self.orders.get_order(order_id).await
    }

    pub(crate) async fn list_all(&self) -> Result<Vec<Order>> {
        let mut orders = self.orders.list_all_orders().await?;
        sort_newest_first(&mut orders);
        Ok(orders)
    }

    pub(crate) fn clock(&self) -> &ClockRef {
        &self.clock
    }

    /// Moves `order` one step along the transition table on behalf of `actor`.
    ///
    /// Rejected requests return before any store call.
    #[instrument(skip_all, fields(order = %order.id(), actor = %actor, to = %to))]
    pub(crate) async fn apply_transition(
        &self,
        actor: &Actor,
        order: &Order,
        to: OrderStatus,
        payment_reference: Option<PaymentReference>,
        admin_note: Option<String>,
    ) -> Result<Order> {
        order.check_transition(actor, to)?;

        let update = StatusUpdate {
            status: to,
            expected_version: order.version(),
            payment_reference,
            admin_note,
            at: self.clock.now(),
        };
        let updated = self.orders.update_order_status(order.id(), update).await?;
        info!(
            from = %order.status(),
            to = %updated.status(),
            version = updated.version(),
            "Order status changed"
        );
        Ok(updated)
    }
}

fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
}
