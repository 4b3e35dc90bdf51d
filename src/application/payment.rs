use crate::application::lifecycle::OrderLifecycle;
use crate::domain::id::{CustomerId, OrderId};
use crate::domain::identity::{Actor, AdminIdentity};
use crate::domain::order::{Order, OrderStatus};
use crate::domain::payment::PaymentReference;
use crate::error::{FulfillmentError, Result};
use tracing::{info, instrument};

/// Off-band payment handshake: the customer claims payment with a reference,
/// an administrator confirms it by hand.
#[derive(Clone)]
pub struct PaymentVerificationWorkflow {
    lifecycle: OrderLifecycle,
}

impl PaymentVerificationWorkflow {
    pub fn new(lifecycle: OrderLifecycle) -> Self {
        Self { lifecycle }
    }

    /// Attaches a fresh payment reference and moves the order to
    /// `payment_verification_pending`. Works once per order; later calls fail
    /// with `StateError` and leave the first reference in place.
    #[instrument(skip_all, fields(customer = %customer_id, order = %order_id))]
    pub async fn submit_payment(
        &self,
        customer_id: CustomerId,
        order_id: OrderId,
    ) -> Result<Order> {
        let order = self.lifecycle.order_for_customer(customer_id, order_id).await?;
        let actor = Actor::Customer(customer_id);
        order.check_transition(&actor, OrderStatus::PaymentVerificationPending)?;
        if order.payment_reference().is_some() {
            return Err(FulfillmentError::StateError {
                order: order_id,
                current: order.status(),
                requested: OrderStatus::PaymentVerificationPending,
            });
        }

        let reference = PaymentReference::generate(self.lifecycle.clock().now());
        let updated = self
            .lifecycle
            .apply_transition(
                &actor,
                &order,
                OrderStatus::PaymentVerificationPending,
                Some(reference),
                None,
            )
            .await?;
        info!(
            reference = ?updated.payment_reference().map(PaymentReference::as_str),
            "Payment submitted"
        );
        Ok(updated)
    }

    /// Administrator confirmation of a submitted payment. A blank note is dropped.
    /// Reached through `AdminOrderController`, which writes the audit entry.
    #[instrument(skip_all, fields(admin = %admin.username, order = %order_id))]
    pub(crate) async fn confirm_payment(
        &self,
        admin: &AdminIdentity,
        order_id: OrderId,
        note: Option<&str>,
    ) -> Result<Order> {
        let order = self.lifecycle.load(order_id).await?;
        self.lifecycle
            .apply_transition(
                &Actor::Admin(admin.clone()),
                &order,
                OrderStatus::PaymentVerified,
                None,
                normalize_note(note),
            )
            .await
    }
}

pub(crate) fn normalize_note(note: Option<&str>) -> Option<String> {
    note.map(str::trim)
        .filter(|note| !note.is_empty())
        .map(str::to_string)
}
