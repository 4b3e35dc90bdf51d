use crate::application::lifecycle::OrderLifecycle;
use crate::application::payment::{PaymentVerificationWorkflow, normalize_note};
use crate::domain::audit::AdminLogEntry;
use crate::domain::id::OrderId;
use crate::domain::identity::{Actor, AdminIdentity};
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ports::AuditLogRef;
use crate::domain::stats::DashboardStats;
use crate::error::Result;
use chrono::NaiveDate;
use tracing::{debug, instrument, warn};

pub const ACTION_UPDATE_STATUS: &str = "update_order_status";

/// Administrator surface: the admin edges of the transition table, the
/// all-orders view and dashboard figures.
///
/// Every successful transition is written to the audit log. A failed audit
/// write is logged and does not undo the transition.
#[derive(Clone)]
pub struct AdminOrderController {
    lifecycle: OrderLifecycle,
    payments: PaymentVerificationWorkflow,
    audit: AuditLogRef,
}

impl AdminOrderController {
    pub fn new(lifecycle: OrderLifecycle, audit: AuditLogRef) -> Self {
        Self {
            payments: PaymentVerificationWorkflow::new(lifecycle.clone()),
            lifecycle,
            audit,
        }
    }

    pub async fn confirm_payment(
        &self,
        admin: &AdminIdentity,
        order_id: OrderId,
        note: Option<&str>,
    ) -> Result<Order> {
        let note = normalize_note(note);
        let order = self
            .payments
            .confirm_payment(admin, order_id, note.as_deref())
            .await?;
        self.record(
            admin,
            OrderStatus::PaymentVerificationPending,
            &order,
            note.as_deref(),
        )
        .await;
        Ok(order)
    }

    pub async fn start_baking(&self, admin: &AdminIdentity, order_id: OrderId) -> Result<Order> {
        self.advance(admin, order_id, OrderStatus::Baking, None).await
    }

    pub async fn dispatch(&self, admin: &AdminIdentity, order_id: OrderId) -> Result<Order> {
        self.advance(admin, order_id, OrderStatus::OutForDelivery, None)
            .await
    }

    pub async fn mark_delivered(&self, admin: &AdminIdentity, order_id: OrderId) -> Result<Order> {
        self.advance(admin, order_id, OrderStatus::Delivered, None).await
    }

    /// Requests a move to `to`. Anything off the transition table fails with
    /// `StateError` and leaves the order untouched.
    #[instrument(skip_all, fields(admin = %admin.username, order = %order_id, to = %to))]
    pub async fn advance(
        &self,
        admin: &AdminIdentity,
        order_id: OrderId,
        to: OrderStatus,
        note: Option<&str>,
    ) -> Result<Order> {
        if to == OrderStatus::PaymentVerified {
            return self.confirm_payment(admin, order_id, note).await;
        }
        let note = normalize_note(note);
        let order = self.lifecycle.load(order_id).await?;
        let updated = self
            .lifecycle
            .apply_transition(
                &Actor::Admin(admin.clone()),
                &order,
                to,
                None,
                note.clone(),
            )
            .await?;
        self.record(admin, order.status(), &updated, note.as_deref()).await;
        Ok(updated)
    }

    /// Every order, newest first.
    pub async fn list_all_orders(&self, _admin: &AdminIdentity) -> Result<Vec<Order>> {
        self.lifecycle.list_all().await
    }

    pub async fn order(&self, _admin: &AdminIdentity, order_id: OrderId) -> Result<Order> {
        self.lifecycle.load(order_id).await
    }

    /// Dashboard figures as of `as_of`, or today when not given.
    pub async fn dashboard_stats(
        &self,
        _admin: &AdminIdentity,
        as_of: Option<NaiveDate>,
    ) -> Result<DashboardStats> {
        let as_of = as_of.unwrap_or_else(|| self.lifecycle.clock().today());
        let orders = self.lifecycle.list_all().await?;
        Ok(DashboardStats::compute(&orders, as_of))
    }

    pub async fn audit_trail(
        &self,
        _admin: &AdminIdentity,
        order_id: OrderId,
    ) -> Result<Vec<AdminLogEntry>> {
        self.audit.entries_for_order(order_id).await
    }

    /// Writes one entry for a transition. `note` is the note given with this
    /// transition, not the one the order carries from earlier steps.
    async fn record(
        &self,
        admin: &AdminIdentity,
        from: OrderStatus,
        order: &Order,
        note: Option<&str>,
    ) {
        let details = match note {
            Some(note) => format!("{from} -> {}: {note}", order.status()),
            None => format!("{from} -> {}", order.status()),
        };
        let entry = AdminLogEntry {
            admin_id: admin.id,
            admin_user: admin.username.clone(),
            action: ACTION_UPDATE_STATUS.to_string(),
            order_id: Some(order.id()),
            details: Some(details),
            created_at: order.updated_at(),
        };
        match self.audit.record(entry).await {
            Ok(()) => debug!(order = %order.id(), "Audit entry recorded"),
            Err(e) => warn!(order = %order.id(), error = %e, "Failed to record audit entry"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::cart_ledger::CartLedger;
    use crate::application::loyalty::LoyaltyAccrual;
    use crate::domain::cart::Quantity;
    use crate::domain::delivery::DeliveryRequest;
    use crate::domain::id::{AdminId, CustomerId, ProductId, SessionKey};
    use crate::domain::product::Product;
    use crate::error::FulfillmentError;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::in_memory::{
        InMemoryAuditLog, InMemoryCartStore, InMemoryLoyaltyStore, InMemoryOrderStore,
    };
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    struct Harness {
        lifecycle: OrderLifecycle,
        admin: AdminOrderController,
        identity: AdminIdentity,
    }

    fn harness() -> Harness {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()));
        let lifecycle = OrderLifecycle::new(
            Arc::new(InMemoryOrderStore::new()),
            LoyaltyAccrual::new(Arc::new(InMemoryLoyaltyStore::new())),
            clock,
        );
        Harness {
            admin: AdminOrderController::new(lifecycle.clone(), Arc::new(InMemoryAuditLog::new())),
            lifecycle,
            identity: AdminIdentity::new(AdminId::generate(), "ops"),
        }
    }

    async fn place(lifecycle: &OrderLifecycle, customer: CustomerId, amount: Decimal) -> Order {
        let mut cart =
            CartLedger::open(SessionKey::new("admin-test"), Arc::new(InMemoryCartStore::new()))
                .await;
        let cake = Product::new(ProductId::generate(), "Black Forest", amount).unwrap();
        cart.add(cake, Quantity::ONE).await.unwrap();
        let request = DeliveryRequest {
            address: "9 Frosting Road".to_string(),
            pincode: "600001".to_string(),
            date: "2025-06-02".to_string(),
            time_slot: "10:00 AM - 12:00 PM".to_string(),
            message: None,
        };
        lifecycle.place_order(customer, &mut cart, &request).await.unwrap().order
    }

    #[tokio::test]
    async fn test_full_admin_progression_is_audited() {
        let h = harness();
        let customer = CustomerId::generate();
        let order = place(&h.lifecycle, customer, dec!(400)).await;
        PaymentVerificationWorkflow::new(h.lifecycle.clone())
            .submit_payment(customer, order.id())
            .await
            .unwrap();

        h.admin
            .confirm_payment(&h.identity, order.id(), Some("paid"))
            .await
            .unwrap();
        h.admin.start_baking(&h.identity, order.id()).await.unwrap();
        h.admin.dispatch(&h.identity, order.id()).await.unwrap();
        let done = h.admin.mark_delivered(&h.identity, order.id()).await.unwrap();
        assert_eq!(done.status(), OrderStatus::Delivered);
        assert_eq!(done.version(), 5);
        assert_eq!(done.admin_note(), Some("paid"));

        let trail = h.admin.audit_trail(&h.identity, order.id()).await.unwrap();
        let details: Vec<_> = trail.iter().map(|e| e.details.as_deref()).collect();
        assert_eq!(
            details,
            vec![
                Some("payment_verification_pending -> payment_verified: paid"),
                Some("payment_verified -> baking"),
                Some("baking -> out_for_delivery"),
                Some("out_for_delivery -> delivered"),
            ]
        );
        assert!(trail.iter().all(|e| e.action == ACTION_UPDATE_STATUS));
    }

    #[tokio::test]
    async fn test_note_is_audited_on_the_step_it_was_given() {
        let h = harness();
        let customer = CustomerId::generate();
        let order = place(&h.lifecycle, customer, dec!(320)).await;
        PaymentVerificationWorkflow::new(h.lifecycle.clone())
            .submit_payment(customer, order.id())
            .await
            .unwrap();

        h.admin
            .confirm_payment(&h.identity, order.id(), None)
            .await
            .unwrap();
        h.admin
            .advance(&h.identity, order.id(), OrderStatus::Baking, Some("  oven 2  "))
            .await
            .unwrap();

        let trail = h.admin.audit_trail(&h.identity, order.id()).await.unwrap();
        assert_eq!(
            trail[0].details.as_deref(),
            Some("payment_verification_pending -> payment_verified")
        );
        assert_eq!(
            trail[1].details.as_deref(),
            Some("payment_verified -> baking: oven 2")
        );
    }

    #[tokio::test]
    async fn test_confirm_through_advance_is_audited() {
        let h = harness();
        let customer = CustomerId::generate();
        let order = place(&h.lifecycle, customer, dec!(150)).await;
        PaymentVerificationWorkflow::new(h.lifecycle.clone())
            .submit_payment(customer, order.id())
            .await
            .unwrap();

        let confirmed = h
            .admin
            .advance(&h.identity, order.id(), OrderStatus::PaymentVerified, Some("upi"))
            .await
            .unwrap();
        assert_eq!(confirmed.status(), OrderStatus::PaymentVerified);

        let trail = h.admin.audit_trail(&h.identity, order.id()).await.unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].admin_id, h.identity.id);
        assert_eq!(
            trail[0].details.as_deref(),
            Some("payment_verification_pending -> payment_verified: upi")
        );
    }

    #[tokio::test]
    async fn test_skipping_is_rejected_without_side_effects() {
        let h = harness();
        let order = place(&h.lifecycle, CustomerId::generate(), dec!(250)).await;

        let result = h.admin.start_baking(&h.identity, order.id()).await;
        assert!(matches!(result, Err(FulfillmentError::StateError { .. })));

        let result = h
            .admin
            .advance(&h.identity, order.id(), OrderStatus::PaymentVerificationPending, None)
            .await;
        assert!(matches!(result, Err(FulfillmentError::Forbidden(_))));

        let stored = h.admin.order(&h.identity, order.id()).await.unwrap();
        assert_eq!(stored, order);
        assert!(h.admin.audit_trail(&h.identity, order.id()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dashboard_stats_day_revenue() {
        let h = harness();
        let first = CustomerId::generate();
        place(&h.lifecycle, first, dec!(200)).await;
        place(&h.lifecycle, first, dec!(300)).await;
        let other = place(&h.lifecycle, CustomerId::generate(), dec!(50)).await;
        PaymentVerificationWorkflow::new(h.lifecycle.clone())
            .submit_payment(other.customer_id(), other.id())
            .await
            .unwrap();

        let stats = h
            .admin
            .dashboard_stats(&h.identity, NaiveDate::from_ymd_opt(2025, 6, 1))
            .await
            .unwrap();
        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.day_revenue, dec!(550));
        assert_eq!(stats.awaiting_payment, 2);
        assert_eq!(stats.awaiting_verification, 1);
        assert_eq!(stats.in_flight_orders, 1);
        assert_eq!(stats.total_customers, 2);

        let later = h
            .admin
            .dashboard_stats(&h.identity, NaiveDate::from_ymd_opt(2025, 6, 2))
            .await
            .unwrap();
        assert_eq!(later.day_revenue, Decimal::ZERO);
        assert_eq!(later.month_revenue, dec!(550));
    }
}
