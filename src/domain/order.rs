use crate::domain::cart::{Cart, Quantity};
use crate::domain::delivery::DeliveryDetails;
use crate::domain::id::{CustomerId, OrderId, ProductId};
use crate::domain::identity::{Actor, Role};
use crate::domain::payment::PaymentReference;
use crate::error::{FulfillmentError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where an order sits in its fulfillment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    PendingPayment,
    PaymentVerificationPending,
    PaymentVerified,
    Baking,
    OutForDelivery,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [Self; 6] = [
        Self::PendingPayment,
        Self::PaymentVerificationPending,
        Self::PaymentVerified,
        Self::Baking,
        Self::OutForDelivery,
        Self::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingPayment => "pending_payment",
            Self::PaymentVerificationPending => "payment_verification_pending",
            Self::PaymentVerified => "payment_verified",
            Self::Baking => "baking",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
        }
    }

    /// Customer-facing wording.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PendingPayment => "Pending Payment",
            Self::PaymentVerificationPending => "Payment Verification Pending",
            Self::PaymentVerified => "Payment Verified",
            Self::Baking => "Baking in Progress",
            Self::OutForDelivery => "Out for Delivery",
            Self::Delivered => "Delivered",
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == Self::Delivered
    }

    /// Paid for (or claimed paid) but not yet delivered.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Self::PaymentVerificationPending
                | Self::PaymentVerified
                | Self::Baking
                | Self::OutForDelivery
        )
    }

    /// The single status this one may advance to.
    pub fn next(&self) -> Option<Self> {
        TRANSITIONS
            .iter()
            .find(|transition| transition.from == *self)
            .map(|transition| transition.to)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = FulfillmentError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| FulfillmentError::ValidationError(format!("Unknown order status '{s}'")))
    }
}

/// One directed edge of the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub actor: Role,
}

/// Every legal status change. Each target status has exactly one incoming edge.
pub const TRANSITIONS: [Transition; 5] = [
    Transition {
        from: OrderStatus::PendingPayment,
        to: OrderStatus::PaymentVerificationPending,
        actor: Role::Customer,
    },
    Transition {
        from: OrderStatus::PaymentVerificationPending,
        to: OrderStatus::PaymentVerified,
        actor: Role::Admin,
    },
    Transition {
        from: OrderStatus::PaymentVerified,
        to: OrderStatus::Baking,
        actor: Role::Admin,
    },
    Transition {
        from: OrderStatus::Baking,
        to: OrderStatus::OutForDelivery,
        actor: Role::Admin,
    },
    Transition {
        from: OrderStatus::OutForDelivery,
        to: OrderStatus::Delivered,
        actor: Role::Admin,
    },
];

/// Looks up the edge leading into `to`, if any.
pub fn transition_into(to: OrderStatus) -> Option<&'static Transition> {
    TRANSITIONS.iter().find(|transition| transition.to == to)
}

/// A product line frozen at placement time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: Quantity,
}

impl OrderLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity.get())
    }
}

/// A status change as handed to the persistence gateway.
///
/// `expected_version` is the order version the change was computed from;
/// the store refuses the update if the order has moved on since.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub status: OrderStatus,
    pub expected_version: u64,
    pub payment_reference: Option<PaymentReference>,
    pub admin_note: Option<String>,
    pub at: DateTime<Utc>,
}

/// A placed purchase.
///
/// Lines and total are captured once in [`Order::place`] and never change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    customer_id: CustomerId,
    lines: Vec<OrderLine>,
    total: Decimal,
    delivery: DeliveryDetails,
    status: OrderStatus,
    payment_reference: Option<PaymentReference>,
    admin_note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Order {
    /// Snapshots `cart` into a new order in `pending_payment`.
    pub fn place(
        customer_id: CustomerId,
        cart: &Cart,
        delivery: DeliveryDetails,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if cart.is_empty() {
            return Err(FulfillmentError::ValidationError(
                "Cannot place an order from an empty cart".to_string(),
            ));
        }

        let lines: Vec<OrderLine> = cart
            .entries()
            .map(|entry| OrderLine {
                product_id: entry.product.id,
                name: entry.product.name.clone(),
                unit_price: entry.product.unit_price,
                quantity: entry.quantity,
            })
            .collect();
        let total: Decimal = lines.iter().map(OrderLine::line_total).sum();

        Ok(Self {
            id: OrderId::generate(),
            customer_id,
            lines,
            total,
            delivery,
            status: OrderStatus::PendingPayment,
            payment_reference: None,
            admin_note: None,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn item_count(&self) -> u64 {
        self.lines
            .iter()
            .map(|line| u64::from(line.quantity.get()))
            .sum()
    }

    pub fn delivery(&self) -> &DeliveryDetails {
        &self.delivery
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_reference(&self) -> Option<&PaymentReference> {
        self.payment_reference.as_ref()
    }

    pub fn admin_note(&self) -> Option<&str> {
        self.admin_note.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Checks that `actor` may move this order to `to` right now.
    ///
    /// Role is checked before state, so an actor never learns more about an
    /// order's progress than the edges they are allowed to drive.
    pub fn check_transition(
        &self,
        actor: &Actor,
        to: OrderStatus,
    ) -> Result<&'static Transition> {
        let transition = transition_into(to).ok_or(FulfillmentError::StateError {
            order: self.id,
            current: self.status,
            requested: to,
        })?;

        if transition.actor != actor.role() {
            return Err(FulfillmentError::Forbidden(format!(
                "{actor} may not move orders to {to}"
            )));
        }
        if let Actor::Customer(customer) = actor
            && *customer != self.customer_id
        {
            return Err(FulfillmentError::Forbidden(format!(
                "{actor} does not own order {}",
                self.id
            )));
        }
        if transition.from != self.status {
            return Err(FulfillmentError::StateError {
                order: self.id,
                current: self.status,
                requested: to,
            });
        }
        Ok(transition)
    }

    /// Applies a gateway status update. Stores call this under their write lock.
    pub fn apply(&mut self, update: &StatusUpdate) -> Result<()> {
        if update.expected_version != self.version {
            return Err(FulfillmentError::Conflict {
                order: self.id,
                expected: update.expected_version,
                found: self.version,
            });
        }
        if self.status.next() != Some(update.status) {
            return Err(FulfillmentError::StateError {
                order: self.id,
                current: self.status,
                requested: update.status,
            });
        }
        let awaits_verification = update.status == OrderStatus::PaymentVerificationPending;
        match (&update.payment_reference, awaits_verification) {
            (None, true) => {
                return Err(FulfillmentError::ConstraintViolation(format!(
                    "Order {} needs a payment reference to await verification",
                    self.id
                )));
            }
            (Some(_), false) => {
                return Err(FulfillmentError::ConstraintViolation(format!(
                    "A payment reference can only be attached when order {} awaits verification",
                    self.id
                )));
            }
            (Some(_), true) if self.payment_reference.is_some() => {
                return Err(FulfillmentError::ConstraintViolation(format!(
                    "Order {} already has a payment reference",
                    self.id
                )));
            }
            (Some(reference), true) => self.payment_reference = Some(reference.clone()),
            (None, false) => {}
        }
        if let Some(note) = &update.admin_note {
            self.admin_note = Some(note.clone());
        }
        self.status = update.status;
        self.updated_at = update.at;
        self.version += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::delivery::TimeSlot;
    use crate::domain::id::AdminId;
    use crate::domain::identity::AdminIdentity;
    use crate::domain::product::Product;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn delivery() -> DeliveryDetails {
        DeliveryDetails {
            address: "7 Cocoa Lane".to_string(),
            pincode: "400001".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
            time_slot: TimeSlot::Evening,
            message: None,
        }
    }

    fn order_for(customer: CustomerId) -> Order {
        let mut cart = Cart::new();
        let product = Product::new(ProductId::generate(), "Pineapple Cake", dec!(450)).unwrap();
        cart.add(product, Quantity::new(2).unwrap()).unwrap();
        Order::place(customer, &cart, delivery(), now()).unwrap()
    }

    fn admin() -> Actor {
        Actor::Admin(AdminIdentity::new(AdminId::generate(), "ops"))
    }

    fn update(order: &Order, status: OrderStatus) -> StatusUpdate {
        StatusUpdate {
            status,
            expected_version: order.version(),
            payment_reference: None,
            admin_note: None,
            at: now(),
        }
    }

    #[test]
    fn test_place_snapshots_cart() {
        let order = order_for(CustomerId::generate());
        assert_eq!(order.status(), OrderStatus::PendingPayment);
        assert_eq!(order.total(), dec!(900));
        assert_eq!(order.item_count(), 2);
        assert_eq!(order.version(), 0);
        assert!(order.payment_reference().is_none());
    }

    #[test]
    fn test_place_rejects_empty_cart() {
        let result = Order::place(CustomerId::generate(), &Cart::new(), delivery(), now());
        assert!(matches!(result, Err(FulfillmentError::ValidationError(_))));
    }

    #[test]
    fn test_table_is_a_single_chain() {
        let mut status = OrderStatus::PendingPayment;
        let mut visited = vec![status];
        while let Some(next) = status.next() {
            status = next;
            visited.push(status);
        }
        assert_eq!(visited, OrderStatus::ALL.to_vec());
        assert!(status.is_terminal());
    }

    #[test]
    fn test_every_non_edge_is_rejected() {
        let customer = CustomerId::generate();
        let order = order_for(customer);
        for to in OrderStatus::ALL {
            let actor = match transition_into(to).map(|t| t.actor) {
                Some(Role::Customer) => Actor::Customer(customer),
                _ => admin(),
            };
            let result = order.check_transition(&actor, to);
            if to == OrderStatus::PaymentVerificationPending {
                assert!(result.is_ok());
            } else {
                assert!(
                    matches!(result, Err(FulfillmentError::StateError { .. })),
                    "{to} should be rejected from pending_payment"
                );
            }
        }
    }

    #[test]
    fn test_role_enforced() {
        let customer = CustomerId::generate();
        let order = order_for(customer);

        let result = order.check_transition(&admin(), OrderStatus::PaymentVerificationPending);
        assert!(matches!(result, Err(FulfillmentError::Forbidden(_))));

        let stranger = Actor::Customer(CustomerId::generate());
        let result = order.check_transition(&stranger, OrderStatus::PaymentVerificationPending);
        assert!(matches!(result, Err(FulfillmentError::Forbidden(_))));

        let result = order.check_transition(&Actor::Customer(customer), OrderStatus::Baking);
        assert!(matches!(result, Err(FulfillmentError::Forbidden(_))));
    }

    #[test]
    fn test_apply_bumps_version_and_sets_reference() {
        let mut order = order_for(CustomerId::generate());
        let reference = PaymentReference::generate(now());
        let mut change = update(&order, OrderStatus::PaymentVerificationPending);
        change.payment_reference = Some(reference.clone());

        order.apply(&change).unwrap();

        assert_eq!(order.status(), OrderStatus::PaymentVerificationPending);
        assert_eq!(order.payment_reference(), Some(&reference));
        assert_eq!(order.version(), 1);
    }

    #[test]
    fn test_apply_rejects_stale_version() {
        let mut order = order_for(CustomerId::generate());
        let mut stale = update(&order, OrderStatus::PaymentVerificationPending);
        stale.payment_reference = Some(PaymentReference::generate(now()));
        order.apply(&stale).unwrap();

        let mut again = stale.clone();
        again.status = OrderStatus::PaymentVerified;
        again.payment_reference = None;
        let result = order.apply(&again);
        assert!(matches!(
            result,
            Err(FulfillmentError::Conflict {
                expected: 0,
                found: 1,
                ..
            })
        ));
        assert_eq!(order.status(), OrderStatus::PaymentVerificationPending);
    }

    #[test]
    fn test_awaiting_verification_requires_reference() {
        let mut order = order_for(CustomerId::generate());
        let bare = update(&order, OrderStatus::PaymentVerificationPending);
        assert!(matches!(
            order.apply(&bare),
            Err(FulfillmentError::ConstraintViolation(_))
        ));
        assert_eq!(order.status(), OrderStatus::PendingPayment);
        assert_eq!(order.version(), 0);
    }

    #[test]
    fn test_reference_only_attaches_on_submission() {
        let mut order = order_for(CustomerId::generate());
        let reference = PaymentReference::generate(now());
        let mut submit = update(&order, OrderStatus::PaymentVerificationPending);
        submit.payment_reference = Some(reference.clone());
        order.apply(&submit).unwrap();

        let mut verify = update(&order, OrderStatus::PaymentVerified);
        verify.payment_reference = Some(PaymentReference::generate(now()));
        assert!(matches!(
            order.apply(&verify),
            Err(FulfillmentError::ConstraintViolation(_))
        ));
        assert_eq!(order.status(), OrderStatus::PaymentVerificationPending);
        assert_eq!(order.payment_reference(), Some(&reference));
        assert_eq!(order.version(), 1);
    }

    #[test]
    fn test_apply_rejects_skipping() {
        let mut order = order_for(CustomerId::generate());
        let skip = update(&order, OrderStatus::Baking);
        assert!(matches!(
            order.apply(&skip),
            Err(FulfillmentError::StateError { .. })
        ));
        assert_eq!(order.status(), OrderStatus::PendingPayment);
        assert_eq!(order.version(), 0);
    }

    #[test]
    fn test_status_parse() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("pending_verification".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&OrderStatus::OutForDelivery).unwrap();
        assert_eq!(json, "\"out_for_delivery\"");
    }
}
