use crate::domain::order::{Order, OrderStatus};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;

/// Aggregate figures for the administrator dashboard.
///
/// Day and month buckets compare the order's UTC creation date against the
/// calendar day and month of `as_of`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DashboardStats {
    pub as_of: Option<NaiveDate>,
    pub total_orders: usize,
    pub in_flight_orders: usize,
    pub awaiting_payment: usize,
    pub awaiting_verification: usize,
    pub day_revenue: Decimal,
    pub month_revenue: Decimal,
    pub total_customers: usize,
}

impl DashboardStats {
    pub fn compute<'a>(orders: impl IntoIterator<Item = &'a Order>, as_of: NaiveDate) -> Self {
        let mut stats = Self {
            as_of: Some(as_of),
            ..Self::default()
        };
        let mut customers = HashSet::new();

        for order in orders {
            stats.total_orders += 1;
            customers.insert(order.customer_id());

            let status = order.status();
            if status.is_in_flight() {
                stats.in_flight_orders += 1;
            }
            match status {
                OrderStatus::PendingPayment => stats.awaiting_payment += 1,
                OrderStatus::PaymentVerificationPending => stats.awaiting_verification += 1,
                _ => {}
            }

            let created = order.created_at().date_naive();
            if created.year() == as_of.year() && created.month() == as_of.month() {
                stats.month_revenue += order.total();
                if created.day() == as_of.day() {
                    stats.day_revenue += order.total();
                }
            }
        }

        stats.total_customers = customers.len();
        stats
    }
}
