use crate::application::lifecycle::{LoyaltyOutcome, PlacedOrder};
use crate::domain::audit::AdminLogEntry;
use crate::domain::id::{CustomerId, OrderId, ProductId};
use crate::domain::loyalty::LoyaltyStanding;
use crate::domain::order::Order;
use crate::domain::product::Product;
use crate::domain::stats::DashboardStats;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct OrderRow<'a> {
    order_id: OrderId,
    customer_id: CustomerId,
    status: &'a str,
    status_label: &'a str,
    total: Decimal,
    items: u64,
    delivery_date: String,
    time_slot: &'a str,
    payment_reference: Option<&'a str>,
    admin_note: Option<&'a str>,
    created_at: String,
    version: u64,
}

impl<'a> From<&'a Order> for OrderRow<'a> {
    fn from(order: &'a Order) -> Self {
        let status = order.status();
        Self {
            order_id: order.id(),
            customer_id: order.customer_id(),
            status: status.as_str(),
            status_label: status.label(),
            total: order.total(),
            items: order.item_count(),
            delivery_date: order.delivery().date.to_string(),
            time_slot: order.delivery().time_slot.label(),
            payment_reference: order.payment_reference().map(|r| r.as_str()),
            admin_note: order.admin_note(),
            created_at: order.created_at().to_rfc3339(),
            version: order.version(),
        }
    }
}

#[derive(Serialize)]
struct PlacedRow<'a> {
    order_id: OrderId,
    customer_id: CustomerId,
    status: &'a str,
    total: Decimal,
    items: u64,
    delivery_date: String,
    time_slot: &'a str,
    loyalty_points: u64,
    loyalty_balance: Option<u64>,
    loyalty_error: Option<String>,
}

#[derive(Serialize)]
struct ProductRow<'a> {
    id: ProductId,
    name: &'a str,
    price: Decimal,
}

#[derive(Serialize)]
struct LoyaltyRow {
    customer_id: CustomerId,
    balance: u64,
    tier: String,
    points_to_next_tier: Option<u64>,
    redemption_value: Decimal,
}

/// Writes reports as CSV with a header row.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(destination: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(destination),
        }
    }

    pub fn write_orders<'a>(&mut self, orders: impl IntoIterator<Item = &'a Order>) -> Result<()> {
        for order in orders {
            self.writer.serialize(OrderRow::from(order))?;
        }
        self.flush()
    }

    pub fn write_placed(&mut self, placed: &PlacedOrder) -> Result<()> {
        let (loyalty_points, loyalty_balance, loyalty_error) = match &placed.loyalty {
            LoyaltyOutcome::Granted(grant) => {
                (grant.points.value(), Some(grant.balance.value()), None)
            }
            LoyaltyOutcome::Failed { points, error } => {
                (points.value(), None, Some(error.to_string()))
            }
        };
        let order = &placed.order;
        self.writer.serialize(PlacedRow {
            order_id: order.id(),
            customer_id: order.customer_id(),
            status: order.status().as_str(),
            total: order.total(),
            items: order.item_count(),
            delivery_date: order.delivery().date.to_string(),
            time_slot: order.delivery().time_slot.label(),
            loyalty_points,
            loyalty_balance,
            loyalty_error,
        })?;
        self.flush()
    }

    pub fn write_products(&mut self, products: &[Product]) -> Result<()> {
        for product in products {
            self.writer.serialize(ProductRow {
                id: product.id,
                name: &product.name,
                price: product.unit_price,
            })?;
        }
        self.flush()
    }

    pub fn write_stats(&mut self, stats: &DashboardStats) -> Result<()> {
        self.writer.serialize(stats)?;
        self.flush()
    }

    pub fn write_loyalty(
        &mut self,
        customer_id: CustomerId,
        standing: &LoyaltyStanding,
    ) -> Result<()> {
        self.writer.serialize(LoyaltyRow {
            customer_id,
            balance: standing.balance.value(),
            tier: standing.tier.to_string(),
            points_to_next_tier: standing.points_to_next_tier,
            redemption_value: standing.redemption_value,
        })?;
        self.flush()
    }

    pub fn write_audit(&mut self, entries: &[AdminLogEntry]) -> Result<()> {
        for entry in entries {
            self.writer.serialize(entry)?;
        }
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
