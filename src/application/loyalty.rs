use crate::domain::id::CustomerId;
use crate::domain::loyalty::{LoyaltyPoints, LoyaltyStanding};
use crate::domain::ports::LoyaltyStoreRef;
use crate::error::Result;
use rust_decimal::Decimal;
use tracing::{info, instrument};

/// Points credited for one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoyaltyGrant {
    pub customer_id: CustomerId,
    pub points: LoyaltyPoints,
    pub balance: LoyaltyPoints,
}

/// Credits loyalty points at order placement. Balances only ever grow here.
#[derive(Clone)]
pub struct LoyaltyAccrual {
    ledger: LoyaltyStoreRef,
}

impl LoyaltyAccrual {
    pub fn new(ledger: LoyaltyStoreRef) -> Self {
        Self { ledger }
    }

    #[instrument(skip(self, customer_id), fields(customer = %customer_id))]
    pub async fn grant(
        &self,
        customer_id: CustomerId,
        order_total: Decimal,
    ) -> Result<LoyaltyGrant> {
        let points = LoyaltyPoints::for_order_total(order_total);
        let balance = self.ledger.update_loyalty_balance(customer_id, points).await?;
        info!(%points, %balance, "Loyalty points granted");
        Ok(LoyaltyGrant {
            customer_id,
            points,
            balance,
        })
    }

    pub async fn standing(&self, customer_id: CustomerId) -> Result<LoyaltyStanding> {
        let balance = self.ledger.get_balance(customer_id).await?;
        Ok(LoyaltyStanding::from_balance(balance))
    }
}
