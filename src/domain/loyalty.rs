use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// One point is earned for every this many currency units spent.
pub const SPEND_PER_POINT: Decimal = dec!(10);

/// Informational currency value of a single point.
pub const POINT_VALUE: Decimal = dec!(0.1);

pub const SILVER_THRESHOLD: u64 = 500;
pub const GOLD_THRESHOLD: u64 = 1000;

/// A loyalty point balance or grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoyaltyPoints(pub u64);

impl LoyaltyPoints {
    pub const ZERO: Self = Self(0);

    /// Points earned by an order of `total`: `floor(total / 10)`.
    pub fn for_order_total(total: Decimal) -> Self {
        if total.is_sign_negative() {
            return Self::ZERO;
        }
        Self((total / SPEND_PER_POINT).floor().to_u64().unwrap_or(u64::MAX))
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Add for LoyaltyPoints {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl AddAssign for LoyaltyPoints {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.saturating_add(rhs);
    }
}

impl fmt::Display for LoyaltyPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Membership tier derived from a balance. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
}

impl Tier {
    pub fn for_balance(balance: LoyaltyPoints) -> Self {
        match balance.0 {
            b if b >= GOLD_THRESHOLD => Self::Gold,
            b if b >= SILVER_THRESHOLD => Self::Silver,
            _ => Self::Bronze,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bronze => write!(f, "Bronze"),
            Self::Silver => write!(f, "Silver"),
            Self::Gold => write!(f, "Gold"),
        }
    }
}

/// Read-only view of a customer's loyalty position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoyaltyStanding {
    pub balance: LoyaltyPoints,
    pub tier: Tier,
    /// Points still needed for the next tier; `None` once Gold.
    pub points_to_next_tier: Option<u64>,
    /// What the balance is worth if redeemed by hand.
    pub redemption_value: Decimal,
}

impl LoyaltyStanding {
    pub fn from_balance(balance: LoyaltyPoints) -> Self {
        let tier = Tier::for_balance(balance);
        let points_to_next_tier = match tier {
            Tier::Bronze => Some(SILVER_THRESHOLD - balance.0),
            Tier::Silver => Some(GOLD_THRESHOLD - balance.0),
            Tier::Gold => None,
        };
        Self {
            balance,
            tier,
            points_to_next_tier,
            redemption_value: (Decimal::from(balance.0) * POINT_VALUE).normalize(),
        }
    }
}
