use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix every generated payment reference starts with.
pub const PAYMENT_REFERENCE_PREFIX: &str = "PRG";

/// Length of the random suffix appended after the timestamp.
pub const PAYMENT_REFERENCE_SUFFIX_LEN: usize = 5;

/// Token a customer attaches to an order to signal an off-band payment.
///
/// Format: `PRG` + milliseconds since the epoch + five uppercase alphanumerics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentReference(String);

impl PaymentReference {
    pub fn generate(now: DateTime<Utc>) -> Self {
        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(PAYMENT_REFERENCE_SUFFIX_LEN)
            .map(|b| char::from(b).to_ascii_uppercase())
            .collect();
        Self(format!(
            "{PAYMENT_REFERENCE_PREFIX}{}{suffix}",
            now.timestamp_millis()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
