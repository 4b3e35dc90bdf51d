use crate::error::{FulfillmentError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest personal message that can be piped onto a cake.
pub const MAX_MESSAGE_CHARS: usize = 100;

/// Date format accepted for delivery dates.
pub const DELIVERY_DATE_FORMAT: &str = "%Y-%m-%d";

/// The fixed two-hour delivery windows customers can choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeSlot {
    #[serde(rename = "10:00 AM - 12:00 PM")]
    LateMorning,
    #[serde(rename = "12:00 PM - 2:00 PM")]
    Midday,
    #[serde(rename = "2:00 PM - 4:00 PM")]
    Afternoon,
    #[serde(rename = "4:00 PM - 6:00 PM")]
    LateAfternoon,
    #[serde(rename = "6:00 PM - 8:00 PM")]
    Evening,
}

impl TimeSlot {
    pub const ALL: [Self; 5] = [
        Self::LateMorning,
        Self::Midday,
        Self::Afternoon,
        Self::LateAfternoon,
        Self::Evening,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::LateMorning => "10:00 AM - 12:00 PM",
            Self::Midday => "12:00 PM - 2:00 PM",
            Self::Afternoon => "2:00 PM - 4:00 PM",
            Self::LateAfternoon => "4:00 PM - 6:00 PM",
            Self::Evening => "6:00 PM - 8:00 PM",
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeSlot {
    type Err = FulfillmentError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|slot| slot.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                FulfillmentError::ValidationError(format!("Unknown delivery time slot '{wanted}'"))
            })
    }
}

/// Delivery fields exactly as submitted at checkout, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRequest {
    pub address: String,
    pub pincode: String,
    pub date: String,
    pub time_slot: String,
    pub message: Option<String>,
}

/// Validated delivery details stored on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryDetails {
    pub address: String,
    pub pincode: String,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub message: Option<String>,
}

impl DeliveryDetails {
    /// Validates a checkout request against the business calendar's `today`.
    ///
    /// The delivery date must be strictly after `today`.
    pub fn validate(request: &DeliveryRequest, today: NaiveDate) -> Result<Self> {
        let address = required(&request.address, "Delivery address")?;
        let pincode = required(&request.pincode, "Pincode")?;

        let date_input = required(&request.date, "Delivery date")?;
        let date = NaiveDate::parse_from_str(&date_input, DELIVERY_DATE_FORMAT).map_err(|_| {
            FulfillmentError::ValidationError(format!(
                "Delivery date '{date_input}' is not a valid YYYY-MM-DD date"
            ))
        })?;
        if date <= today {
            return Err(FulfillmentError::ValidationError(
                "Please select a delivery date at least one day in advance".to_string(),
            ));
        }

        let time_slot = required(&request.time_slot, "Delivery time slot")?.parse()?;

        let message = request
            .message
            .as_deref()
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(str::to_string);
        if let Some(message) = &message
            && message.chars().count() > MAX_MESSAGE_CHARS
        {
            return Err(FulfillmentError::ValidationError(format!(
                "Message must be at most {MAX_MESSAGE_CHARS} characters"
            )));
        }

        Ok(Self {
            address,
            pincode,
            date,
            time_slot,
            message,
        })
    }
}

fn required(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(FulfillmentError::ValidationError(format!(
            "{field} is required"
        )))
    } else {
        Ok(trimmed.to_string())
    }
}
