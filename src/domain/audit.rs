use crate::domain::id::{AdminId, OrderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A record of something an administrator did to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminLogEntry {
    pub admin_id: AdminId,
    pub admin_user: String,
    pub action: String,
    pub order_id: Option<OrderId>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}
