//! Customer reporting types for the admin API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use beauty_shop_core::{Cents, UserId};

use super::Order;

/// A `USER` account with its order statistics.
///
/// `total_spent` only counts orders that were `SHIPPED` or `DELIVERED`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: UserId,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub order_count: i64,
    pub last_order: Option<DateTime<Utc>>,
    pub total_spent: Cents,
}

/// One customer with their most recent orders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub summary: CustomerSummary,
    /// Newest first.
    pub recent_orders: Vec<Order>,
}
