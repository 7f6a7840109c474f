//! Order domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use beauty_shop_core::{
    Cents, OrderId, OrderItemId, OrderNumber, OrderStatus, PaymentStatus, ProductId, UserId,
};

/// A placed order with its line items.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub order_number: OrderNumber,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub subtotal: Cents,
    pub tax: Cents,
    pub shipping: Cents,
    pub total: Cents,
    pub shipping_address: Value,
    pub billing_address: Option<Value>,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of an order. `name` and `price` are snapshots taken when the
/// order was placed and do not follow later catalog edits.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub name: String,
    pub price: Cents,
    pub quantity: u32,
    pub variant: Option<String>,
    pub created_at: DateTime<Utc>,
}

