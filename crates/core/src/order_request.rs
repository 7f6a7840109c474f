//! Client-submitted order payloads and their structural validation.
//!
//! Validation here is purely structural and runs before any storage access.
//! Whether a product exists or has stock is decided later, inside the
//! checkout transaction.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::types::ProductId;

/// Largest quantity accepted for a single line (matches the `INTEGER` stock
/// column).
pub const MAX_LINE_QUANTITY: i64 = 2_147_483_647;

/// Reasons a create-order payload is rejected before touching storage.
///
/// Variants are listed in the order the checks run; the first failure wins.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderRequestError {
    #[error("Order must contain at least one item")]
    NoItems,
    #[error("Shipping address is required")]
    ShippingAddressRequired,
    #[error("Payment method is required")]
    PaymentMethodRequired,
    #[error("Invalid product ID: {0}")]
    InvalidProductId(String),
    #[error("Quantity must be at least 1")]
    QuantityTooSmall,
    #[error("Quantity is too large")]
    QuantityTooLarge,
    #[error("Billing address must be an object")]
    InvalidBillingAddress,
    /// `PostgreSQL` text and `jsonb` columns cannot store `\0`.
    #[error("Order text must not contain NUL characters")]
    NulCharacter,
}

/// One line of a create-order payload as received.
///
/// There is deliberately no price field: unknown fields such as a client
/// `price` are ignored and totals come from the catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequestLine {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub variant: Option<String>,
}

/// A create-order payload as received.
///
/// Every field is optional at the serde level so that a missing field yields
/// the specific validation message instead of a generic parse error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[serde(default)]
    pub items: Option<Vec<OrderRequestLine>>,
    #[serde(default)]
    pub shipping_address: Option<Value>,
    #[serde(default)]
    pub billing_address: Option<Value>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A validated order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub variant: Option<String>,
}

/// A payload that passed every structural check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOrder {
    /// Lines in submission order.
    pub lines: Vec<OrderLine>,
    pub shipping_address: Map<String, Value>,
    pub billing_address: Option<Map<String, Value>>,
    pub payment_method: String,
    pub notes: Option<String>,
}

impl OrderRequest {
    /// Run the structural checks in order and return the first failure.
    ///
    /// # Errors
    ///
    /// Returns the [`OrderRequestError`] for the first check that fails.
    pub fn validate(self) -> Result<ValidatedOrder, OrderRequestError> {
        let items = match self.items {
            Some(items) if !items.is_empty() => items,
            _ => return Err(OrderRequestError::NoItems),
        };

        let shipping_address = match self.shipping_address {
            Some(Value::Object(map)) if !map.is_empty() => map,
            _ => return Err(OrderRequestError::ShippingAddressRequired),
        };

        let payment_method = self
            .payment_method
            .map(|m| m.trim().to_owned())
            .filter(|m| !m.is_empty())
            .ok_or(OrderRequestError::PaymentMethodRequired)?;

        let lines = items
            .into_iter()
            .map(OrderRequestLine::validate)
            .collect::<Result<Vec<_>, _>>()?;

        let billing_address = match self.billing_address {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(map),
            Some(_) => return Err(OrderRequestError::InvalidBillingAddress),
        };

        let notes = self
            .notes
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty());

        let has_nul = payment_method.contains('\0')
            || notes.as_deref().is_some_and(|n| n.contains('\0'))
            || lines
                .iter()
                .filter_map(|l| l.variant.as_deref())
                .any(|v| v.contains('\0'))
            || object_has_nul(&shipping_address)
            || billing_address.as_ref().is_some_and(object_has_nul);
        if has_nul {
            return Err(OrderRequestError::NulCharacter);
        }

        Ok(ValidatedOrder {
            lines,
            shipping_address,
            billing_address,
            payment_method,
            notes,
        })
    }
}

fn object_has_nul(map: &Map<String, Value>) -> bool {
    map.iter()
        .any(|(key, value)| key.contains('\0') || value_has_nul(value))
}

fn value_has_nul(value: &Value) -> bool {
    match value {
        Value::String(s) => s.contains('\0'),
        Value::Array(values) => values.iter().any(value_has_nul),
        Value::Object(map) => object_has_nul(map),
        Value::Null | Value::Bool(_) | Value::Number(_) => false,
    }
}

impl OrderRequestLine {
    fn validate(self) -> Result<OrderLine, OrderRequestError> {
        let product_id = self
            .product_id
            .trim()
            .parse::<ProductId>()
            .map_err(|_| OrderRequestError::InvalidProductId(self.product_id.clone()))?;

        if self.quantity < 1 {
            return Err(OrderRequestError::QuantityTooSmall);
        }
        let quantity = u32::try_from(self.quantity)
            .ok()
            .filter(|&q| i64::from(q) <= MAX_LINE_QUANTITY)
            .ok_or(OrderRequestError::QuantityTooLarge)?;

        let variant = self
            .variant
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty());

        Ok(OrderLine {
            product_id,
            quantity,
            variant,
        })
    }
}
