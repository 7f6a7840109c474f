//! Server-side order pricing.
//!
//! Totals are always derived from catalog prices read inside the checkout
//! transaction plus the store's pricing settings. Nothing here trusts a
//! client-supplied amount.

use serde::Serialize;
use serde_json::Value;

use crate::types::Cents;

/// Errors raised while computing totals.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// An intermediate amount does not fit in 64 bits.
    #[error("order amount overflow")]
    Overflow,
}

/// Tax and shipping parameters for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingRules {
    /// Tax rate in whole percent.
    pub tax_rate_percent: i64,
    /// Shipping charged below the free-shipping threshold.
    pub standard_shipping: Cents,
    /// Subtotal at or above which shipping is free.
    pub free_shipping_threshold: Cents,
}

impl PricingRules {
    /// Tax rate used when the store settings do not provide a usable one.
    pub const DEFAULT_TAX_RATE_PERCENT: i64 = 16;
    /// Shipping rate used when the store settings do not provide one.
    pub const DEFAULT_STANDARD_SHIPPING: Cents = Cents::new(500);
    /// Free-shipping threshold used when the store settings do not provide one.
    pub const DEFAULT_FREE_SHIPPING_THRESHOLD: Cents = Cents::new(5000);

    /// Read rules from the `"store"` settings blob.
    ///
    /// Looks at `tax.rate`, `shipping.standardShippingRate`, and
    /// `shipping.freeShippingThreshold`. Each field falls back to its default
    /// on its own when missing, negative, or not a number. Fractional values
    /// are truncated toward zero.
    #[must_use]
    pub fn from_settings(store: Option<&Value>) -> Self {
        let Some(store) = store else {
            return Self::default();
        };

        let tax_rate_percent = read_amount(store, "tax", "rate")
            .unwrap_or(Self::DEFAULT_TAX_RATE_PERCENT);
        let standard_shipping = read_amount(store, "shipping", "standardShippingRate")
            .map_or(Self::DEFAULT_STANDARD_SHIPPING, Cents::new);
        let free_shipping_threshold = read_amount(store, "shipping", "freeShippingThreshold")
            .map_or(Self::DEFAULT_FREE_SHIPPING_THRESHOLD, Cents::new);

        Self {
            tax_rate_percent,
            standard_shipping,
            free_shipping_threshold,
        }
    }

    /// Names of the fields in `store` that were unusable and fell back to a
    /// default. Empty when every field was read.
    #[must_use]
    pub fn fallback_fields(store: &Value) -> Vec<&'static str> {
        [
            ("tax", "rate", "tax.rate"),
            ("shipping", "standardShippingRate", "shipping.standardShippingRate"),
            (
                "shipping",
                "freeShippingThreshold",
                "shipping.freeShippingThreshold",
            ),
        ]
        .into_iter()
        .filter(|(section, field, _)| read_amount(store, section, field).is_none())
        .map(|(_, _, path)| path)
        .collect()
    }
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            tax_rate_percent: Self::DEFAULT_TAX_RATE_PERCENT,
            standard_shipping: Self::DEFAULT_STANDARD_SHIPPING,
            free_shipping_threshold: Self::DEFAULT_FREE_SHIPPING_THRESHOLD,
        }
    }
}

/// Read a non-negative whole amount at `store[section][field]`.
#[allow(clippy::cast_possible_truncation)]
fn read_amount(store: &Value, section: &str, field: &str) -> Option<i64> {
    let value = store.get(section)?.get(field)?;

    if let Some(n) = value.as_i64() {
        return (n >= 0).then_some(n);
    }
    if value.as_u64().is_some() {
        return Some(i64::MAX);
    }

    let n = value.as_f64()?;
    // `as` saturates for out-of-range floats
    (n.is_finite() && n >= 0.0).then(|| n.trunc() as i64)
}

/// Computed totals for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub subtotal: Cents,
    pub tax: Cents,
    pub shipping: Cents,
    pub total: Cents,
}

impl OrderTotals {
    /// Derive tax, shipping, and total from a subtotal.
    ///
    /// `tax = floor(subtotal * rate / 100)`; shipping is waived when the
    /// subtotal reaches the free-shipping threshold.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if any amount leaves the `i64`
    /// range.
    pub fn compute(subtotal: Cents, rules: &PricingRules) -> Result<Self, PricingError> {
        let scaled = i128::from(subtotal.minor_units())
            .checked_mul(i128::from(rules.tax_rate_percent))
            .ok_or(PricingError::Overflow)?;
        let tax = i64::try_from(scaled.div_euclid(100))
            .map(Cents::new)
            .map_err(|_| PricingError::Overflow)?;

        let shipping = if subtotal >= rules.free_shipping_threshold {
            Cents::ZERO
        } else {
            rules.standard_shipping
        };

        let total = subtotal
            .checked_add(tax)
            .and_then(|t| t.checked_add(shipping))
            .ok_or(PricingError::Overflow)?;

        Ok(Self {
            subtotal,
            tax,
            shipping,
            total,
        })
    }
}

/// Sum `price * quantity` over order lines with overflow checks.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the subtotal leaves the `i64` range.
pub fn subtotal<I>(lines: I) -> Result<Cents, PricingError>
where
    I: IntoIterator<Item = (Cents, u32)>,
{
    lines.into_iter().try_fold(Cents::ZERO, |acc, (price, qty)| {
        price
            .checked_mul(qty)
            .and_then(|line| acc.checked_add(line))
            .ok_or(PricingError::Overflow)
    })
}
