//! Monetary amounts in minor currency units.
//!
//! All stored prices and order totals are whole numbers of the currency's
//! smallest unit (cents for KES/USD). There is no floating point anywhere in
//! the money path.

use core::fmt;

use serde::{Deserialize, Serialize};

/// An amount of money in minor currency units.
///
/// Serializes as a bare JSON integer (`3999`), matching the `price`,
/// `subtotal`, and `total` fields clients already consume.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Cents(i64);

impl Cents {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Create an amount from minor units.
    #[must_use]
    pub const fn new(minor_units: i64) -> Self {
        Self(minor_units)
    }

    /// The raw number of minor units.
    #[must_use]
    pub const fn minor_units(self) -> i64 {
        self.0
    }

    /// Checked addition. Returns `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked multiplication by a quantity. Returns `None` on overflow.
    #[must_use]
    pub fn checked_mul(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(i64::from(quantity)).map(Self)
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_mul() {
        assert_eq!(Cents::new(2000).checked_mul(2), Some(Cents::new(4000)));
        assert_eq!(Cents::new(i64::MAX).checked_mul(2), None);
    }

    #[test]
    fn test_checked_add_overflow() {
        assert_eq!(Cents::new(1).checked_add(Cents::new(2)), Some(Cents::new(3)));
        assert_eq!(Cents::new(i64::MAX).checked_add(Cents::new(1)), None);
    }

    #[test]
    fn test_display_is_minor_units() {
        assert_eq!(Cents::new(3999).to_string(), "3999");
        assert_eq!(Cents::new(-150).to_string(), "-150");
    }

    #[test]
    fn test_serializes_as_integer() {
        let json = serde_json::to_string(&Cents::new(640)).unwrap_or_default();
        assert_eq!(json, "640");
    }
}
