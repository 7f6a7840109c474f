//! Human-readable order numbers.

use core::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Characters used for the random suffix.
const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of the random suffix.
const SUFFIX_LEN: usize = 4;

/// A customer-facing order number such as `ORD-20250314-093015-K7QZ`.
///
/// The timestamp alone collides for orders placed in the same second, so a
/// random suffix is appended. The database still enforces uniqueness; callers
/// generate a fresh number and retry when an insert conflicts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generate a number for the current instant.
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_at(Utc::now(), &mut rand::rng())
    }

    /// Generate a number for a given instant using the supplied RNG.
    #[must_use]
    pub fn generate_at<R: Rng + ?Sized>(at: DateTime<Utc>, rng: &mut R) -> Self {
        let suffix: String = (0..SUFFIX_LEN)
            .filter_map(|_| {
                SUFFIX_CHARSET
                    .get(rng.random_range(0..SUFFIX_CHARSET.len()))
                    .map(|&b| char::from(b))
            })
            .collect();

        Self(format!("ORD-{}-{suffix}", at.format("%Y%m%d-%H%M%S")))
    }

    /// Wrap a value read back from storage.
    #[must_use]
    pub const fn from_stored(value: String) -> Self {
        Self(value)
    }

    /// The order number as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_format() {
        let at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 15).unwrap();
        let number = OrderNumber::generate_at(at, &mut StdRng::seed_from_u64(7));
        let text = number.as_str();

        assert!(text.starts_with("ORD-20250314-093015-"));
        let suffix = text.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(
            suffix
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        );
    }

    #[test]
    fn test_same_second_numbers_differ() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let numbers: std::collections::HashSet<_> = (0..50)
            .map(|_| OrderNumber::generate_at(at, &mut rng))
            .collect();
        // 36^4 possible suffixes; 50 draws colliding is vanishingly unlikely
        assert!(numbers.len() > 45);
    }
}
