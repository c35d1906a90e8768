//! Monetary helpers shared by the balance and scheduling paths.
//!
//! All amounts are [`rust_decimal::Decimal`]. Conversion keeps full precision;
//! only the *final* monetary result of an operation is rounded, to two decimal
//! places.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde_json::{Map, Value};

/// Metadata key carrying a share/unit count for share-based assets.
pub const SHARES_KEY: &str = "shares";

/// Rounds a final monetary result to 2 decimal places.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

/// Extracts a share count from opaque flow metadata.
///
/// Accepts a JSON number or a numeric string; anything else is treated as
/// absent.
#[must_use]
pub fn shares_from_metadata(metadata: &Map<String, Value>) -> Option<Decimal> {
    match metadata.get(SHARES_KEY)? {
        Value::Number(number) => {
            if let Some(value) = number.as_i64() {
                Some(Decimal::from(value))
            } else {
                number.as_f64().and_then(Decimal::from_f64)
            }
        }
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_cents() {
        assert_eq!(round_money(Decimal::new(12_345, 3)), Decimal::new(1235, 2));
        assert_eq!(round_money(Decimal::new(-12_345, 3)), Decimal::new(-1235, 2));
    }

    #[test]
    fn shares_accepts_numbers_and_strings() {
        let mut metadata = Map::new();
        metadata.insert(SHARES_KEY.to_string(), Value::from(10));
        assert_eq!(shares_from_metadata(&metadata), Some(Decimal::from(10)));

        metadata.insert(SHARES_KEY.to_string(), Value::from("2.5"));
        assert_eq!(shares_from_metadata(&metadata), Some(Decimal::new(25, 1)));

        metadata.insert(SHARES_KEY.to_string(), Value::Bool(true));
        assert_eq!(shares_from_metadata(&metadata), None);

        metadata.remove(SHARES_KEY);
        assert_eq!(shares_from_metadata(&metadata), None);
    }
}
