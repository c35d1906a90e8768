//! Currency codes and the per-operation exchange-rate snapshot.
//!
//! A [`RateSnapshot`] maps each currency code to "units of this currency per
//! reference unit", so converting A→B is `amount / rate[A] * rate[B]`. A
//! snapshot is fetched once per logical operation for the exact set of codes
//! involved and never persisted; reusing one snapshot avoids rate drift in the
//! middle of a multi-target mutation.

use std::collections::HashMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Uppercase ISO-like currency code (`"EUR"`, `"USD"`, `"BTC"`).
///
/// Codes are normalized (trimmed, uppercased) at construction, so comparisons
/// elsewhere in the engine are effectively case-insensitive.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: &str) -> Result<Self, EngineError> {
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return Err(EngineError::InvalidCurrency("empty currency code".to_string()));
        }
        if trimmed.len() > 8 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(EngineError::InvalidCurrency(format!(
                "unsupported currency code: {trimmed}"
            )));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Internal constructor for codes known to be valid.
    pub(crate) fn from_valid(code: &str) -> Self {
        Self(code.to_ascii_uppercase())
    }

    /// Canonical (uppercase) currency code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for CurrencyCode {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.0
    }
}

/// Point-in-time exchange rates, keyed by currency code.
///
/// Rates are "units per reference unit"; non-positive rates are discarded at
/// construction so conversion never divides by zero.
#[derive(Clone, Debug, Default)]
pub struct RateSnapshot {
    rates: HashMap<CurrencyCode, Decimal>,
}

impl RateSnapshot {
    #[must_use]
    pub fn new(rates: HashMap<CurrencyCode, Decimal>) -> Self {
        let rates = rates
            .into_iter()
            .filter(|(code, rate)| {
                let keep = *rate > Decimal::ZERO;
                if !keep {
                    tracing::warn!(code = %code, rate = %rate, "discarding non-positive exchange rate");
                }
                keep
            })
            .collect();
        Self { rates }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    #[must_use]
    pub fn rate(&self, code: &CurrencyCode) -> Option<Decimal> {
        self.rates.get(code).copied()
    }

    /// Converts `amount` from one currency to another.
    ///
    /// Identity when `from == to`; `None` when either code is missing from the
    /// snapshot, leaving the fallback policy to the caller. No rounding happens
    /// here, so repeated conversions do not compound rounding error.
    #[must_use]
    pub fn convert(
        &self,
        amount: Decimal,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Option<Decimal> {
        if from == to {
            return Some(amount);
        }
        let from_rate = self.rates.get(from)?;
        let to_rate = self.rates.get(to)?;
        amount.checked_div(*from_rate)?.checked_mul(*to_rate)
    }

    /// Converts like [`convert`](Self::convert), falling back to the raw amount
    /// when no rate is available. The engine's convention is to proceed with
    /// the unconverted amount rather than block a write.
    #[must_use]
    pub fn convert_or_raw(
        &self,
        amount: Decimal,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Decimal {
        match self.convert(amount, from, to) {
            Some(converted) => converted,
            None => {
                tracing::debug!(
                    from = %from,
                    to = %to,
                    "no exchange rate in snapshot; using unconverted amount"
                );
                amount
            }
        }
    }
}
