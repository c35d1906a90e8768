//! Exchange-rate providers.
//!
//! A [`RateProvider`] returns, for a requested set of currency codes, the
//! number of units of each currency per reference unit. The engine fetches one
//! snapshot per logical operation and degrades to an empty snapshot when the
//! provider fails; a missing rate never blocks a write.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::CurrencyCode;

pub mod frankfurter;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateError {
    #[error("rate source unavailable: {0}")]
    Unavailable(String),
    #[error("malformed rate payload: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Units of each requested currency per reference unit. Codes the provider
    /// does not know may be absent from the result.
    async fn rates(
        &self,
        codes: &HashSet<CurrencyCode>,
    ) -> Result<HashMap<CurrencyCode, Decimal>, RateError>;
}

/// Deterministic provider serving a fixed rate table.
#[derive(Clone, Debug, Default)]
pub struct FixedRates {
    rates: HashMap<CurrencyCode, Decimal>,
}

impl FixedRates {
    #[must_use]
    pub fn new(rates: impl IntoIterator<Item = (CurrencyCode, Decimal)>) -> Self {
        Self {
            rates: rates.into_iter().collect(),
        }
    }
}

#[async_trait]
impl RateProvider for FixedRates {
    async fn rates(
        &self,
        codes: &HashSet<CurrencyCode>,
    ) -> Result<HashMap<CurrencyCode, Decimal>, RateError> {
        Ok(self
            .rates
            .iter()
            .filter(|(code, _)| codes.contains(*code))
            .map(|(code, rate)| (code.clone(), *rate))
            .collect())
    }
}
