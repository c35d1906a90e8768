//! Rate provider backed by the Frankfurter API (ECB reference rates).

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::CurrencyCode;

use super::{RateError, RateProvider};

const DEFAULT_BASE_URL: &str = "https://api.frankfurter.dev";
const DEFAULT_REFERENCE: &str = "EUR";

/// Fetches latest rates from Frankfurter, expressed as units per reference
/// unit (the reference currency itself always maps to 1).
#[derive(Clone, Debug)]
pub struct FrankfurterRates {
    client: reqwest::Client,
    base_url: String,
    reference: CurrencyCode,
}

impl FrankfurterRates {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Points the provider at a different server (used by tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            reference: CurrencyCode::from_valid(DEFAULT_REFERENCE),
        }
    }

    /// Overrides the reference currency rates are quoted against.
    #[must_use]
    pub fn reference(mut self, reference: CurrencyCode) -> Self {
        self.reference = reference;
        self
    }
}

impl Default for FrankfurterRates {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct Payload {
    rates: HashMap<String, Decimal>,
}

#[async_trait]
impl RateProvider for FrankfurterRates {
    async fn rates(
        &self,
        codes: &HashSet<CurrencyCode>,
    ) -> Result<HashMap<CurrencyCode, Decimal>, RateError> {
        let mut result = HashMap::new();
        result.insert(self.reference.clone(), Decimal::ONE);

        let symbols: Vec<&str> = codes
            .iter()
            .filter(|code| **code != self.reference)
            .map(CurrencyCode::code)
            .collect();
        if symbols.is_empty() {
            return Ok(result);
        }

        let url = format!(
            "{}/v1/latest?base={}&symbols={}",
            self.base_url,
            self.reference.code(),
            symbols.join(",")
        );
        let payload: Payload = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| RateError::Unavailable(err.to_string()))?
            .error_for_status()
            .map_err(|err| RateError::Unavailable(err.to_string()))?
            .json()
            .await
            .map_err(|err| RateError::Malformed(err.to_string()))?;

        for (code, rate) in payload.rates {
            let code = CurrencyCode::new(&code)
                .map_err(|_| RateError::Malformed(format!("invalid code in payload: {code}")))?;
            result.insert(code, rate);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn codes(list: &[&str]) -> HashSet<CurrencyCode> {
        list.iter()
            .map(|code| CurrencyCode::new(code).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn fetches_rates_against_reference() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/latest"))
            .and(query_param("base", "EUR"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "amount": 1.0,
                "base": "EUR",
                "date": "2024-01-15",
                "rates": { "USD": 1.08 }
            })))
            .mount(&server)
            .await;

        let provider = FrankfurterRates::with_base_url(server.uri());
        let rates = provider.rates(&codes(&["USD", "EUR"])).await.unwrap();

        assert_eq!(
            rates.get(&CurrencyCode::new("USD").unwrap()),
            Some(&Decimal::new(108, 2))
        );
        assert_eq!(
            rates.get(&CurrencyCode::new("EUR").unwrap()),
            Some(&Decimal::ONE)
        );
    }

    #[tokio::test]
    async fn reference_only_requests_skip_http() {
        // No mock mounted: a request would fail.
        let provider = FrankfurterRates::with_base_url("http://127.0.0.1:9");
        let rates = provider.rates(&codes(&["EUR"])).await.unwrap();
        assert_eq!(rates.len(), 1);
    }

    #[tokio::test]
    async fn http_failure_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/latest"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = FrankfurterRates::with_base_url(server.uri());
        let err = provider.rates(&codes(&["USD"])).await.unwrap_err();
        assert!(matches!(err, RateError::Unavailable(_)));
    }
}
