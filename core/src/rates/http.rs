//! # HTTP Rate Provider
//!
//! [`RateProvider`] implementation over the exchangerate-api.com v4 wire
//! shape: `GET {base_url}/{BASE}` returns
//! `{"base": "USD", "time_last_updated": 1710633601, "rates": {"EUR": 0.92, ...}}`.
//!
//! The `reqwest` client is built once with the configured timeout and
//! reused for every call — connection pooling comes with it. Codes outside
//! the supported currency set are dropped while parsing; the provider
//! quotes a hundred-odd currencies and the ledger cares about six.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::{RateError, RateProvider, RateSnapshot};
use crate::config;
use crate::money::Currency;

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// The provider's response body, as served.
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    base: String,
    /// Unix seconds of the provider's last table refresh.
    time_last_updated: i64,
    /// Rate per unit of base, keyed by ISO code. Unsupported codes are
    /// dropped during conversion to a snapshot.
    rates: HashMap<String, Decimal>,
}

impl QuoteResponse {
    fn into_snapshot(self, requested_base: Currency) -> RateSnapshot {
        if self.base != requested_base.code() {
            // Trust the request, log the disagreement.
            warn!(
                requested = %requested_base,
                reported = %self.base,
                "rate provider reported a different base than requested"
            );
        }

        let fetched_at = DateTime::<Utc>::from_timestamp(self.time_last_updated, 0)
            .unwrap_or_else(Utc::now);

        let rates = self
            .rates
            .into_iter()
            .filter_map(|(code, rate)| {
                let currency: Currency = code.parse().ok()?;
                Some((currency, rate))
            })
            .collect();

        RateSnapshot {
            base: requested_base,
            fetched_at,
            rates,
        }
    }
}

// ---------------------------------------------------------------------------
// HttpRateProvider
// ---------------------------------------------------------------------------

/// Long-lived HTTP client against a quote endpoint.
pub struct HttpRateProvider {
    client: Client,
    base_url: String,
}

impl HttpRateProvider {
    /// Creates a provider against the default endpoint with the default
    /// request timeout.
    ///
    /// # Errors
    ///
    /// [`RateError::Unreachable`] if the TLS/client stack fails to build.
    pub fn new() -> Result<Self, RateError> {
        Self::with_base_url(config::DEFAULT_RATE_PROVIDER_URL)
    }

    /// Creates a provider against a custom endpoint (staging, a paid tier,
    /// a local stub).
    pub fn with_base_url(base_url: &str) -> Result<Self, RateError> {
        let client = Client::builder()
            .timeout(config::RATE_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RateError::Unreachable {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn quote_url(&self, base: Currency) -> String {
        format!("{}/{}", self.base_url, base.code())
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    async fn latest(&self, base: Currency) -> Result<RateSnapshot, RateError> {
        let url = self.quote_url(base);
        debug!(%url, "fetching exchange rates");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RateError::Unreachable {
                reason: format!("request to {url} failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateError::Unreachable {
                reason: format!("provider answered HTTP {status}"),
            });
        }

        let body: QuoteResponse =
            response.json().await.map_err(|e| RateError::Unreachable {
                reason: format!("malformed provider response: {e}"),
            })?;

        let snapshot = body.into_snapshot(base);
        debug!(
            base = %snapshot.base,
            quoted = snapshot.rates.len(),
            fetched_at = %snapshot.fetched_at,
            "exchange rates fetched"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"{
        "base": "USD",
        "date": "2026-03-17",
        "time_last_updated": 1710633601,
        "rates": {
            "USD": 1,
            "EUR": 0.92,
            "JPY": 149.5,
            "AED": 3.6725,
            "SGD": 1.34,
            "CHF": 0.885,
            "GBP": 0.79,
            "BRL": 4.97
        }
    }"#;

    #[test]
    fn parses_wire_shape_and_filters_unsupported_codes() {
        let body: QuoteResponse = serde_json::from_str(SAMPLE).unwrap();
        let snap = body.into_snapshot(Currency::USD);

        assert_eq!(snap.base, Currency::USD);
        // GBP and BRL dropped, the six supported codes kept.
        assert_eq!(snap.rates.len(), 6);
        assert_eq!(snap.rates[&Currency::EUR], dec!(0.92));
        assert_eq!(snap.rates[&Currency::AED], dec!(3.6725));
    }

    #[test]
    fn provider_timestamp_is_decoded() {
        let body: QuoteResponse = serde_json::from_str(SAMPLE).unwrap();
        let snap = body.into_snapshot(Currency::USD);
        assert_eq!(snap.fetched_at.timestamp(), 1710633601);
    }

    #[test]
    fn quote_url_appends_base_code() {
        let provider = HttpRateProvider::with_base_url("https://rates.example/v4/latest/").unwrap();
        assert_eq!(
            provider.quote_url(Currency::EUR),
            "https://rates.example/v4/latest/EUR"
        );
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        // The provider adds fields over time; parsing must not break.
        let body: Result<QuoteResponse, _> = serde_json::from_str(
            r#"{"base":"EUR","time_last_updated":1,"rates":{"USD":1.09},"provider":"x"}"#,
        );
        assert!(body.is_ok());
    }
}
