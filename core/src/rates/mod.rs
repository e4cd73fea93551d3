//! # Exchange Rates
//!
//! Currency conversion rides on a [`RateProvider`]: given a base currency,
//! it returns a [`RateSnapshot`] — the provider's latest table of rates
//! relative to that base, filtered to the supported currency set. Snapshots
//! are fetched fresh for every conversion and never cached; a stale rate
//! applied to money is worse than a failed call, so provider outages
//! surface as [`RateError::Unreachable`] instead of falling back to a
//! remembered or hardcoded figure.

pub mod http;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::money::{self, Currency};

pub use http::HttpRateProvider;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while quoting or converting.
#[derive(Debug, Error)]
pub enum RateError {
    /// The provider's table has no rate for the requested currency.
    #[error("no exchange rate available for {currency} (base {base})")]
    Unavailable {
        /// The base the table was quoted against.
        base: Currency,
        /// The currency missing from the table.
        currency: Currency,
    },

    /// The provider could not be reached or answered garbage.
    #[error("rate provider unreachable: {reason}")]
    Unreachable {
        /// What went wrong, for the caller's logs.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// RateSnapshot
// ---------------------------------------------------------------------------

/// One provider response: rates relative to `base` at `fetched_at`.
///
/// Ephemeral by design — used within a single conversion call and dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSnapshot {
    /// The currency the rates are quoted against.
    pub base: Currency,
    /// The provider's timestamp for this table.
    pub fetched_at: DateTime<Utc>,
    /// Rate per unit of `base`, per currency.
    pub rates: HashMap<Currency, Decimal>,
}

impl RateSnapshot {
    /// The base-to-`currency` rate, if quoted.
    ///
    /// The base converts to itself at 1 even when the provider omits it
    /// from the table.
    pub fn rate_for(&self, currency: Currency) -> Option<Decimal> {
        match self.rates.get(&currency) {
            Some(rate) => Some(*rate),
            None if currency == self.base => Some(Decimal::ONE),
            None => None,
        }
    }

    /// Converts `amount` of the base currency into `to`, rounded to the
    /// money scale.
    ///
    /// # Errors
    ///
    /// [`RateError::Unavailable`] when `to` is not in the table.
    pub fn convert(&self, amount: Decimal, to: Currency) -> Result<Decimal, RateError> {
        let rate = self.rate_for(to).ok_or(RateError::Unavailable {
            base: self.base,
            currency: to,
        })?;
        Ok(money::quantize(amount * rate))
    }
}

// ---------------------------------------------------------------------------
// RateProvider
// ---------------------------------------------------------------------------

/// Source of exchange-rate tables.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Fetches the latest table quoted against `base`.
    ///
    /// # Errors
    ///
    /// [`RateError::Unreachable`] when the provider cannot answer. This
    /// must propagate to the caller — implementations never substitute a
    /// default rate.
    async fn latest(&self, base: Currency) -> Result<RateSnapshot, RateError>;
}
