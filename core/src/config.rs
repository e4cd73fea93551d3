//! # Service Configuration & Constants
//!
//! Every default and magic number the wallet core relies on lives here.
//! If you're hardcoding a limit somewhere else, you're doing it wrong and
//! you owe the team coffee.

use rust_decimal::Decimal;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Money
// ---------------------------------------------------------------------------

/// Decimal places carried by every balance and transaction amount.
///
/// Two everywhere, including JPY. The upstream accounts ledger settles in
/// hundredths regardless of a currency's street convention, and mixing
/// scales per currency buys nothing but reconciliation bugs.
pub const MONEY_SCALE: u32 = 2;

// ---------------------------------------------------------------------------
// Spend Limits
// ---------------------------------------------------------------------------

/// Default daily spend limit, in whole units of the wallet's currency.
pub const DEFAULT_DAILY_LIMIT_UNITS: u64 = 10_000;

/// Default monthly spend limit, in whole units of the wallet's currency.
pub const DEFAULT_MONTHLY_LIMIT_UNITS: u64 = 50_000;

/// Default daily limit as a money amount.
pub fn default_daily_limit() -> Decimal {
    Decimal::from(DEFAULT_DAILY_LIMIT_UNITS)
}

/// Default monthly limit as a money amount.
pub fn default_monthly_limit() -> Decimal {
    Decimal::from(DEFAULT_MONTHLY_LIMIT_UNITS)
}

// ---------------------------------------------------------------------------
// Rate Provider
// ---------------------------------------------------------------------------

/// Default quote endpoint. The base currency code is appended as the final
/// path segment, e.g. `{url}/USD`.
pub const DEFAULT_RATE_PROVIDER_URL: &str = "https://api.exchangerate-api.com/v4/latest";

/// Hard timeout on a single quote request. If the provider can't answer in
/// this window, the conversion fails — we never guess a rate.
pub const RATE_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
