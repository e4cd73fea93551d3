//! # Currency Set & Amount Rules
//!
//! The closed set of fiat currencies the wallet supports, plus the one
//! arithmetic rule everything else depends on: amounts are
//! [`rust_decimal::Decimal`] values quantized to two decimal places with
//! midpoint-away-from-zero rounding. Binary floating point never touches
//! money in this crate.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::MONEY_SCALE;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A currency code outside the supported set.
///
/// Produced at the string boundary ([`Currency::from_str`]); typed callers
/// can't construct an unsupported currency at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported currency: {0}")]
pub struct UnsupportedCurrency(pub String);

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

/// Fiat currencies the wallet natively supports.
///
/// This is a closed enum on purpose. Adding a currency is a product
/// decision with compliance consequences, not a config tweak, so it takes
/// a code change and shows up in review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// United States Dollar.
    USD,
    /// Euro.
    EUR,
    /// Japanese Yen.
    JPY,
    /// United Arab Emirates Dirham.
    AED,
    /// Singapore Dollar.
    SGD,
    /// Swiss Franc.
    CHF,
}

impl Currency {
    /// Every supported currency, in a stable order.
    pub const ALL: [Currency; 6] = [
        Currency::USD,
        Currency::EUR,
        Currency::JPY,
        Currency::AED,
        Currency::SGD,
        Currency::CHF,
    ];

    /// The ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::JPY => "JPY",
            Currency::AED => "AED",
            Currency::SGD => "SGD",
            Currency::CHF => "CHF",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = UnsupportedCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "JPY" => Ok(Currency::JPY),
            "AED" => Ok(Currency::AED),
            "SGD" => Ok(Currency::SGD),
            "CHF" => Ok(Currency::CHF),
            other => Err(UnsupportedCurrency(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Amount quantization
// ---------------------------------------------------------------------------

/// Rounds an amount to the ledger's money scale.
///
/// Midpoint-away-from-zero is the convention cashiers expect: `2.005`
/// becomes `2.01`, `-2.005` becomes `-2.01`. Applied to every amount that
/// enters the ledger and to every conversion result, so stored balances
/// always carry at most [`MONEY_SCALE`] decimal places.
pub fn quantize(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn code_roundtrip_for_all_currencies() {
        for c in Currency::ALL {
            let parsed: Currency = c.code().parse().unwrap();
            assert_eq!(parsed, c);
        }
    }

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(" usd ".parse::<Currency>().unwrap(), Currency::USD);
        assert_eq!("chf".parse::<Currency>().unwrap(), Currency::CHF);
    }

    #[test]
    fn unsupported_code_rejected() {
        let err = "GBP".parse::<Currency>().unwrap_err();
        assert_eq!(err, UnsupportedCurrency("GBP".to_string()));
    }

    #[test]
    fn display_matches_code() {
        assert_eq!(Currency::JPY.to_string(), "JPY");
        assert_eq!(Currency::AED.to_string(), "AED");
    }

    #[test]
    fn quantize_rounds_midpoint_away_from_zero() {
        assert_eq!(quantize(dec!(2.005)), dec!(2.01));
        assert_eq!(quantize(dec!(2.004)), dec!(2.00));
        assert_eq!(quantize(dec!(-2.005)), dec!(-2.01));
    }

    #[test]
    fn quantize_leaves_two_place_amounts_unchanged() {
        assert_eq!(quantize(dec!(100.00)), dec!(100.00));
        assert_eq!(quantize(dec!(0.01)), dec!(0.01));
    }

    #[test]
    fn decimal_addition_is_exact() {
        // The reason this crate exists: 0.1 + 0.2 is exactly 0.3 here.
        assert_eq!(quantize(dec!(0.1) + dec!(0.2)), dec!(0.3));
    }

    #[test]
    fn currency_serde_roundtrip() {
        for c in Currency::ALL {
            let json = serde_json::to_string(&c).unwrap();
            let recovered: Currency = serde_json::from_str(&json).unwrap();
            assert_eq!(c, recovered);
        }
    }
}
